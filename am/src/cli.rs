//! CLI argument parsing for am

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "am")]
#[command(author, version, about = "Audit message template registry", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Application root (overrides sources.root from config)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List discovered message sources and how each one loads
    Sources,

    /// Load every source and report rejections and collisions
    Check,

    /// Print the raw template for a path and key
    Lookup {
        /// Namespace path, e.g. admin/users
        #[arg(required = true)]
        path: String,

        /// Event key, e.g. create
        #[arg(required = true)]
        key: String,
    },

    /// Render the message for a path and key
    Render {
        /// Namespace path, e.g. admin/users
        #[arg(required = true)]
        path: String,

        /// Event key, e.g. create
        #[arg(required = true)]
        key: String,

        /// Parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Extra tag to prefix (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Print the merged template tree as YAML
    Tree,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("Invalid parameter '{}'. Use name=value", s)),
    }
}
