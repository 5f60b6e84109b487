use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use auditmsg::cli::{Cli, Command};
use auditmsg::config::Config;
use auditmsg::{AuditLogger, LoadOutcome, Params, Registry, SourceDiscovery, placeholders};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to install subscriber: {}", e))?;

    debug!(?level, "Logging initialized");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The config may carry the log level, so read it before logging exists
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    if let Some(root) = cli.root {
        config.sources.root = root;
    }
    info!(root = %config.sources.root.display(), "auditmsg starting");

    let mut discovery = SourceDiscovery::new(&config.sources);
    let registry = Registry::new();
    let report = registry.load_all(discovery.discover());

    match cli.command {
        Command::Sources => {
            for load in &report.loads {
                let status = match &load.outcome {
                    LoadOutcome::Applied(_) => "✓".green(),
                    LoadOutcome::Missing => "-".dimmed(),
                    LoadOutcome::Rejected(_) => "✗".red(),
                };
                println!("{} {} {}", status, load.source, load.outcome.to_string().dimmed());
            }
        }
        Command::Check => {
            let merged = report.merged();
            for load in report.rejected() {
                println!("{} {}: {}", "✗".red(), load.source, load.outcome);
            }
            for collision in &merged.collisions {
                println!("{} {} ({})", "!".yellow(), collision.path.yellow(), collision.kind);
            }
            for path in &merged.overwritten {
                println!("{} {} overridden", "~".cyan(), path);
            }

            let tree = registry.snapshot();
            let leaves = tree.leaves();
            let placeholder_count: usize = leaves
                .iter()
                .map(|(_, template)| placeholders(template.as_str()).len())
                .sum();
            println!(
                "{} messages, {} placeholders from {} of {} sources",
                leaves.len(),
                placeholder_count,
                report.applied_count(),
                report.loads.len()
            );

            if report.has_rejections() {
                return Err(eyre!("{} source(s) rejected", report.rejected().count()));
            }
            println!("{} Messages OK", "✓".green());
        }
        Command::Lookup { path, key } => {
            let template = registry
                .lookup(&path, &key)
                .ok_or_else(|| eyre!("No message for {} {}", path, key))?;
            println!("{}", template);
        }
        Command::Render {
            path,
            key,
            params,
            tags,
        } => {
            let logger = AuditLogger::new(registry, config.audit.clone());
            let params: Params = params.into_iter().collect();
            let message = logger
                .message(&path, &key, &params)
                .ok_or_else(|| eyre!("No message for {} {}", path, key))?;
            println!("{}", logger.format_line(&message, &tags));
        }
        Command::Tree => {
            let tree = registry.snapshot();
            print!("{}", serde_yaml::to_string(&*tree)?);
        }
    }

    Ok(())
}
