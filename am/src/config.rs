//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main auditmsg configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Where message sources are discovered
    pub sources: SourcesConfig,

    /// Audit line formatting
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// An explicit path must load. Otherwise `.auditmsg.yml` in the working
    /// directory, then `<config_dir>/auditmsg/auditmsg.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".auditmsg.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("auditmsg").join("auditmsg.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Source discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Application root
    pub root: PathBuf,

    /// Directory under each root holding the messages file
    #[serde(rename = "config-dir")]
    pub config_dir: PathBuf,

    /// Messages file name
    #[serde(rename = "file-name")]
    pub file_name: String,

    /// Globs (relative to root) matching plugin/engine directories
    #[serde(rename = "plugin-globs")]
    pub plugin_globs: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            config_dir: PathBuf::from("config"),
            file_name: "audit_messages.yml".to_string(),
            plugin_globs: vec!["plugins/*".to_string(), "engines/*".to_string()],
        }
    }
}

/// Audit line formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Leading tag on every line; empty disables it
    pub tag: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tag: "AUDIT".to_string(),
        }
    }
}
