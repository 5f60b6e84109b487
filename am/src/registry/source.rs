//! Template sources and load outcomes

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use super::tree::{MergeReport, TemplateTree};
use crate::error::SourceError;

/// A configuration source that can be merged into the registry
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A file on disk. `.json` files are parsed as JSON, everything else as YAML.
    /// A missing file loads as [`LoadOutcome::Missing`].
    File(PathBuf),
    /// In-memory YAML text
    Yaml { name: String, content: String },
    /// In-memory JSON text
    Json { name: String, content: String },
    /// An already-built tree
    Tree { name: String, tree: TemplateTree },
}

impl TemplateSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn yaml(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Yaml {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn json(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Json {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn tree(name: impl Into<String>, tree: TemplateTree) -> Self {
        Self::Tree { name: name.into(), tree }
    }

    /// Human-readable name used in logs and reports
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Yaml { name, .. } | Self::Json { name, .. } | Self::Tree { name, .. } => name.clone(),
        }
    }

    /// Parse the source into a tree fragment
    ///
    /// Returns `Ok(None)` when a file source does not exist.
    pub fn parse(self) -> Result<Option<TemplateTree>, SourceError> {
        debug!(source = %self.name(), "TemplateSource::parse: called");
        match self {
            Self::File(path) => parse_file(&path),
            Self::Yaml { name, content } => parse_yaml(&name, &content).map(Some),
            Self::Json { name, content } => parse_json(&name, &content).map(Some),
            Self::Tree { tree, .. } => Ok(Some(tree)),
        }
    }
}

fn parse_file(path: &Path) -> Result<Option<TemplateTree>, SourceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "parse_file: source file does not exist");
            return Ok(None);
        }
        Err(source) => {
            return Err(SourceError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let name = path.display().to_string();
    let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
    debug!(?path, is_json, content_len = content.len(), "parse_file: read content");
    if is_json {
        parse_json(&name, &content).map(Some)
    } else {
        parse_yaml(&name, &content).map(Some)
    }
}

fn parse_yaml(name: &str, content: &str) -> Result<TemplateTree, SourceError> {
    let mut value: Value = serde_yaml::from_str(content).map_err(|source| SourceError::Yaml {
        name: name.to_string(),
        source,
    })?;
    // `<<: *anchor` is kept as a literal key unless expanded
    value.apply_merge().map_err(|source| SourceError::Merge {
        name: name.to_string(),
        source,
    })?;
    TemplateTree::from_value(name, value)
}

fn parse_json(name: &str, content: &str) -> Result<TemplateTree, SourceError> {
    let value: Value = serde_json::from_str(content).map_err(|source| SourceError::Json {
        name: name.to_string(),
        source,
    })?;
    TemplateTree::from_value(name, value)
}

/// Result of loading a single source
#[derive(Debug)]
pub enum LoadOutcome {
    /// The source was merged
    Applied(MergeReport),
    /// The source file does not exist; nothing changed
    Missing,
    /// The source was malformed or unreadable; nothing changed
    Rejected(SourceError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(report) => write!(f, "applied ({} new)", report.added),
            Self::Missing => write!(f, "missing"),
            Self::Rejected(e) => write!(f, "rejected: {}", e),
        }
    }
}

/// A source name paired with what happened when it was loaded
#[derive(Debug)]
pub struct SourceLoad {
    pub source: String,
    pub outcome: LoadOutcome,
}

/// Outcomes of a batch load, in source order
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loads: Vec<SourceLoad>,
}

impl LoadReport {
    pub fn applied_count(&self) -> usize {
        self.loads.iter().filter(|l| l.outcome.is_applied()).count()
    }

    pub fn rejected(&self) -> impl Iterator<Item = &SourceLoad> {
        self.loads.iter().filter(|l| l.outcome.is_rejected())
    }

    pub fn has_rejections(&self) -> bool {
        self.rejected().next().is_some()
    }

    /// Combined merge report over every applied source
    pub fn merged(&self) -> MergeReport {
        let mut total = MergeReport::default();
        for load in &self.loads {
            if let LoadOutcome::Applied(report) = &load.outcome {
                total.absorb(report.clone());
            }
        }
        total
    }
}
