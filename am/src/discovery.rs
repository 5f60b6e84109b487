//! Message source discovery
//!
//! Finds the candidate message files for an application:
//! 1. `<root>/<config-dir>/<file-name>` (the application itself)
//! 2. `<plugin>/<config-dir>/<file-name>` for every directory matched by the
//!    plugin globs, sorted by path
//!
//! Later files win collisions when loaded in this order. Candidates are
//! listed whether or not they exist; absent ones load as `Missing`.
//!
//! ## Hot-Reload
//!
//! Discovery remembers the modification time of every candidate it handed
//! out. `has_changes()` reports when one was modified, created or removed, or
//! when a new plugin directory appeared. Polling is the caller's job.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::config::SourcesConfig;
use crate::registry::{LoadReport, Registry, TemplateSource};

/// Tracked candidate for hot-reload detection
#[derive(Debug, Clone, PartialEq)]
struct TrackedFile {
    path: PathBuf,
    /// `None` when the file did not exist
    modified: Option<SystemTime>,
}

impl TrackedFile {
    fn capture(path: PathBuf) -> Self {
        let modified = modified_time(&path);
        Self { path, modified }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Enumerates message sources for an application and its plugins
#[derive(Debug, Clone)]
pub struct SourceDiscovery {
    config: SourcesConfig,
    tracked: Vec<TrackedFile>,
}

impl SourceDiscovery {
    pub fn new(config: &SourcesConfig) -> Self {
        debug!(?config, "SourceDiscovery::new: called");
        Self {
            config: config.clone(),
            tracked: Vec::new(),
        }
    }

    fn messages_file(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.config_dir).join(&self.config.file_name)
    }

    /// Candidate files in load order
    pub fn candidates(&self) -> Vec<PathBuf> {
        debug!(root = ?self.config.root, "SourceDiscovery::candidates: called");
        let mut files = vec![self.messages_file(&self.config.root)];

        let mut plugin_dirs = Vec::new();
        for pattern in &self.config.plugin_globs {
            let full = self.config.root.join(pattern);
            let full = full.to_string_lossy();
            match glob::glob(&full) {
                Ok(paths) => {
                    for entry in paths.filter_map(|e| e.ok()) {
                        if entry.is_dir() {
                            debug!(dir = ?entry, "candidates: found plugin directory");
                            plugin_dirs.push(entry);
                        }
                    }
                }
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "Invalid plugin glob, skipping");
                }
            }
        }
        plugin_dirs.sort();
        plugin_dirs.dedup();

        files.extend(plugin_dirs.iter().map(|dir| self.messages_file(dir)));
        debug!(count = files.len(), "SourceDiscovery::candidates: complete");
        files
    }

    /// Candidate sources in load order; also starts tracking them for reload
    pub fn discover(&mut self) -> Vec<TemplateSource> {
        let candidates = self.candidates();
        self.tracked = candidates.iter().cloned().map(TrackedFile::capture).collect();
        let present = self.tracked.iter().filter(|t| t.modified.is_some()).count();
        info!(candidates = candidates.len(), present, "Discovered message sources");
        candidates.into_iter().map(TemplateSource::File).collect()
    }

    /// Whether any tracked candidate changed since the last `discover()`
    pub fn has_changes(&self) -> bool {
        debug!(tracked_count = self.tracked.len(), "SourceDiscovery::has_changes: called");
        for tracked in &self.tracked {
            if modified_time(&tracked.path) != tracked.modified {
                debug!(path = ?tracked.path, "has_changes: file changed");
                return true;
            }
        }

        let candidates = self.candidates();
        if candidates.len() != self.tracked.len() || candidates.iter().zip(&self.tracked).any(|(c, t)| *c != t.path) {
            debug!("has_changes: candidate set changed");
            return true;
        }

        debug!("has_changes: no changes detected");
        false
    }

    /// Rebuild `registry` from a fresh discovery if anything changed
    pub fn reload_if_changed(&mut self, registry: &Registry) -> Option<LoadReport> {
        debug!("SourceDiscovery::reload_if_changed: called");
        if !self.has_changes() {
            return None;
        }
        info!("Hot-reloading message sources");
        let sources = self.discover();
        Some(registry.reload(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Template;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_messages(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("audit_messages.yml");
        fs::write(&path, content).unwrap();
        path
    }

    fn config_for(root: &Path) -> SourcesConfig {
        SourcesConfig {
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    fn bump_mtime(path: &Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();
    }

    #[test]
    fn test_candidates_app_first_then_sorted_plugins() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("plugins/zeta")).unwrap();
        fs::create_dir_all(root.join("plugins/alpha")).unwrap();
        fs::create_dir_all(root.join("engines/billing")).unwrap();
        fs::write(root.join("plugins/README"), "not a dir").unwrap();

        let discovery = SourceDiscovery::new(&config_for(root));
        let candidates = discovery.candidates();

        assert_eq!(
            candidates,
            vec![
                root.join("config/audit_messages.yml"),
                root.join("engines/billing/config/audit_messages.yml"),
                root.join("plugins/alpha/config/audit_messages.yml"),
                root.join("plugins/zeta/config/audit_messages.yml"),
            ]
        );
    }

    #[test]
    fn test_discover_and_load_plugin_overrides() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_messages(root, "posts:\n  create: app\n  update: app\n");
        write_messages(&root.join("plugins/blog"), "posts:\n  create: plugin\n");
        fs::create_dir_all(root.join("plugins/empty")).unwrap();

        let mut discovery = SourceDiscovery::new(&config_for(root));
        let registry = Registry::new();
        let report = registry.load_all(discovery.discover());

        assert_eq!(report.loads.len(), 3);
        assert_eq!(report.applied_count(), 2);
        assert_eq!(registry.lookup("posts", "create"), Some(Template::from("plugin")));
        assert_eq!(registry.lookup("posts", "update"), Some(Template::from("app")));
    }

    #[test]
    fn test_invalid_glob_is_skipped() {
        let temp = TempDir::new().unwrap();
        let config = SourcesConfig {
            root: temp.path().to_path_buf(),
            plugin_globs: vec!["plugins/[".to_string()],
            ..Default::default()
        };
        let discovery = SourceDiscovery::new(&config);
        assert_eq!(discovery.candidates().len(), 1);
    }

    #[test]
    fn test_has_changes_detects_modification() {
        let temp = TempDir::new().unwrap();
        let path = write_messages(temp.path(), "a: {x: '1'}\n");

        let mut discovery = SourceDiscovery::new(&config_for(temp.path()));
        discovery.discover();
        assert!(!discovery.has_changes());

        bump_mtime(&path);
        assert!(discovery.has_changes());
    }

    #[test]
    fn test_has_changes_detects_new_file_and_plugin() {
        let temp = TempDir::new().unwrap();
        let mut discovery = SourceDiscovery::new(&config_for(temp.path()));
        discovery.discover();
        assert!(!discovery.has_changes());

        // App file appears
        write_messages(temp.path(), "a: {x: '1'}\n");
        assert!(discovery.has_changes());
        discovery.discover();
        assert!(!discovery.has_changes());

        // New plugin directory appears
        fs::create_dir_all(temp.path().join("engines/audit")).unwrap();
        assert!(discovery.has_changes());
    }

    #[test]
    fn test_reload_if_changed() {
        let temp = TempDir::new().unwrap();
        let path = write_messages(temp.path(), "a: {x: old}\n");

        let mut discovery = SourceDiscovery::new(&config_for(temp.path()));
        let registry = Registry::new();
        registry.load_all(discovery.discover());
        assert!(discovery.reload_if_changed(&registry).is_none());

        fs::write(&path, "a: {x: new}\n").unwrap();
        bump_mtime(&path);
        let report = discovery.reload_if_changed(&registry).unwrap();

        assert_eq!(report.applied_count(), 1);
        assert_eq!(registry.lookup("a", "x"), Some(Template::from("new")));
        assert!(!discovery.has_changes());
    }
}
