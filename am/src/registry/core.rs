//! Shared template registry
//!
//! Readers take an `Arc` snapshot of the current tree and never block on
//! writers for longer than a pointer copy. Writers are serialized, build the
//! next tree off to the side, then swap it in. A lookup therefore sees either
//! the tree before a load or the tree after it, never a half-merged one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::source::{LoadOutcome, LoadReport, SourceLoad, TemplateSource};
use super::tree::{Template, TemplateTree, split_path};
use crate::error::{RegistryError, SourceError};

#[derive(Debug, Default)]
struct Inner {
    /// Tree visible to readers
    current: RwLock<Arc<TemplateTree>>,
    /// Serializes writers so concurrent loads do not drop each other's changes
    writer: Mutex<()>,
}

/// Handle to a template registry
///
/// Cloning is cheap and every clone refers to the same tree. The host
/// application constructs one registry and hands clones to whatever needs
/// lookups.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        debug!("Registry::new: called");
        Self::default()
    }

    /// Create a registry populated from `sources`, in order
    pub fn from_sources(sources: impl IntoIterator<Item = TemplateSource>) -> (Self, LoadReport) {
        let registry = Self::new();
        let report = registry.load_all(sources);
        (registry, report)
    }

    /// Current tree. The snapshot is immutable and unaffected by later writes.
    pub fn snapshot(&self) -> Arc<TemplateTree> {
        self.inner.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.inner.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, tree: TemplateTree) {
        let next = Arc::new(tree);
        *self.inner.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Parse `source` and deep-merge it into the live tree
    ///
    /// A missing file or a malformed source leaves the tree untouched; the
    /// outcome says which. This never returns an error.
    pub fn load(&self, source: TemplateSource) -> LoadOutcome {
        let name = source.name();
        debug!(%name, "Registry::load: called");
        let parsed = source.parse();

        let _guard = self.lock_writer();
        let mut next = (*self.snapshot()).clone();
        let outcome = apply(&mut next, &name, parsed);
        if outcome.is_applied() {
            self.publish(next);
        }
        outcome
    }

    /// Load `sources` in order; later sources win on collisions
    ///
    /// Every accepted source of the batch becomes visible at once.
    pub fn load_all(&self, sources: impl IntoIterator<Item = TemplateSource>) -> LoadReport {
        debug!("Registry::load_all: called");
        let parsed = parse_all(sources);

        let _guard = self.lock_writer();
        let mut next = (*self.snapshot()).clone();
        let report = apply_all(&mut next, parsed);
        if report.applied_count() > 0 {
            self.publish(next);
        }
        info!(
            sources = report.loads.len(),
            applied = report.applied_count(),
            leaves = self.leaf_count(),
            "Loaded message sources"
        );
        report
    }

    /// Replace the whole tree with one built from `sources`
    ///
    /// Same result as [`clear`](Self::clear) followed by
    /// [`load_all`](Self::load_all), without readers ever seeing the empty
    /// tree in between.
    pub fn reload(&self, sources: impl IntoIterator<Item = TemplateSource>) -> LoadReport {
        debug!("Registry::reload: called");
        let parsed = parse_all(sources);

        let _guard = self.lock_writer();
        let mut next = TemplateTree::new();
        let report = apply_all(&mut next, parsed);
        self.publish(next);
        info!(
            sources = report.loads.len(),
            applied = report.applied_count(),
            leaves = self.leaf_count(),
            "Reloaded message sources"
        );
        report
    }

    /// Look up the template at `path` + `key`
    ///
    /// `path` is split on `/`. Returns `None` for any miss.
    pub fn lookup(&self, path: &str, key: &str) -> Option<Template> {
        debug!(%path, %key, "Registry::lookup: called");
        let tree = self.snapshot();
        let result = tree.resolve(split_path(path), key).cloned();
        debug!(%path, %key, found = result.is_some(), "Registry::lookup: returning");
        result
    }

    /// Insert or overwrite a single message, creating intermediate levels
    ///
    /// A leaf standing where an intermediate level is needed is replaced.
    pub fn add_message(&self, path: &str, key: &str, template: impl Into<Template>) -> Result<(), RegistryError> {
        debug!(%path, %key, "Registry::add_message: called");
        if key.is_empty() {
            return Err(RegistryError::EmptyKey { path: path.to_string() });
        }
        let fragment = TemplateTree::from_path(split_path(path), key, template.into());

        let _guard = self.lock_writer();
        let mut next = (*self.snapshot()).clone();
        let report = next.merge(fragment);
        for collision in &report.collisions {
            debug!(path = %collision.path, kind = %collision.kind, "Registry::add_message: replaced node");
        }
        self.publish(next);
        Ok(())
    }

    /// Drop every message
    pub fn clear(&self) {
        debug!("Registry::clear: called");
        let _guard = self.lock_writer();
        self.publish(TemplateTree::new());
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Number of templates currently registered
    pub fn leaf_count(&self) -> usize {
        self.snapshot().leaf_count()
    }
}

type Parsed = (String, Result<Option<TemplateTree>, SourceError>);

fn parse_all(sources: impl IntoIterator<Item = TemplateSource>) -> Vec<Parsed> {
    sources
        .into_iter()
        .map(|source| {
            let name = source.name();
            (name, source.parse())
        })
        .collect()
}

fn apply_all(tree: &mut TemplateTree, parsed: Vec<Parsed>) -> LoadReport {
    let mut report = LoadReport::default();
    for (name, result) in parsed {
        let outcome = apply(tree, &name, result);
        report.loads.push(SourceLoad { source: name, outcome });
    }
    report
}

fn apply(tree: &mut TemplateTree, name: &str, parsed: Result<Option<TemplateTree>, SourceError>) -> LoadOutcome {
    match parsed {
        Ok(Some(fragment)) => {
            let report = tree.merge(fragment);
            for collision in &report.collisions {
                warn!(source = %name, path = %collision.path, kind = %collision.kind, "Message kind collision");
            }
            debug!(source = %name, added = report.added, "apply: merged source");
            LoadOutcome::Applied(report)
        }
        Ok(None) => {
            debug!(source = %name, "apply: source missing, skipping");
            LoadOutcome::Missing
        }
        Err(e) => {
            warn!(source = %name, error = %e, "Skipping malformed message source");
            LoadOutcome::Rejected(e)
        }
    }
}
