//! Template tree and deep merge
//!
//! A tree maps path segments to either a nested tree or a leaf template.
//! Merging is always deep: sub-trees recurse, leaves are last-writer-wins,
//! and a leaf meeting a sub-tree at the same path is replaced outright by
//! whichever side is newer. Every overwrite is recorded in a [`MergeReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_yaml::Value;
use tracing::debug;

use crate::error::SourceError;

/// Separator between namespace segments in a lookup path
pub const PATH_SEPARATOR: char = '/';

/// Split a namespace path into segments, ignoring empty ones
///
/// `"admin/users"`, `"/admin/users/"` and `"admin//users"` all yield
/// `["admin", "users"]`; `""` yields no segments (the root).
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, segment)
    }
}

/// A message template stored at a leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// Text that may contain `%{name}` placeholders
    Text(String),
    /// A non-string scalar (number, boolean) configured as a leaf.
    /// Rendered verbatim, never interpolated.
    Literal(String),
}

impl Template {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Literal(s) => s,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A node in the template tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Leaf(Template),
    Tree(TemplateTree),
}

impl Node {
    fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Tree(tree) => tree.leaf_count(),
        }
    }
}

/// Which side won a leaf/sub-tree collision during merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// An incoming leaf replaced an existing sub-tree
    LeafReplacedTree,
    /// An incoming sub-tree replaced an existing leaf
    TreeReplacedLeaf,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeafReplacedTree => write!(f, "leaf replaced sub-tree"),
            Self::TreeReplacedLeaf => write!(f, "sub-tree replaced leaf"),
        }
    }
}

/// A leaf/sub-tree kind collision at a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub path: String,
    pub kind: CollisionKind,
}

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Leaves written at paths that previously held no leaf
    pub added: usize,
    /// Paths whose leaf was replaced by a different leaf
    pub overwritten: Vec<String>,
    /// Kind collisions, resolved in favour of the incoming side
    pub collisions: Vec<Collision>,
}

impl MergeReport {
    /// Fold another report into this one
    pub fn absorb(&mut self, other: MergeReport) {
        self.added += other.added;
        self.overwritten.extend(other.overwritten);
        self.collisions.extend(other.collisions);
    }

    pub fn is_clean(&self) -> bool {
        self.overwritten.is_empty() && self.collisions.is_empty()
    }
}

/// Hierarchical mapping of namespace segments to templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TemplateTree {
    nodes: BTreeMap<String, Node>,
}

impl TemplateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree holding a single leaf at `segments/key`
    pub fn from_path<'a>(segments: impl IntoIterator<Item = &'a str>, key: &str, template: Template) -> Self {
        let segments: Vec<&str> = segments.into_iter().collect();
        let mut tree = TemplateTree::new();
        tree.nodes.insert(key.to_string(), Node::Leaf(template));
        for segment in segments.into_iter().rev() {
            let mut parent = TemplateTree::new();
            parent.nodes.insert(segment.to_string(), Node::Tree(tree));
            tree = parent;
        }
        tree
    }

    /// Convert a parsed YAML/JSON document into a tree
    ///
    /// The document must be a mapping (an empty document counts as an empty
    /// mapping). String leaves become [`Template::Text`], numbers and
    /// booleans become [`Template::Literal`], nulls are dropped. Sequences,
    /// tagged values and non-scalar keys reject the whole document.
    pub fn from_value(name: &str, value: Value) -> Result<Self, SourceError> {
        debug!(%name, "TemplateTree::from_value: called");
        match value {
            Value::Mapping(mapping) => Self::from_mapping(name, "", mapping),
            Value::Null => {
                debug!(%name, "TemplateTree::from_value: empty document");
                Ok(Self::new())
            }
            other => Err(SourceError::NotAMapping {
                name: name.to_string(),
                found: value_kind(&other),
            }),
        }
    }

    fn from_mapping(name: &str, prefix: &str, mapping: serde_yaml::Mapping) -> Result<Self, SourceError> {
        let mut tree = TemplateTree::new();
        let mut seen = BTreeSet::new();
        for (key, value) in mapping {
            let segment = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(SourceError::InvalidKey {
                        name: name.to_string(),
                        path: prefix.to_string(),
                    });
                }
            };
            let path = join_path(prefix, &segment);
            // `404` and `"404"` are distinct YAML keys but the same segment
            if !seen.insert(segment.clone()) {
                return Err(SourceError::DuplicateKey {
                    name: name.to_string(),
                    path,
                });
            }
            // No lookup path can address an empty segment
            if segment.is_empty() {
                debug!(source = name, %path, "TemplateTree::from_mapping: skipping empty key");
                continue;
            }
            let node = match value {
                Value::String(s) => Node::Leaf(Template::Text(s)),
                Value::Number(n) => Node::Leaf(Template::Literal(n.to_string())),
                Value::Bool(b) => Node::Leaf(Template::Literal(b.to_string())),
                Value::Null => continue,
                Value::Mapping(nested) => Node::Tree(Self::from_mapping(name, &path, nested)?),
                other => {
                    return Err(SourceError::UnsupportedNode {
                        name: name.to_string(),
                        path,
                        found: value_kind(&other),
                    });
                }
            };
            tree.nodes.insert(segment, node);
        }
        Ok(tree)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves anywhere below this tree
    pub fn leaf_count(&self) -> usize {
        self.nodes.values().map(Node::leaf_count).sum()
    }

    pub fn get(&self, segment: &str) -> Option<&Node> {
        self.nodes.get(segment)
    }

    /// Walk `segments` through sub-trees and return the leaf at `key`
    ///
    /// Returns `None` when a segment is missing or is a leaf, when `key` is
    /// empty or missing, or when `key` names a sub-tree.
    pub fn resolve<'a>(&self, segments: impl IntoIterator<Item = &'a str>, key: &str) -> Option<&Template> {
        if key.is_empty() {
            return None;
        }
        let mut current = self;
        for segment in segments {
            match current.nodes.get(segment)? {
                Node::Tree(tree) => current = tree,
                Node::Leaf(_) => return None,
            }
        }
        match current.nodes.get(key)? {
            Node::Leaf(template) => Some(template),
            Node::Tree(_) => None,
        }
    }

    /// Deep-merge `other` into this tree; `other` wins every collision
    pub fn merge(&mut self, other: TemplateTree) -> MergeReport {
        let mut report = MergeReport::default();
        self.merge_at(other, "", &mut report);
        debug!(
            added = report.added,
            overwritten = report.overwritten.len(),
            collisions = report.collisions.len(),
            "TemplateTree::merge: complete"
        );
        report
    }

    fn merge_at(&mut self, other: TemplateTree, prefix: &str, report: &mut MergeReport) {
        for (segment, incoming) in other.nodes {
            let path = join_path(prefix, &segment);
            match self.nodes.entry(segment) {
                Entry::Vacant(slot) => {
                    report.added += incoming.leaf_count();
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                    (Node::Tree(existing), Node::Tree(incoming)) => existing.merge_at(incoming, &path, report),
                    (Node::Leaf(existing), Node::Leaf(incoming)) => {
                        if *existing != incoming {
                            report.overwritten.push(path);
                            *existing = incoming;
                        }
                    }
                    (existing, incoming) => {
                        let kind = match incoming {
                            Node::Leaf(_) => CollisionKind::LeafReplacedTree,
                            Node::Tree(_) => CollisionKind::TreeReplacedLeaf,
                        };
                        debug!(%path, %kind, "TemplateTree::merge_at: kind collision");
                        report.added += incoming.leaf_count();
                        report.collisions.push(Collision { path, kind });
                        *existing = incoming;
                    }
                },
            }
        }
    }

    /// All leaves as `(full/path/key, template)`, in sorted path order
    pub fn leaves(&self) -> Vec<(String, &Template)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Template)>) {
        for (segment, node) in &self.nodes {
            let path = join_path(prefix, segment);
            match node {
                Node::Leaf(template) => out.push((path, template)),
                Node::Tree(tree) => tree.collect_leaves(&path, out),
            }
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
