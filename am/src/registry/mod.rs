//! Message template registry
//!
//! Templates live in a tree keyed by namespace segments:
//!
//! ```yaml
//! admin:
//!   users:
//!     create: "Admin created user %{email}"
//! sessions:
//!   create: "User logged in with %{email}"
//! ```
//!
//! Sources are deep-merged in load order, later sources winning collisions.
//! `Registry::lookup("admin/users", "create")` walks the tree and returns the
//! leaf template, or `None` on any miss.

mod core;
mod source;
mod tree;

pub use self::core::Registry;
pub use source::{LoadOutcome, LoadReport, SourceLoad, TemplateSource};
pub use tree::{Collision, CollisionKind, MergeReport, Node, PATH_SEPARATOR, Template, TemplateTree, split_path};
