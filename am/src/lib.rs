//! auditmsg - message templates for structured audit logging
//!
//! Resolves a logical event (namespace path + key) to a human-readable
//! template, substitutes `%{name}` parameters into it, and emits a tagged
//! audit line.
//!
//! # Architecture
//!
//! ```text
//! config/audit_messages.yml          (application)
//! plugins/*/config/audit_messages.yml (plugins, in path order)
//!          │ discovery
//!          ▼
//!     Registry  ── deep merge, later sources win
//!          │ lookup("admin/users", "create")
//!          ▼
//!     render(template, params)  ── never fails, annotates missing keys
//!          │
//!          ▼
//!     AuditLogger ── "[AUDIT] Admin created user a@b.com" → tracing
//! ```
//!
//! # Example
//!
//! ```ignore
//! use auditmsg::{Params, Registry, TemplateSource, render};
//!
//! let registry = Registry::new();
//! registry.load(TemplateSource::file("config/audit_messages.yml"));
//! let template = registry.lookup("admin/users", "create");
//! let line = render(template.as_ref(), &Params::new().with("email", "a@b.com"));
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod interpolate;
pub mod registry;

pub use audit::{AuditEvent, AuditLogger};
pub use config::Config;
pub use discovery::SourceDiscovery;
pub use error::{ParamsError, RegistryError, SourceError};
pub use interpolate::{Params, placeholders, render, render_text};
pub use registry::{
    Collision, CollisionKind, LoadOutcome, LoadReport, MergeReport, Registry, Template, TemplateSource, TemplateTree,
};
