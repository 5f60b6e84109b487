//! Audit line assembly and emission
//!
//! Glue between a request lifecycle and the registry: look up the event's
//! template, render it, prefix the configured tags and hand the line to
//! `tracing` under the `audit` target. Events without a configured template
//! are not logged.

use tracing::{debug, info};

use crate::config::AuditConfig;
use crate::interpolate::{Params, render};
use crate::registry::Registry;

/// A single auditable event, assembled incrementally by the caller
#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    /// Namespace path, e.g. `admin/users`
    pub path: String,
    /// Event key within the namespace, e.g. `create`
    pub key: String,
    pub params: Params,
    /// Extra tags appended after the configured one (request id, user, ...)
    pub tags: Vec<String>,
}

impl AuditEvent {
    pub fn new(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl std::fmt::Display) -> Self {
        self.params.insert(name, value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Renders and emits audit lines from a shared registry
#[derive(Debug, Clone)]
pub struct AuditLogger {
    registry: Registry,
    config: AuditConfig,
}

impl AuditLogger {
    pub fn new(registry: Registry, config: AuditConfig) -> Self {
        debug!(tag = %config.tag, "AuditLogger::new: called");
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Rendered message for `path` + `key`, or `None` if no template exists
    pub fn message(&self, path: &str, key: &str, params: &Params) -> Option<String> {
        let template = self.registry.lookup(path, key)?;
        Some(render(Some(&template), params))
    }

    /// Prefix `message` with the configured tag and any extra tags
    pub fn format_line(&self, message: &str, tags: &[String]) -> String {
        let mut line = String::new();
        let all_tags = std::iter::once(self.config.tag.as_str()).chain(tags.iter().map(String::as_str));
        for tag in all_tags.map(str::trim).filter(|t| !t.is_empty()) {
            line.push('[');
            line.push_str(tag);
            line.push_str("] ");
        }
        line.push_str(message);
        line
    }

    /// Render, tag and emit an audit line; returns the emitted line
    pub fn record(&self, path: &str, key: &str, params: &Params, tags: &[String]) -> Option<String> {
        let Some(message) = self.message(path, key, params) else {
            debug!(%path, %key, "AuditLogger::record: no template configured, skipping");
            return None;
        };
        let line = self.format_line(&message, tags);
        info!(target: "audit", %path, %key, "{}", line);
        Some(line)
    }

    pub fn record_event(&self, event: &AuditEvent) -> Option<String> {
        self.record(&event.path, &event.key, &event.params, &event.tags)
    }
}
