//! Placeholder interpolation
//!
//! Templates carry `%{name}` placeholders. Rendering never fails: a
//! placeholder with no matching parameter turns the whole result into the
//! raw template followed by `(interpolation error: key{name} not found)`,
//! so the attempted message is never lost.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ParamsError;
use crate::registry::Template;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid"));

/// Named values substituted into a template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl fmt::Display) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build params from a JSON object
    ///
    /// Strings are taken as-is, `null` becomes an empty string, every other
    /// value uses its JSON text. Returns `None` if `value` is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(object.iter().map(|(k, v)| (k.clone(), json_to_string(v))).collect())
    }

    /// Build params from anything that serializes to a map (structs, maps)
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ParamsError> {
        let value = serde_json::to_value(value)?;
        Self::from_json(&value).ok_or(ParamsError::NotAMap {
            found: json_kind(&value),
        })
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<HashMap<String, String>> for Params {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

fn json_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Render an optional template against `params`
///
/// `None` renders as an empty string and literal (non-string) templates are
/// returned verbatim.
pub fn render(template: Option<&Template>, params: &Params) -> String {
    match template {
        None => {
            debug!("render: no template, returning empty string");
            String::new()
        }
        Some(Template::Literal(value)) => value.clone(),
        Some(Template::Text(text)) => render_text(text, params),
    }
}

/// Substitute every `%{name}` in `text`
pub fn render_text(text: &str, params: &Params) -> String {
    if !text.contains("%{") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        match params.get(name.as_str()) {
            Some(value) => {
                out.push_str(&text[last..whole.start()]);
                out.push_str(value);
                last = whole.end();
            }
            None => {
                debug!(key = name.as_str(), "render_text: missing parameter");
                return missing_key(text, name.as_str());
            }
        }
    }
    out.push_str(&text[last..]);
    out
}

fn missing_key(text: &str, name: &str) -> String {
    format!("{} (interpolation error: key{{{}}} not found)", text, name)
}

/// Placeholder names in order of first appearance
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text) {
        if let Some(name) = caps.get(1)
            && !names.contains(&name.as_str())
        {
            names.push(name.as_str());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn text(s: &str) -> Template {
        Template::from(s)
    }

    #[test]
    fn test_render_happy_path() {
        let params = Params::new().with("id", 123);
        assert_eq!(
            render(Some(&text("Created account %{id}")), &params),
            "Created account 123"
        );
    }

    #[test]
    fn test_render_multiple_and_repeated_placeholders() {
        let params = Params::new().with("email", "a@b.com").with("role", "admin");
        assert_eq!(
            render_text("%{email} is %{role}; welcome %{email}", &params),
            "a@b.com is admin; welcome a@b.com"
        );
    }

    #[test]
    fn test_render_missing_key_is_annotated() {
        let template = "Created user %{email} with role %{role}";
        let params = Params::new().with("email", "a@b.com");
        let out = render_text(template, &params);

        assert_eq!(
            out,
            "Created user %{email} with role %{role} (interpolation error: key{role} not found)"
        );
    }

    #[test]
    fn test_render_names_first_missing_key() {
        let out = render_text("%{a} %{b} %{c}", &Params::new().with("b", 1));
        assert!(out.ends_with("(interpolation error: key{a} not found)"));
    }

    #[test]
    fn test_render_no_placeholder_fast_path() {
        let params = Params::new().with("id", 1);
        assert_eq!(render(Some(&text("User logged out")), &params), "User logged out");
        assert_eq!(render(Some(&text("User logged out")), &Params::new()), "User logged out");
    }

    #[test]
    fn test_render_none_is_empty() {
        assert_eq!(render(None, &Params::new().with("id", 1)), "");
    }

    #[test]
    fn test_render_literal_is_verbatim() {
        let template = Template::Literal("42".to_string());
        assert_eq!(render(Some(&template), &Params::new()), "42");
    }

    #[test]
    fn test_render_ignores_extra_params() {
        let params = Params::new().with("id", "123").with("name", "Acme");
        assert_eq!(render_text("Created account %{id}", &params), "Created account 123");
    }

    #[test]
    fn test_render_leaves_non_identifier_braces() {
        let params = Params::new().with("id", 7);
        assert_eq!(render_text("%{} %{ id } %{id} 100%", &params), "%{} %{ id } 7 100%");
    }

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        let params = Params::new().with("a", "%{b}");
        assert_eq!(render_text("value: %{a}", &params), "value: %{b}");
    }

    #[test]
    fn test_placeholders_in_order_without_duplicates() {
        assert_eq!(placeholders("%{b} %{a} %{b} %{ c }"), vec!["b", "a"]);
        assert!(placeholders("plain").is_empty());
    }

    #[test]
    fn test_params_from_json() {
        let params = Params::from_json(&json!({
            "id": 123,
            "name": "Acme",
            "admin": true,
            "tags": ["a", "b"],
            "deleted_at": null
        }))
        .unwrap();

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("name"), Some("Acme"));
        assert_eq!(params.get("admin"), Some("true"));
        assert_eq!(params.get("tags"), Some(r#"["a","b"]"#));
        assert_eq!(params.get("deleted_at"), Some(""));
        assert!(Params::from_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_params_from_serialize() {
        #[derive(Serialize)]
        struct Account {
            id: u64,
            email: String,
        }

        let params = Params::from_serialize(&Account {
            id: 9,
            email: "ops@example.com".to_string(),
        })
        .unwrap();
        assert_eq!(render_text("%{email} (#%{id})", &params), "ops@example.com (#9)");

        let err = Params::from_serialize(&"not a map").unwrap_err();
        assert!(matches!(err, ParamsError::NotAMap { found: "string" }));
    }

    #[test]
    fn test_params_from_iter() {
        let params: Params = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("b"), Some("2"));
    }

    proptest! {
        #[test]
        fn prop_text_without_placeholders_is_unchanged(s in "[^%]*") {
            prop_assert_eq!(render_text(&s, &Params::new().with("x", 1)), s);
        }

        #[test]
        fn prop_render_always_keeps_template_on_miss(s in ".*", name in "[a-z_][a-z0-9_]{0,8}") {
            let template = format!("{s}%{{{name}}}");
            let out = render_text(&template, &Params::new());
            prop_assert!(out.starts_with(&template));
            prop_assert!(out.contains("interpolation error"));
        }

        #[test]
        fn prop_supplied_params_never_annotate(value in "[^%]*") {
            let params = Params::new().with("v", &value);
            prop_assert_eq!(render_text("<%{v}>", &params), format!("<{value}>"));
        }
    }
}
