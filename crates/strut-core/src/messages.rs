//! Message Templates
//!
//! Process-wide registry of namespaced message templates plus
//! `{{path}}` interpolation over structured context. Components
//! register their message tables once at load time; re-registering an
//! existing key without the overwrite flag is rejected so
//! independently-loaded components cannot silently clobber each other.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;

use crate::error::{ErrorKind, UiError, fail};

/// Default templates for the framework's own codes
const DEFAULTS: &[(&str, &str)] = &[
    ("core.invalid_identity", "Invalid component id \"{{id}}\""),
    ("core.element_not_found", "No element found for \"{{target}}\""),
    (
        "core.duplicate_identity",
        "A {{kind}} component with id \"{{id}}\" already exists",
    ),
    (
        "core.ownership_conflict",
        "Element is already owned by a {{owner}} component",
    ),
    (
        "core.already_destructed",
        "{{kind}} \"{{id}}\" is already destructed",
    ),
    (
        "core.destruct_in_progress",
        "{{kind}} \"{{id}}\" is already being destructed",
    ),
    (
        "core.duplicate_message",
        "Message template \"{{key}}\" is already registered",
    ),
    ("core.assertion_failed", "{{message}}"),
];

fn registry() -> &'static Mutex<HashMap<String, String>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a namespace's message table. Keys are stored as
/// `"<namespace>.<key>"`. Re-registering an existing key fails unless
/// `overwrite` is set.
pub fn register_messages(
    namespace: &str,
    messages: &[(&str, &str)],
    overwrite: bool,
) -> Result<(), UiError> {
    let mut table = registry().lock().unwrap_or_else(|e| e.into_inner());
    if !overwrite {
        for (key, _) in messages {
            let full = format!("{namespace}.{key}");
            if table.contains_key(&full) {
                return Err(fail(
                    ErrorKind::AssertionFailed,
                    "core.duplicate_message",
                    serde_json::json!({ "key": full }),
                ));
            }
        }
    }
    for (key, template) in messages {
        table.insert(format!("{namespace}.{key}"), template.to_string());
    }
    Ok(())
}

/// Resolve a code to its template: namespaced registry, then the
/// default table, then a literal `{{message}}` passthrough.
pub fn resolve_template(code: &str) -> String {
    if let Some(template) = registry()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(code)
    {
        return template.clone();
    }
    DEFAULTS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, template)| template.to_string())
        .unwrap_or_else(|| "{{message}}".to_string())
}

/// Resolve and interpolate a code against a context value
pub fn render(code: &str, context: &Value) -> String {
    interpolate(&resolve_template(code), context)
}

/// Interpolate `{{path}}` placeholders against a context value.
/// Paths support dotted and bracket segments; a missing path renders
/// as the empty string.
pub fn interpolate(template: &str, context: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                if let Some(value) = lookup_path(context, after[..end].trim()) {
                    out.push_str(&render_value(value));
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder, emit verbatim
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lookup_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = context;
    for segment in path.split('.') {
        let key_end = segment.find('[').unwrap_or(segment.len());
        let key = &segment[..key_end];
        if !key.is_empty() {
            current = current.get(key)?;
        }
        let mut rest = &segment[key_end..];
        while let Some(close) = rest.find(']') {
            let inside = &rest[1..close];
            current = match inside.parse::<usize>() {
                Ok(index) => current.get(index)?,
                Err(_) => current.get(inside.trim_matches(|c| c == '"' || c == '\''))?,
            };
            rest = &rest[close + 1..];
            if !rest.starts_with('[') {
                break;
            }
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interpolate_simple() {
        let message = interpolate(
            "No element found with id \"{{id}}\"",
            &json!({ "id": "x" }),
        );
        assert_eq!(message, "No element found with id \"x\"");
    }

    #[test]
    fn test_interpolate_missing_path_is_empty() {
        let message = interpolate("value: {{a.b.c}}!", &json!({ "a": {} }));
        assert_eq!(message, "value: !");
    }

    #[test]
    fn test_interpolate_dotted_and_bracket_paths() {
        let context = json!({
            "anchor": { "id": "save" },
            "items": ["zero", "one"],
        });
        assert_eq!(interpolate("{{anchor.id}}", &context), "save");
        assert_eq!(interpolate("{{items[1]}}", &context), "one");
    }

    #[test]
    fn test_interpolate_numbers() {
        assert_eq!(interpolate("{{n}} items", &json!({ "n": 3 })), "3 items");
    }

    #[test]
    fn test_resolve_falls_back_to_message_passthrough() {
        assert_eq!(resolve_template("nowhere.missing"), "{{message}}");
        let rendered = render("nowhere.missing", &json!({ "message": "plain text" }));
        assert_eq!(rendered, "plain text");
    }

    #[test]
    fn test_register_rejects_duplicate_key() {
        register_messages("msgtest", &[("taken", "first {{x}}")], false).unwrap();

        let err = register_messages("msgtest", &[("taken", "second")], false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AssertionFailed);
        assert!(err.message.contains("msgtest.taken"));

        // Explicit overwrite is allowed.
        register_messages("msgtest", &[("taken", "second")], true).unwrap();
        assert_eq!(resolve_template("msgtest.taken"), "second");
    }

    #[test]
    fn test_namespaced_lookup_wins_over_defaults() {
        register_messages(
            "msgtest2",
            &[("element_not_found", "custom: {{target}}")],
            false,
        )
        .unwrap();
        assert_eq!(
            render("msgtest2.element_not_found", &json!({ "target": "#a" })),
            "custom: #a"
        );
        // Unregistered namespaces still resolve through the defaults.
        assert_eq!(
            render("core.element_not_found", &json!({ "target": "#a" })),
            "No element found for \"#a\""
        );
    }
}
