//! Error Facility
//!
//! Typed errors carrying a machine-readable namespaced code and the
//! structured context that produced them, plus the assert-or-fail
//! primitive the rest of the framework is written against.

use serde_json::Value;

use crate::messages;

/// Result type for framework operations
pub type UiResult<T> = Result<T, UiError>;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed id at construction
    InvalidIdentity,
    /// Selector/node resolves to nothing
    ElementNotFound,
    /// Registry collision
    DuplicateIdentity,
    /// Element already marked by a different kind
    OwnershipConflict,
    /// Operation attempted on a terminal instance
    AlreadyDestructed,
    /// Re-entrant destruct call
    DestructInProgress,
    /// Generic fallback
    AssertionFailed,
}

/// Framework error with code and structured context
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct UiError {
    pub kind: ErrorKind,
    /// Namespaced message code, e.g. `core.duplicate_identity`
    pub code: String,
    /// Rendered message
    pub message: String,
    /// Context the error was raised with
    pub context: Value,
}

impl From<strut_dom::DomError> for UiError {
    fn from(err: strut_dom::DomError) -> Self {
        let kind = match err {
            strut_dom::DomError::NotFound => ErrorKind::ElementNotFound,
            _ => ErrorKind::AssertionFailed,
        };
        fail(
            kind,
            "core.assertion_failed",
            serde_json::json!({ "message": err.to_string() }),
        )
    }
}

/// Construct an error: resolve the code to a template and interpolate
/// the context into it.
pub fn fail(kind: ErrorKind, code: &str, context: Value) -> UiError {
    let message = messages::render(code, &context);
    UiError {
        kind,
        code: code.to_string(),
        message,
        context,
    }
}

/// Assert-or-fail primitive. The context producer only runs when the
/// condition is falsy.
pub fn ensure(
    condition: bool,
    kind: ErrorKind,
    code: &str,
    context: impl FnOnce() -> Value,
) -> UiResult<()> {
    if condition {
        Ok(())
    } else {
        Err(fail(kind, code, context()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fail_renders_default_template() {
        let err = fail(
            ErrorKind::ElementNotFound,
            "core.element_not_found",
            json!({ "target": "#save" }),
        );
        assert_eq!(err.kind, ErrorKind::ElementNotFound);
        assert_eq!(err.code, "core.element_not_found");
        assert_eq!(err.message, "No element found for \"#save\"");
        assert_eq!(err.context["target"], "#save");
    }

    #[test]
    fn test_display_carries_code_and_message() {
        let err = fail(
            ErrorKind::AssertionFailed,
            "core.assertion_failed",
            json!({ "message": "broken invariant" }),
        );
        assert_eq!(
            err.to_string(),
            "[core.assertion_failed] broken invariant"
        );
    }

    #[test]
    fn test_ensure_is_lazy() {
        let result = ensure(true, ErrorKind::AssertionFailed, "core.assertion_failed", || {
            panic!("context must not be built for a passing assertion")
        });
        assert!(result.is_ok());

        let err = ensure(false, ErrorKind::InvalidIdentity, "core.invalid_identity", || {
            json!({ "id": "#bad" })
        })
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidIdentity);
        assert_eq!(err.message, "Invalid component id \"#bad\"");
    }
}
