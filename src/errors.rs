//! Errors reported by cursor adapters and their collaborators.
use thiserror::Error;

/// The cursor adapter was used in a state that does not support the operation.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("the underlying cursor is not available")]
    CursorUnavailable,

    #[error("cursor iteration was not started")]
    NotStarted,
}

/// A raw document does not conform to the projection model.
#[derive(Debug, Error)]
#[error("document '{document_id}' is not a valid {model}: {reason}")]
pub struct ValidationError {
    /// Identifier of the document that failed validation, or `<NO ID>`.
    pub document_id: String,

    /// Fields named by the parser as the source of the failure.
    pub fields: Vec<String>,

    /// Name of the model the document was converted into.
    pub model: &'static str,

    /// Message reported by the parser.
    pub reason: String,
}

impl ValidationError {
    /// Build a validation error for the value at `path` in the document.
    ///
    /// `path` uses the dotted notation of [`serde_path_to_error::Path`], with `.`
    /// for the document itself.
    pub fn new<S1, S2>(
        model: &'static str,
        document_id: S1,
        path: &str,
        reason: S2,
    ) -> ValidationError
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let reason = reason.into();
        let fields = failing_field(path, &reason).into_iter().collect();
        ValidationError {
            document_id: document_id.into(),
            fields,
            model,
            reason,
        }
    }
}

/// Unable to fetch documents from an open cursor.
#[derive(Debug, Error)]
#[error("unable to fetch documents from the cursor")]
pub struct CursorFetchError;

/// Locate the field responsible for a deserialization failure.
///
/// Errors about a struct member (missing, unknown or duplicate) are reported by
/// serde at the path of the struct itself, with the member name in the message.
fn failing_field(path: &str, reason: &str) -> Option<String> {
    let path = match path {
        "." | "" => None,
        path => Some(path),
    };
    let member = ["missing field `", "unknown field `", "duplicate field `"]
        .iter()
        .find_map(|prefix| reason.strip_prefix(prefix))
        .and_then(|rest| rest.split('`').next())
        .filter(|member| !member.is_empty());
    match (path, member) {
        (Some(path), Some(member)) => Some(format!("{}.{}", path, member)),
        (None, Some(member)) => Some(member.to_string()),
        (Some(path), None) => Some(path.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::ValidationError;

    #[test]
    fn missing_field_is_named() {
        let error = ValidationError::new("Item", "<NO ID>", ".", "missing field `name`");
        assert_eq!(error.fields, vec!["name".to_string()]);
    }

    #[test]
    fn missing_nested_field() {
        let error = ValidationError::new("Item", "abc", "size", "missing field `width`");
        assert_eq!(error.fields, vec!["size.width".to_string()]);
    }

    #[test]
    fn unknown_field_ignores_expected_list() {
        let error = ValidationError::new(
            "Item",
            "abc",
            ".",
            "unknown field `colour`, expected `name` or `size`",
        );
        assert_eq!(error.fields, vec!["colour".to_string()]);
    }

    #[test]
    fn type_mismatch_uses_path() {
        let error = ValidationError::new("Item", "abc", "x", "invalid type: string, expected i32");
        assert_eq!(error.fields, vec!["x".to_string()]);
        assert_eq!(
            error.to_string(),
            "document 'abc' is not a valid Item: invalid type: string, expected i32",
        );
    }

    #[test]
    fn unknown_variant_uses_path() {
        let error = ValidationError::new(
            "Item",
            "abc",
            "kind",
            "unknown variant `foo`, expected `book` or `disc`",
        );
        assert_eq!(error.fields, vec!["kind".to_string()]);
    }

    #[test]
    fn document_level_failure() {
        let error = ValidationError::new("Item", "abc", ".", "invalid type: integer, expected map");
        assert!(error.fields.is_empty());
    }
}
