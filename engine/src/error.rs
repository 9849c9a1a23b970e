//! Error types for the dashkit engine.
//!
//! These cover schema and programming mistakes only. A field failing its
//! validation rules is not an error of this kind: it is reported as a
//! [`FieldErrors`](crate::FieldErrors) value.

use thiserror::Error;

/// All possible errors from the dashkit engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Schema errors
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("operator {operator} is not compatible with field '{field}' of type {field_type}")]
    IncompatibleOperator {
        field: String,
        operator: String,
        field_type: String,
    },

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    // Table errors
    #[error("duplicate column id: {0}")]
    DuplicateColumn(String),

    #[error("column not found: {0}")]
    UnknownColumn(String),

    // Value tree errors
    #[error("invalid field path: {0}")]
    InvalidPath(String),

    #[error("value at '{0}' is not an array")]
    NotAnArray(String),

    #[error("index {index} out of bounds for '{path}' (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::DuplicateColumn("name".into());
        assert_eq!(err.to_string(), "duplicate column id: name");

        let err = Error::IndexOutOfBounds {
            path: "tags".into(),
            index: 3,
            len: 2,
        };
        assert_eq!(err.to_string(), "index 3 out of bounds for 'tags' (len 2)");

        let err = Error::IncompatibleOperator {
            field: "age".into(),
            operator: "$regex".into(),
            field_type: "number".into(),
        };
        assert_eq!(
            err.to_string(),
            "operator $regex is not compatible with field 'age' of type number"
        );
    }
}
