//! Shared Error Types
//!
//! Errors produced by the data model itself, independent of any transport.
//!
//! # Error Categories
//!
//! - `ValidationError` - A form field rejected before a request is sent
//! - `UnknownMonsterType` - A type tag outside the fixed enumeration
//!
//! # Usage
//!
//! ```rust
//! use aidex::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "Enter a valid e-mail address");
//! assert_eq!(error.field(), Some("email"));
//! ```
use thiserror::Error;

/// Errors that can occur while building or validating shared data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Monster type tag that is not part of the enumeration
    #[error("Unknown monster type: {value}")]
    UnknownMonsterType {
        /// The rejected tag
        value: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new unknown type error
    pub fn unknown_type(value: impl Into<String>) -> Self {
        Self::UnknownMonsterType {
            value: value.into(),
        }
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            _ => None,
        }
    }
}
