//! Errors!
//!
//! Like the teacher's own `errors` module, this stays a thin
//! `thiserror` enum rather than growing ad-hoc `String` errors
//! throughout the crate.

use thiserror::Error;

/// An alias for the common Result type of this crate.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// A single schema-validation failure, as produced by [`crate::validate`]
/// or surfaced verbatim from an external manifest validator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{path}: {reason}")]
pub struct SchemaViolation {
    /// Dotted path to the offending field, e.g. `Installers[1].Architecture`.
    pub path: String,
    /// Human-readable reason the field failed validation.
    pub reason: String,
}

impl SchemaViolation {
    /// Build a new violation.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors this crate can produce.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The text didn't parse as either wire format.
    #[error("failed to parse manifest text: {0}")]
    Parse(String),

    /// A required field was missing or malformed.
    #[error("malformed manifest: {0}")]
    Malformed(String),

    /// One or more fields failed validation.
    #[error("{} schema violation(s) found", .0.len())]
    Invalid(Vec<SchemaViolation>),

    /// `package_identifier` differed between two manifests that must agree.
    #[error("package identifier changed: expected `{expected}`, found `{actual}`")]
    IdentityChanged {
        /// The identifier the tree was constructed with.
        expected: String,
        /// The identifier found on the incoming record.
        actual: String,
    },
}
