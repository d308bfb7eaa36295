//! Domain error types.

use thiserror::Error;

/// Input problems detected before any storage call.
///
/// The display text is user-facing and is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Custom code must not be empty")]
    EmptyCustomCode,

    #[error("Custom code must be at least {min} characters")]
    CustomCodeTooShort { min: usize },

    #[error("Quantity must be at least 1")]
    QuantityOutOfRange,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("max_uses must be between 1 and {max}")]
    InvalidMaxUses { max: i32 },

    #[error("Batch export requires a batch key")]
    MissingBatchKey,

    #[error("{0}")]
    InvalidRange(String),

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    /// Wraps a range-order failure from the shared validators.
    pub fn from_range(err: validator::ValidationError) -> Self {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| "Invalid time range".to_string());
        ValidationError::InvalidRange(message)
    }
}

/// Error type returned by domain services and storage ports.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Shorthand for the not-found error used by update and delete.
    pub fn code_not_found() -> Self {
        DomainError::NotFound("Access code not found".into())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();

        let message = if messages.len() == 1 {
            messages[0].clone()
        } else {
            format!("{} validation errors", messages.len())
        };

        DomainError::Validation(ValidationError::Invalid(message))
    }
}

impl From<shared::hashing::HashError> for DomainError {
    fn from(err: shared::hashing::HashError) -> Self {
        DomainError::Storage(format!("Hashing failed: {}", err))
    }
}
