//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures caused by the caller's input.
/// Storage failures, including missing rows, belong to the infrastructure
/// layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. zero scan count, empty batch).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. blank barcode).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_reason() {
        assert_eq!(
            DomainError::validation("count cannot be zero").to_string(),
            "validation failed: count cannot be zero"
        );
        assert_eq!(
            DomainError::invalid_id("barcode cannot be empty").to_string(),
            "invalid identifier: barcode cannot be empty"
        );
    }
}
