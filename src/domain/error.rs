use thiserror::Error;

use super::storage::UniqueConstraint;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: UniqueConstraint },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unique_violation(constraint: UniqueConstraint) -> Self {
        Self::UniqueViolation { constraint }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Returns the violated constraint if this is a uniqueness failure
    pub fn violated_constraint(&self) -> Option<UniqueConstraint> {
        match self {
            Self::UniqueViolation { constraint } => Some(*constraint),
            _ => None,
        }
    }
}
