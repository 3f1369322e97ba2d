//! Registration error taxonomy

use serde::Serialize;
use thiserror::Error;

use super::submission::SubmissionField;
use crate::domain::DomainError;

/// Machine-readable reason attached to every rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Missing,
    TooShort,
    TooLong,
    Malformed,
    EnumMismatch,
    CrossField,
    NotFound,
    Duplicate,
    LeaderRequired,
    TeamInOtherCategory,
    TeamFull,
    RetryLater,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::Malformed => "malformed",
            Self::EnumMismatch => "enum_mismatch",
            Self::CrossField => "cross_field",
            Self::NotFound => "not_found",
            Self::Duplicate => "duplicate",
            Self::LeaderRequired => "leader_required",
            Self::TeamInOtherCategory => "team_in_other_category",
            Self::TeamFull => "team_full",
            Self::RetryLater => "retry_later",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed check on one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: SubmissionField,
    pub reason: ReasonCode,
    pub message: String,
}

impl FieldError {
    pub fn new(field: SubmissionField, reason: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            field,
            reason,
            message: message.into(),
        }
    }
}

/// Why team resolution refused the submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamPolicyReason {
    /// Team does not exist and the submitter is not its leader
    LeaderRequired,
    /// Team only exists in another category and the submitter is not a leader
    TeamInOtherCategory,
    /// Team reached the configured member limit
    TeamFull,
}

impl TeamPolicyReason {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::LeaderRequired => ReasonCode::LeaderRequired,
            Self::TeamInOtherCategory => ReasonCode::TeamInOtherCategory,
            Self::TeamFull => ReasonCode::TeamFull,
        }
    }
}

/// Every way a registration can fail before it is resolved into an outcome
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Normalization failed on {}: {}", .0.field, .0.message)]
    Normalization(FieldError),

    #[error("Validation failed on {}: {}", .0.field, .0.message)]
    Validation(FieldError),

    #[error("Referenced {field} does not exist")]
    ReferenceNotFound { field: SubmissionField },

    #[error("A participant with this {field} is already registered")]
    DuplicateIdentity { field: SubmissionField },

    #[error("Team policy violation: {reason:?}")]
    TeamPolicyViolation { reason: TeamPolicyReason },

    #[error("Team creation collided again after recovery")]
    ConcurrencyConflict,

    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl RegistrationError {
    pub fn team_policy(reason: TeamPolicyReason) -> Self {
        Self::TeamPolicyViolation { reason }
    }

    /// Field the error is scoped to, if any
    pub fn field(&self) -> Option<SubmissionField> {
        match self {
            Self::Normalization(e) | Self::Validation(e) => Some(e.field),
            Self::ReferenceNotFound { field } | Self::DuplicateIdentity { field } => Some(*field),
            Self::TeamPolicyViolation { .. } => Some(SubmissionField::TeamName),
            Self::ConcurrencyConflict | Self::Storage(_) => None,
        }
    }

    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::Normalization(e) | Self::Validation(e) => e.reason,
            Self::ReferenceNotFound { .. } => ReasonCode::NotFound,
            Self::DuplicateIdentity { .. } => ReasonCode::Duplicate,
            Self::TeamPolicyViolation { reason } => reason.reason_code(),
            Self::ConcurrencyConflict | Self::Storage(_) => ReasonCode::RetryLater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_code_serialization() {
        assert_eq!(
            serde_json::to_string(&ReasonCode::EnumMismatch).unwrap(),
            "\"enum_mismatch\""
        );
        assert_eq!(
            serde_json::to_string(&ReasonCode::TeamInOtherCategory).unwrap(),
            "\"team_in_other_category\""
        );
        assert_eq!(ReasonCode::RetryLater.to_string(), "retry_later");
    }

    #[test]
    fn test_field_scoping() {
        let err = RegistrationError::DuplicateIdentity {
            field: SubmissionField::Email,
        };
        assert_eq!(err.field(), Some(SubmissionField::Email));
        assert_eq!(err.reason_code(), ReasonCode::Duplicate);

        let err = RegistrationError::team_policy(TeamPolicyReason::LeaderRequired);
        assert_eq!(err.field(), Some(SubmissionField::TeamName));
        assert_eq!(err.reason_code(), ReasonCode::LeaderRequired);
    }

    #[test]
    fn test_storage_errors_are_retry_later() {
        let err: RegistrationError = DomainError::storage("connection reset").into();
        assert!(err.field().is_none());
        assert_eq!(err.reason_code(), ReasonCode::RetryLater);
        assert_eq!(
            RegistrationError::ConcurrencyConflict.reason_code(),
            ReasonCode::RetryLater
        );
    }

    #[test]
    fn test_display_includes_field() {
        let err = RegistrationError::Validation(FieldError::new(
            SubmissionField::FullName,
            ReasonCode::TooShort,
            "too short",
        ));
        assert_eq!(err.to_string(), "Validation failed on full_name: too short");
    }
}
