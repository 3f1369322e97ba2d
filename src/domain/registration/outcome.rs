//! Terminal result of one registration attempt

use serde::Serialize;

use super::error::{ReasonCode, RegistrationError, TeamPolicyReason};
use super::submission::SubmissionField;
use crate::domain::participant::ParticipantId;
use crate::domain::team::TeamId;

const MSG_SOLO: &str = "Ви успішно зареєструвалися";
const MSG_CREATED_TEAM: &str = "Ви успішно створили команду";
const MSG_JOINED_TEAM: &str = "Ви успішно приєдналися до команди";

const MSG_UNIVERSITY_NOT_FOUND: &str = "Вказаний університет не знайдено";
const MSG_CATEGORY_NOT_FOUND: &str = "Вказана категорія не знайдена";
const MSG_DUPLICATE_EMAIL: &str = "Користувач з таким email вже зареєстрований";
const MSG_DUPLICATE_TELEGRAM: &str = "Користувач з таким telegram вже зареєстрований";
const MSG_LEADER_REQUIRED: &str = "Команду має створювати тімлід";
const MSG_TEAM_IN_OTHER_CATEGORY: &str = "Присутня команда з такою назвою в іншій категорії. \
Пересвідчіться, що ви правильно вказали назву команди. \
Якщо Ви переконані, що хочете створити команду, то це має зробити тімлід";
const MSG_TEAM_FULL: &str = "Команда вже повна";
const MSG_RETRY_LATER: &str = "Помилка збереження даних. Можливо, команда або користувач \
були створені одночасно з іншим запитом. Будь ласка, спробуйте ще раз.";

/// How a successful registration relates to teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Solo,
    CreatedTeam,
    JoinedTeam,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::CreatedTeam => "created_team",
            Self::JoinedTeam => "joined_team",
        }
    }

    /// Message shown to the participant
    pub fn message(&self) -> &'static str {
        match self {
            Self::Solo => MSG_SOLO,
            Self::CreatedTeam => MSG_CREATED_TEAM,
            Self::JoinedTeam => MSG_JOINED_TEAM,
        }
    }
}

/// Category of a rejection in the error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Normalization,
    Validation,
    ReferenceNotFound,
    DuplicateIdentity,
    TeamPolicyViolation,
    /// Storage anomaly or unrecovered conflict; the submitter may try again
    RetryLater,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normalization => "normalization",
            Self::Validation => "validation",
            Self::ReferenceNotFound => "reference_not_found",
            Self::DuplicateIdentity => "duplicate_identity",
            Self::TeamPolicyViolation => "team_policy_violation",
            Self::RetryLater => "retry_later",
        }
    }
}

/// Committed registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub status: RegistrationStatus,
    pub participant_id: ParticipantId,
    pub team_id: Option<TeamId>,
    pub message: String,
}

impl Registration {
    pub fn new(
        status: RegistrationStatus,
        participant_id: ParticipantId,
        team_id: Option<TeamId>,
    ) -> Self {
        Self {
            status,
            participant_id,
            team_id,
            message: status.message().to_string(),
        }
    }
}

/// Refused registration with one user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<SubmissionField>,
    pub reason_code: ReasonCode,
    pub message: String,
}

impl From<RegistrationError> for Rejection {
    fn from(err: RegistrationError) -> Self {
        let field = err.field();
        let reason_code = err.reason_code();

        let (kind, message) = match err {
            RegistrationError::Normalization(e) => (RejectionKind::Normalization, e.message),
            RegistrationError::Validation(e) => (RejectionKind::Validation, e.message),
            RegistrationError::ReferenceNotFound { field } => {
                let message = match field {
                    SubmissionField::UniversityId => MSG_UNIVERSITY_NOT_FOUND,
                    _ => MSG_CATEGORY_NOT_FOUND,
                };
                (RejectionKind::ReferenceNotFound, message.to_string())
            }
            RegistrationError::DuplicateIdentity { field } => {
                let message = match field {
                    SubmissionField::Telegram => MSG_DUPLICATE_TELEGRAM,
                    _ => MSG_DUPLICATE_EMAIL,
                };
                (RejectionKind::DuplicateIdentity, message.to_string())
            }
            RegistrationError::TeamPolicyViolation { reason } => {
                let message = match reason {
                    TeamPolicyReason::LeaderRequired => MSG_LEADER_REQUIRED,
                    TeamPolicyReason::TeamInOtherCategory => MSG_TEAM_IN_OTHER_CATEGORY,
                    TeamPolicyReason::TeamFull => MSG_TEAM_FULL,
                };
                (RejectionKind::TeamPolicyViolation, message.to_string())
            }
            RegistrationError::ConcurrencyConflict | RegistrationError::Storage(_) => {
                (RejectionKind::RetryLater, MSG_RETRY_LATER.to_string())
            }
        };

        Self {
            kind,
            field,
            reason_code,
            message,
        }
    }
}

/// Result of `register`; every error is folded into `Rejected`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Registered(Registration),
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    pub fn registration(&self) -> Option<&Registration> {
        match self {
            Self::Registered(registration) => Some(registration),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Registered(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Status label: `solo`, `created_team`, `joined_team` or `rejected`
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Registered(registration) => registration.status.as_str(),
            Self::Rejected(_) => "rejected",
        }
    }
}

impl From<Result<Registration, RegistrationError>> for Outcome {
    fn from(result: Result<Registration, RegistrationError>) -> Self {
        match result {
            Ok(registration) => Self::Registered(registration),
            Err(err) => Self::Rejected(err.into()),
        }
    }
}
