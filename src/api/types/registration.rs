//! Response body of a successful registration

use serde::{Deserialize, Serialize};

use crate::domain::registration::Registration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub message: String,
    /// `solo`, `created_team` or `joined_team`
    pub status: String,
    pub participant_id: i64,
    pub team_id: Option<i64>,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            status: registration.status.as_str().to_string(),
            participant_id: registration.participant_id.value(),
            team_id: registration.team_id.map(|id| id.value()),
            message: registration.message,
        }
    }
}
