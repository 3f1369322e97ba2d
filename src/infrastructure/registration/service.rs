//! Registration service - runs one submission through the whole pipeline

use std::time::Instant;

use tracing::{info, instrument, warn};

use super::commit::commit_registration;
use super::duplicate_guard::DuplicateGuard;
use super::reference_resolver::ReferenceResolver;
use super::team_resolution::TeamResolver;
use crate::domain::registration::{
    normalize, validate, Outcome, Registration, RegistrationError, Submission, ValidatedSubmission,
};
use crate::domain::team::TeamPolicy;
use crate::infrastructure::observability::record_registration;
use crate::infrastructure::storage::Stores;

/// Registration engine shared by every request handler
#[derive(Clone)]
pub struct RegistrationService {
    duplicates: DuplicateGuard,
    references: ReferenceResolver,
    teams: TeamResolver,
}

impl std::fmt::Debug for RegistrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationService").finish_non_exhaustive()
    }
}

impl RegistrationService {
    pub fn new(stores: Stores, policy: TeamPolicy) -> Self {
        Self {
            duplicates: DuplicateGuard::new(stores.participants),
            references: ReferenceResolver::new(stores.references),
            teams: TeamResolver::new(stores.registrations, policy),
        }
    }

    /// Register one submission.
    ///
    /// Never fails: every error, storage failures included, is folded into
    /// [`Outcome::Rejected`]. Nothing is persisted unless the outcome is
    /// [`Outcome::Registered`].
    #[instrument(skip_all, fields(email = %submission.email.trim()))]
    pub async fn register(&self, submission: Submission) -> Outcome {
        let start = Instant::now();
        let outcome = Outcome::from(self.run(submission).await);

        let reason = match &outcome {
            Outcome::Registered(registration) => {
                info!(
                    status = registration.status.as_str(),
                    participant_id = %registration.participant_id,
                    team_id = ?registration.team_id.map(|id| id.value()),
                    "Participant registered"
                );
                "none"
            }
            Outcome::Rejected(rejection) => {
                warn!(
                    kind = rejection.kind.as_str(),
                    field = ?rejection.field.map(|f| f.as_str()),
                    reason = rejection.reason_code.as_str(),
                    "Registration rejected"
                );
                rejection.reason_code.as_str()
            }
        };

        record_registration(outcome.status_label(), reason, start.elapsed());
        outcome
    }

    async fn run(&self, submission: Submission) -> Result<Registration, RegistrationError> {
        let ValidatedSubmission { participant, team } = validate(normalize(submission)?)?;

        self.duplicates
            .check(&participant.email, &participant.telegram)
            .await?;
        self.references.resolve(&participant).await?;

        let resolution = self.teams.resolve(&team, participant.category_id).await?;
        commit_registration(resolution, participant).await
    }
}
