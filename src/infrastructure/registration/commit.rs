//! Final stage: persist the participant in the resolution's transaction

use tracing::error;

use super::team_resolution::Resolution;
use crate::domain::participant::NewParticipant;
use crate::domain::registration::{Registration, RegistrationError, RegistrationStatus};

/// Insert the participant, attach it to the resolved team and commit.
///
/// Any storage failure here, including a uniqueness violation that slipped
/// past the duplicate guard, rolls the whole registration back.
pub async fn commit_registration(
    resolution: Resolution,
    participant: NewParticipant,
) -> Result<Registration, RegistrationError> {
    let Resolution {
        mut transaction,
        team,
        ..
    } = resolution;

    let (participant, status) = match team {
        None => (participant.solo(), RegistrationStatus::Solo),
        Some(team) => {
            let status = if team.created {
                RegistrationStatus::CreatedTeam
            } else {
                RegistrationStatus::JoinedTeam
            };
            (participant.with_team(team.id, team.leader), status)
        }
    };

    let email = participant.email.clone();
    let telegram = participant.telegram.clone();

    let participant = match transaction.insert_participant(participant).await {
        Ok(participant) => participant,
        Err(e) => {
            error!(
                email = %email,
                telegram = %telegram,
                error = %e,
                "Failed to save participant"
            );
            if let Err(rollback_error) = transaction.rollback().await {
                error!(error = %rollback_error, "Failed to roll back transaction");
            }
            return Err(RegistrationError::Storage(e));
        }
    };

    if let Err(e) = transaction.commit().await {
        error!(
            email = %email,
            telegram = %telegram,
            error = %e,
            "Failed to commit registration"
        );
        return Err(RegistrationError::Storage(e));
    }

    Ok(Registration::new(
        status,
        participant.id(),
        participant.team_id(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::participant::ParticipationFormat;
    use crate::domain::reference::CategoryId;
    use crate::domain::registration::{ReasonCode, TeamIntent};
    use crate::domain::storage::{RegistrationStore, RegistrationTransaction};
    use crate::domain::team::{NewTeam, TeamPolicy};
    use crate::infrastructure::registration::TeamResolver;
    use crate::infrastructure::storage::InMemoryStore;
    use std::sync::Arc;

    fn participant(email: &str, telegram: &str) -> NewParticipant {
        NewParticipant {
            full_name: "Test User".to_string(),
            email: email.to_string(),
            telegram: telegram.to_string(),
            phone: "+380501234567".to_string(),
            is_student: false,
            study_year: None,
            university_id: None,
            category_id: CategoryId::new(1),
            participation_format: ParticipationFormat::Online,
            team_id: None,
            team_leader: true,
            wants_job: false,
            job_description: None,
            cv_url: None,
            linkedin: None,
            work_consent: false,
            source: "test".to_string(),
            comment: None,
            personal_data_consent: true,
            skills_text: String::new(),
        }
    }

    async fn resolve(store: &InMemoryStore, intent: TeamIntent) -> Resolution {
        TeamResolver::new(Arc::new(store.clone()), TeamPolicy::unlimited())
            .resolve(&intent, CategoryId::new(1))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_solo_commit() {
        let store = InMemoryStore::new();
        let resolution = resolve(&store, TeamIntent::None).await;

        let registration = commit_registration(resolution, participant("a@example.com", "@a"))
            .await
            .unwrap();

        assert_eq!(registration.status, RegistrationStatus::Solo);
        assert!(registration.team_id.is_none());

        let stored = store.participants().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id(), registration.participant_id);
        assert!(!stored[0].is_team_leader());
    }

    #[tokio::test]
    async fn test_solo_commit_drops_requested_leadership() {
        let store = InMemoryStore::new();
        let resolution = resolve(&store, TeamIntent::None).await;
        let mut requested = participant("lead@example.com", "@lead");
        requested.team_leader = true;

        commit_registration(resolution, requested).await.unwrap();

        let stored = store.participants().unwrap();
        assert!(!stored[0].is_team_leader());
        assert!(stored[0].team_id().is_none());
    }

    #[tokio::test]
    async fn test_created_team_commit_persists_both_rows() {
        let store = InMemoryStore::new();
        let intent = TeamIntent::JoinOrCreate {
            team_name: "Alpha".to_string(),
            leader: true,
        };
        let resolution = resolve(&store, intent).await;

        let registration = commit_registration(resolution, participant("a@example.com", "@a"))
            .await
            .unwrap();

        assert_eq!(registration.status, RegistrationStatus::CreatedTeam);
        let teams = store.teams().unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(registration.team_id, Some(teams[0].id()));
        assert!(store.participants().unwrap()[0].is_team_leader());
    }

    #[tokio::test]
    async fn test_failed_insert_rolls_back_new_team() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_participant(participant("taken@example.com", "@taken"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let intent = TeamIntent::JoinOrCreate {
            team_name: "Alpha".to_string(),
            leader: true,
        };
        let resolution = resolve(&store, intent).await;

        let err = commit_registration(resolution, participant("taken@example.com", "@new"))
            .await
            .unwrap_err();

        assert_eq!(err.reason_code(), ReasonCode::RetryLater);
        assert!(store.teams().unwrap().is_empty());

        // The team name is free again
        let mut tx = store.begin().await.unwrap();
        assert!(tx
            .insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .is_ok());
    }
}
