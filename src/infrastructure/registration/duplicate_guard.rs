//! Email and Telegram handle collision check

use std::sync::Arc;

use tracing::warn;

use crate::domain::participant::ParticipantRepository;
use crate::domain::registration::{RegistrationError, SubmissionField};

/// Rejects submissions whose email or handle is already registered
#[derive(Clone)]
pub struct DuplicateGuard {
    participants: Arc<dyn ParticipantRepository>,
}

impl DuplicateGuard {
    pub fn new(participants: Arc<dyn ParticipantRepository>) -> Self {
        Self { participants }
    }

    /// Email collisions are reported before handle collisions
    pub async fn check(&self, email: &str, telegram: &str) -> Result<(), RegistrationError> {
        let Some(existing) = self
            .participants
            .find_by_email_or_handle(email, telegram)
            .await?
        else {
            return Ok(());
        };

        let field = if existing.email() == email {
            SubmissionField::Email
        } else {
            SubmissionField::Telegram
        };

        warn!(
            email = %email,
            telegram = %telegram,
            field = %field,
            "Registration rejected: already registered"
        );

        Err(RegistrationError::DuplicateIdentity { field })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::participant::{
        MockParticipantRepository, NewParticipant, Participant, ParticipantId, ParticipationFormat,
    };
    use crate::domain::reference::CategoryId;

    fn existing(email: &str, telegram: &str) -> Participant {
        NewParticipant {
            full_name: "Existing User".to_string(),
            email: email.to_string(),
            telegram: telegram.to_string(),
            phone: "+380501234567".to_string(),
            is_student: false,
            study_year: None,
            university_id: None,
            category_id: CategoryId::new(1),
            participation_format: ParticipationFormat::Offline,
            team_id: None,
            team_leader: false,
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
        .into_participant(ParticipantId::new(1), Utc::now())
    }

    #[tokio::test]
    async fn test_no_collision() {
        let mut repo = MockParticipantRepository::new();
        repo.expect_find_by_email_or_handle()
            .with(eq("new@example.com"), eq("@new"))
            .times(1)
            .returning(|_, _| Ok(None));

        let guard = DuplicateGuard::new(Arc::new(repo));
        assert!(guard.check("new@example.com", "@new").await.is_ok());
    }

    #[tokio::test]
    async fn test_email_collision() {
        let mut repo = MockParticipantRepository::new();
        repo.expect_find_by_email_or_handle()
            .returning(|_, _| Ok(Some(existing("taken@example.com", "@other"))));

        let guard = DuplicateGuard::new(Arc::new(repo));
        let err = guard.check("taken@example.com", "@new").await.unwrap_err();

        assert_eq!(err.field(), Some(SubmissionField::Email));
    }

    #[tokio::test]
    async fn test_email_wins_when_both_collide() {
        let mut repo = MockParticipantRepository::new();
        repo.expect_find_by_email_or_handle()
            .returning(|_, _| Ok(Some(existing("taken@example.com", "@taken"))));

        let guard = DuplicateGuard::new(Arc::new(repo));
        let err = guard.check("taken@example.com", "@taken").await.unwrap_err();

        assert_eq!(err.field(), Some(SubmissionField::Email));
    }

    #[tokio::test]
    async fn test_handle_collision() {
        let mut repo = MockParticipantRepository::new();
        repo.expect_find_by_email_or_handle()
            .returning(|_, _| Ok(Some(existing("someone@example.com", "@taken"))));

        let guard = DuplicateGuard::new(Arc::new(repo));
        let err = guard.check("new@example.com", "@taken").await.unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::DuplicateIdentity {
                field: SubmissionField::Telegram
            }
        ));
    }
}
