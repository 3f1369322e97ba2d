//! Participant repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::Participant;
use crate::domain::DomainError;

/// Read access to registered participants
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Find any participant whose email or Telegram handle matches
    async fn find_by_email_or_handle(
        &self,
        email: &str,
        telegram: &str,
    ) -> Result<Option<Participant>, DomainError>;
}
