//! Transactional store traits

use async_trait::async_trait;

use crate::domain::participant::{NewParticipant, Participant};
use crate::domain::reference::CategoryId;
use crate::domain::team::{NewTeam, Team, TeamId};
use crate::domain::DomainError;

/// Entry point to the transactional part of the registration flow
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Open a transaction; it holds one pooled connection until it ends
    async fn begin(&self) -> Result<Box<dyn RegistrationTransaction>, DomainError>;

    /// Cheap round trip used by readiness probes
    async fn ping(&self) -> Result<(), DomainError>;
}

/// One atomic unit of reads and writes.
///
/// Dropping a transaction without calling [`commit`](Self::commit) rolls it
/// back. Inserts that collide with a uniqueness constraint fail with
/// [`DomainError::UniqueViolation`]; after such a failure the transaction must
/// be rolled back.
#[async_trait]
pub trait RegistrationTransaction: Send {
    /// Find the team with this exact name in this category
    async fn find_team(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<Option<Team>, DomainError>;

    /// Whether a team with this name exists in any other category
    async fn team_exists_in_other_category(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<bool, DomainError>;

    /// Number of participants currently attached to a team. Locks the team
    /// until the transaction ends, so concurrent joiners count one at a time.
    async fn count_team_members(&mut self, team_id: TeamId) -> Result<usize, DomainError>;

    /// Insert a team, enforcing (name, category) uniqueness
    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError>;

    /// Insert a participant, enforcing email and handle uniqueness
    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<Participant, DomainError>;

    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
