//! In-memory registration store
//!
//! Writes are staged per transaction and published on commit. Every unique
//! key a transaction writes is reserved until it finishes; a second
//! transaction writing the same key waits for the first one and then fails
//! with a unique violation if it committed, or proceeds if it rolled back.
//! This is how PostgreSQL behaves for concurrent inserts into a unique index.
//! Counting a team's members locks the team until the transaction ends, like
//! `SELECT ... FOR UPDATE` on the team row.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::domain::participant::{NewParticipant, Participant, ParticipantId, ParticipantRepository};
use crate::domain::reference::{
    Category, CategoryId, Institution, InstitutionId, ReferenceRepository,
};
use crate::domain::storage::{RegistrationStore, RegistrationTransaction, UniqueConstraint};
use crate::domain::team::{NewTeam, Team, TeamId};
use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum UniqueKey {
    Email(String),
    Telegram(String),
    Team(String, CategoryId),
}

impl UniqueKey {
    fn constraint(&self) -> UniqueConstraint {
        match self {
            Self::Email(_) => UniqueConstraint::ParticipantEmail,
            Self::Telegram(_) => UniqueConstraint::ParticipantTelegram,
            Self::Team(..) => UniqueConstraint::TeamNameCategory,
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    institutions: BTreeMap<InstitutionId, Institution>,
    teams: Vec<Team>,
    participants: Vec<Participant>,
    /// Unique keys written by in-flight transactions, by transaction id
    reservations: HashMap<UniqueKey, u64>,
    /// Teams locked by in-flight transactions, by transaction id
    team_locks: HashMap<TeamId, u64>,
    last_transaction_id: u64,
    last_team_id: i64,
    last_participant_id: i64,
}

impl Tables {
    fn is_committed(&self, key: &UniqueKey) -> bool {
        match key {
            UniqueKey::Email(email) => self.participants.iter().any(|p| p.email() == email),
            UniqueKey::Telegram(handle) => self.participants.iter().any(|p| p.telegram() == handle),
            UniqueKey::Team(name, category_id) => {
                self.teams.iter().any(|t| t.matches(name, *category_id))
            }
        }
    }

    fn release(&mut self, transaction_id: u64) {
        self.reservations.retain(|_, owner| *owner != transaction_id);
        self.team_locks.retain(|_, owner| *owner != transaction_id);
    }
}

#[derive(Debug, Default)]
struct Shared {
    tables: RwLock<Tables>,
    /// Signalled whenever a transaction ends and frees its reservations
    released: Notify,
}

impl Shared {
    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

/// Thread-safe in-memory registration store
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Shared>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category, returning the existing one if the name is taken
    pub fn add_category(&self, name: impl Into<String>) -> Result<Category, DomainError> {
        let name = name.into();
        let mut tables = self.shared.write()?;

        if let Some(existing) = tables.categories.values().find(|c| c.name == name) {
            return Ok(existing.clone());
        }

        let id = CategoryId::new(tables.categories.len() as i64 + 1);
        let category = Category { id, name };
        tables.categories.insert(id, category.clone());

        Ok(category)
    }

    /// Add an institution, returning the existing one if the name is taken
    pub fn add_institution(
        &self,
        name: impl Into<String>,
        city: Option<String>,
    ) -> Result<Institution, DomainError> {
        let name = name.into();
        let mut tables = self.shared.write()?;

        if let Some(existing) = tables.institutions.values().find(|i| i.name == name) {
            return Ok(existing.clone());
        }

        let id = InstitutionId::new(tables.institutions.len() as i64 + 1);
        let institution = Institution { id, name, city };
        tables.institutions.insert(id, institution.clone());

        Ok(institution)
    }

    /// Committed teams in insertion order
    pub fn teams(&self) -> Result<Vec<Team>, DomainError> {
        Ok(self.shared.read()?.teams.clone())
    }

    /// Committed participants in insertion order
    pub fn participants(&self) -> Result<Vec<Participant>, DomainError> {
        Ok(self.shared.read()?.participants.clone())
    }
}

#[async_trait]
impl ReferenceRepository for InMemoryStore {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, DomainError> {
        Ok(self.shared.read()?.categories.contains_key(&id))
    }

    async fn institution_exists(&self, id: InstitutionId) -> Result<bool, DomainError> {
        Ok(self.shared.read()?.institutions.contains_key(&id))
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryStore {
    async fn find_by_email_or_handle(
        &self,
        email: &str,
        telegram: &str,
    ) -> Result<Option<Participant>, DomainError> {
        let tables = self.shared.read()?;

        let found = tables
            .participants
            .iter()
            .find(|p| p.email() == email)
            .or_else(|| tables.participants.iter().find(|p| p.telegram() == telegram));

        Ok(found.cloned())
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn RegistrationTransaction>, DomainError> {
        let id = {
            let mut tables = self.shared.write()?;
            tables.last_transaction_id += 1;
            tables.last_transaction_id
        };

        Ok(Box::new(InMemoryTransaction {
            id,
            shared: Arc::clone(&self.shared),
            teams: Vec::new(),
            participants: Vec::new(),
            finished: false,
        }))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.shared.read().map(|_| ())
    }
}

enum Reservation {
    Acquired,
    Blocked,
}

/// Transaction over [`InMemoryStore`]; dropping it without commit rolls back
#[derive(Debug)]
pub struct InMemoryTransaction {
    id: u64,
    shared: Arc<Shared>,
    teams: Vec<Team>,
    participants: Vec<Participant>,
    finished: bool,
}

impl InMemoryTransaction {
    fn try_reserve(&self, keys: &[UniqueKey]) -> Result<Reservation, DomainError> {
        let mut tables = self.shared.write()?;

        for key in keys {
            if tables.is_committed(key) {
                return Err(DomainError::unique_violation(key.constraint()));
            }
            match tables.reservations.get(key) {
                Some(owner) if *owner == self.id => {
                    return Err(DomainError::unique_violation(key.constraint()));
                }
                Some(_) => return Ok(Reservation::Blocked),
                None => {}
            }
        }

        for key in keys {
            tables.reservations.insert(key.clone(), self.id);
        }

        Ok(Reservation::Acquired)
    }

    /// Reserve every key, waiting on transactions that hold any of them
    async fn reserve(&self, keys: &[UniqueKey]) -> Result<(), DomainError> {
        let shared = Arc::clone(&self.shared);

        loop {
            // Created before the check so a release in between is not missed
            let released = shared.released.notified();

            match self.try_reserve(keys)? {
                Reservation::Acquired => return Ok(()),
                Reservation::Blocked => released.await,
            }
        }
    }

    fn try_lock_team(&self, team_id: TeamId) -> Result<Reservation, DomainError> {
        let mut tables = self.shared.write()?;

        match tables.team_locks.get(&team_id) {
            Some(owner) if *owner != self.id => Ok(Reservation::Blocked),
            _ => {
                tables.team_locks.insert(team_id, self.id);
                Ok(Reservation::Acquired)
            }
        }
    }

    /// Hold the team until this transaction ends; re-entrant
    async fn lock_team(&self, team_id: TeamId) -> Result<(), DomainError> {
        let shared = Arc::clone(&self.shared);

        loop {
            let released = shared.released.notified();

            match self.try_lock_team(team_id)? {
                Reservation::Acquired => return Ok(()),
                Reservation::Blocked => released.await,
            }
        }
    }

    fn release(&mut self) {
        self.finished = true;

        if let Ok(mut tables) = self.shared.tables.write() {
            tables.release(self.id);
        }
        self.shared.released.notify_waiters();
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            self.release();
        }
    }
}

#[async_trait]
impl RegistrationTransaction for InMemoryTransaction {
    async fn find_team(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<Option<Team>, DomainError> {
        if let Some(team) = self.teams.iter().find(|t| t.matches(name, category_id)) {
            return Ok(Some(team.clone()));
        }

        let tables = self.shared.read()?;
        Ok(tables
            .teams
            .iter()
            .find(|t| t.matches(name, category_id))
            .cloned())
    }

    async fn team_exists_in_other_category(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<bool, DomainError> {
        let in_other = |team: &Team| team.name() == name && team.category_id() != category_id;

        if self.teams.iter().any(in_other) {
            return Ok(true);
        }

        Ok(self.shared.read()?.teams.iter().any(in_other))
    }

    async fn count_team_members(&mut self, team_id: TeamId) -> Result<usize, DomainError> {
        self.lock_team(team_id).await?;

        let staged = self
            .participants
            .iter()
            .filter(|p| p.team_id() == Some(team_id))
            .count();

        let committed = self
            .shared
            .read()?
            .participants
            .iter()
            .filter(|p| p.team_id() == Some(team_id))
            .count();

        Ok(staged + committed)
    }

    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError> {
        self.reserve(&[UniqueKey::Team(team.name.clone(), team.category_id)])
            .await?;

        let id = {
            let mut tables = self.shared.write()?;
            tables.last_team_id += 1;
            TeamId::new(tables.last_team_id)
        };

        let team = Team::from_new(id, team, Utc::now());
        self.teams.push(team.clone());

        Ok(team)
    }

    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<Participant, DomainError> {
        self.reserve(&[
            UniqueKey::Email(participant.email.clone()),
            UniqueKey::Telegram(participant.telegram.clone()),
        ])
        .await?;

        let id = {
            let mut tables = self.shared.write()?;
            tables.last_participant_id += 1;
            ParticipantId::new(tables.last_participant_id)
        };

        let participant = participant.into_participant(id, Utc::now());
        self.participants.push(participant.clone());

        Ok(participant)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = self;
        let teams = std::mem::take(&mut this.teams);
        let participants = std::mem::take(&mut this.participants);

        {
            let mut tables = this.shared.write()?;
            tables.teams.extend(teams);
            tables.participants.extend(participants);
            tables.release(this.id);
        }

        this.finished = true;
        this.shared.released.notify_waiters();

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let mut this = self;
        this.release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::participant::ParticipationFormat;

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
    }

    #[tokio::test]
    async fn test_reference_lookups() {
        let store = InMemoryStore::new();
        let category = store.add_category("AI").unwrap();
        let again = store.add_category("AI").unwrap();
        let institution = store.add_institution("KPI", Some("Kyiv".into())).unwrap();

        assert_eq!(category, again);
        assert!(store.category_exists(category.id).await.unwrap());
        assert!(!store.category_exists(CategoryId::new(99)).await.unwrap());
        assert!(store.institution_exists(institution.id).await.unwrap());
        assert!(!store.institution_exists(InstitutionId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn test_writes_visible_only_after_commit() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let team = tx
            .insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .unwrap();
        tx.insert_participant(participant("a@example.com", "@a").with_team(team.id(), true))
            .await
            .unwrap();

        assert!(tx.find_team("Alpha", CategoryId::new(1)).await.unwrap().is_some());
        assert_eq!(tx.count_team_members(team.id()).await.unwrap(), 1);
        assert!(store.teams().unwrap().is_empty());
        assert!(store
            .find_by_email_or_handle("a@example.com", "@a")
            .await
            .unwrap()
            .is_none());

        tx.commit().await.unwrap();

        assert_eq!(store.teams().unwrap().len(), 1);
        assert_eq!(store.participants().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
                .await
                .unwrap();
        }

        assert!(store.teams().unwrap().is_empty());

        // The key is free again
        let mut tx = store.begin().await.unwrap();
        tx.insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.teams().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_committed_duplicates_are_unique_violations() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_participant(participant("a@example.com", "@a"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_participant(participant("b@example.com", "@a"))
            .await
            .unwrap_err();
        assert_eq!(
            err.violated_constraint(),
            Some(UniqueConstraint::ParticipantTelegram)
        );

        let err = tx
            .insert_participant(participant("a@example.com", "@b"))
            .await
            .unwrap_err();
        assert_eq!(err.violated_constraint(), Some(UniqueConstraint::ParticipantEmail));
    }

    #[tokio::test]
    async fn test_same_team_name_allowed_across_categories() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .unwrap();
        tx.insert_team(NewTeam::new("Alpha", CategoryId::new(2)))
            .await
            .unwrap();
        assert!(tx
            .team_exists_in_other_category("Alpha", CategoryId::new(1))
            .await
            .unwrap());
        tx.commit().await.unwrap();

        assert_eq!(store.teams().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_email_match_reported_before_handle_match() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert_participant(participant("first@example.com", "@first"))
            .await
            .unwrap();
        tx.insert_participant(participant("second@example.com", "@second"))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let found = store
            .find_by_email_or_handle("second@example.com", "@first")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email(), "second@example.com");
    }

    #[tokio::test]
    async fn test_concurrent_insert_waits_then_fails_after_commit() {
        let store = InMemoryStore::new();

        let mut first = store.begin().await.unwrap();
        first
            .insert_team(NewTeam::new("RaceTeam", CategoryId::new(1)))
            .await
            .unwrap();

        let contender = store.clone();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await.unwrap();
            second
                .insert_team(NewTeam::new("RaceTeam", CategoryId::new(1)))
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        first.commit().await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.violated_constraint(), Some(UniqueConstraint::TeamNameCategory));
    }

    #[tokio::test]
    async fn test_concurrent_insert_proceeds_after_rollback() {
        let store = InMemoryStore::new();

        let mut first = store.begin().await.unwrap();
        first
            .insert_team(NewTeam::new("RaceTeam", CategoryId::new(1)))
            .await
            .unwrap();

        let contender = store.clone();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await.unwrap();
            let team = second
                .insert_team(NewTeam::new("RaceTeam", CategoryId::new(1)))
                .await?;
            second.commit().await?;
            Ok::<_, DomainError>(team)
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        first.rollback().await.unwrap();

        let team = handle.await.unwrap().unwrap();
        assert_eq!(team.name(), "RaceTeam");
        assert_eq!(store.teams().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_count_waits_for_other_joiner() {
        let store = InMemoryStore::new();

        let mut setup = store.begin().await.unwrap();
        let team = setup
            .insert_team(NewTeam::new("Alpha", CategoryId::new(1)))
            .await
            .unwrap();
        setup.commit().await.unwrap();

        let mut first = store.begin().await.unwrap();
        assert_eq!(first.count_team_members(team.id()).await.unwrap(), 0);
        // Re-entrant for the holder
        assert_eq!(first.count_team_members(team.id()).await.unwrap(), 0);

        let contender = store.clone();
        let team_id = team.id();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await.unwrap();
            second.count_team_members(team_id).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        first
            .insert_participant(participant("a@example.com", "@a").with_team(team.id(), false))
            .await
            .unwrap();
        first.commit().await.unwrap();

        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }
}
