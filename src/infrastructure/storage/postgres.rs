//! PostgreSQL registration store with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::domain::participant::{
    NewParticipant, Participant, ParticipantId, ParticipantRepository, ParticipationFormat,
    StudyYear,
};
use crate::domain::reference::{CategoryId, InstitutionId, ReferenceRepository};
use crate::domain::storage::{RegistrationStore, RegistrationTransaction, UniqueConstraint};
use crate::domain::team::{NewTeam, Team, TeamId};
use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/registration".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

const PARTICIPANT_COLUMNS: &str = r#"
    id, full_name, email, telegram, phone, is_student, study_year, university_id,
    category_id, participation_format, team_id, team_leader, wants_job, job_description,
    cv_url, linkedin, work_consent, source, comment, personal_data_consent, skills_text,
    created_at
"#;

/// Registration store backed by a PostgreSQL pool.
///
/// Uniqueness is enforced by the schema created in
/// [`migrations`](super::migrations); this type only translates violations
/// into [`DomainError::UniqueViolation`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new store with connection pooling
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReferenceRepository for PostgresStore {
    async fn category_exists(&self, id: CategoryId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up category: {}", e)))
    }

    async fn institution_exists(&self, id: InstitutionId) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM universities WHERE id = $1)")
            .bind(id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up university: {}", e)))
    }
}

#[async_trait]
impl ParticipantRepository for PostgresStore {
    async fn find_by_email_or_handle(
        &self,
        email: &str,
        telegram: &str,
    ) -> Result<Option<Participant>, DomainError> {
        // Email matches sort first so they are reported before handle matches
        let query = format!(
            r#"
            SELECT {}
            FROM participants
            WHERE email = $1 OR telegram = $2
            ORDER BY (email = $1) DESC, id
            LIMIT 1
            "#,
            PARTICIPANT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(email)
            .bind(telegram)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to look up participant: {}", e)))?;

        row.as_ref().map(row_to_participant).transpose()
    }
}

#[async_trait]
impl RegistrationStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn RegistrationTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresRegistrationTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Database is unreachable: {}", e)))?;

        Ok(())
    }
}

/// One registration transaction; dropping it without commit rolls back
pub struct PostgresRegistrationTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RegistrationTransaction for PostgresRegistrationTransaction {
    async fn find_team(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<Option<Team>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, team_name, category_id, created_at
            FROM teams
            WHERE team_name = $1 AND category_id = $2
            "#,
        )
        .bind(name)
        .bind(category_id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up team: {}", e)))?;

        Ok(row.as_ref().map(row_to_team))
    }

    async fn team_exists_in_other_category(
        &mut self,
        name: &str,
        category_id: CategoryId,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = $1 AND category_id <> $2)",
        )
        .bind(name)
        .bind(category_id.value())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up team: {}", e)))
    }

    async fn count_team_members(&mut self, team_id: TeamId) -> Result<usize, DomainError> {
        // Concurrent joiners of the same team queue here until this transaction ends
        sqlx::query("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
            .bind(team_id.value())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to lock team: {}", e)))?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants WHERE team_id = $1")
            .bind(team_id.value())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count team members: {}", e)))?;

        Ok(count.max(0) as usize)
    }

    async fn insert_team(&mut self, team: NewTeam) -> Result<Team, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO teams (team_name, category_id)
            VALUES ($1, $2)
            RETURNING id, created_at
            "#,
        )
        .bind(&team.name)
        .bind(team.category_id.value())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error("Failed to insert team", e))?;

        let id: i64 = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(Team::from_new(TeamId::new(id), team, created_at))
    }

    async fn insert_participant(
        &mut self,
        participant: NewParticipant,
    ) -> Result<Participant, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO participants (
                full_name, email, telegram, phone, is_student, study_year, university_id,
                category_id, participation_format, team_id, team_leader, wants_job,
                job_description, cv_url, linkedin, work_consent, source, comment,
                personal_data_consent, skills_text
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20)
            RETURNING id, created_at
            "#,
        )
        .bind(&participant.full_name)
        .bind(&participant.email)
        .bind(&participant.telegram)
        .bind(&participant.phone)
        .bind(participant.is_student)
        .bind(participant.study_year.map(|year| i32::from(year.value())))
        .bind(participant.university_id.map(|id| id.value()))
        .bind(participant.category_id.value())
        .bind(participant.participation_format.as_str())
        .bind(participant.team_id.map(|id| id.value()))
        .bind(participant.team_leader)
        .bind(participant.wants_job)
        .bind(&participant.job_description)
        .bind(&participant.cv_url)
        .bind(&participant.linkedin)
        .bind(participant.work_consent)
        .bind(&participant.source)
        .bind(&participant.comment)
        .bind(participant.personal_data_consent)
        .bind(&participant.skills_text)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_write_error("Failed to insert participant", e))?;

        let id: i64 = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        Ok(participant.into_participant(ParticipantId::new(id), created_at))
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_write_error("Failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to roll back transaction: {}", e)))
    }
}

/// Translate unique violations into their domain form, everything else into a storage error
fn map_write_error(context: &str, error: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            let constraint = db_error
                .constraint()
                .map(UniqueConstraint::from_name)
                .unwrap_or(UniqueConstraint::Other);
            return DomainError::unique_violation(constraint);
        }
    }

    DomainError::storage(format!("{}: {}", context, error))
}

fn row_to_team(row: &PgRow) -> Team {
    let id: i64 = row.get("id");
    let name: String = row.get("team_name");
    let category_id: i64 = row.get("category_id");
    let created_at: DateTime<Utc> = row.get("created_at");

    Team::new(TeamId::new(id), name, CategoryId::new(category_id), created_at)
}

fn row_to_participant(row: &PgRow) -> Result<Participant, DomainError> {
    let id: i64 = row.get("id");
    let study_year: Option<i32> = row.get("study_year");
    let university_id: Option<i64> = row.get("university_id");
    let category_id: i64 = row.get("category_id");
    let format: String = row.get("participation_format");
    let team_id: Option<i64> = row.get("team_id");
    let created_at: DateTime<Utc> = row.get("created_at");

    let study_year = study_year
        .map(|year| {
            StudyYear::new(i64::from(year)).ok_or_else(|| {
                DomainError::storage(format!("Invalid study year in database: {}", year))
            })
        })
        .transpose()?;

    let participation_format = ParticipationFormat::parse(&format).ok_or_else(|| {
        DomainError::storage(format!("Invalid participation format in database: {}", format))
    })?;

    let details = NewParticipant {
        full_name: row.get("full_name"),
        email: row.get("email"),
        telegram: row.get("telegram"),
        phone: row.get("phone"),
        is_student: row.get("is_student"),
        study_year,
        university_id: university_id.map(InstitutionId::new),
        category_id: CategoryId::new(category_id),
        participation_format,
        team_id: team_id.map(TeamId::new),
        team_leader: row.get("team_leader"),
        wants_job: row.get("wants_job"),
        job_description: row.get("job_description"),
        cv_url: row.get("cv_url"),
        linkedin: row.get("linkedin"),
        work_consent: row.get("work_consent"),
        source: row.get("source"),
        comment: row.get("comment"),
        personal_data_consent: row.get("personal_data_consent"),
        skills_text: row.get("skills_text"),
    };

    Ok(details.into_participant(ParticipantId::new(id), created_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_postgres_config_builder() {
        let config = PostgresConfig::new("postgres://localhost/test")
            .with_max_connections(20)
            .with_min_connections(5)
            .with_connect_timeout(60)
            .with_idle_timeout(300);

        assert_eq!(config.url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(config.idle_timeout_secs, 300);
    }

    #[test]
    fn test_non_database_errors_are_storage_errors() {
        let err = map_write_error("Failed to insert team", sqlx::Error::RowNotFound);

        assert!(err.violated_constraint().is_none());
        assert!(err.to_string().starts_with("Storage error: Failed to insert team"));
    }

    #[tokio::test]
    async fn test_lazy_pool_reports_unreachable_database() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let store = PostgresStore::new(pool);

        let err = store.ping().await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
    }
}
