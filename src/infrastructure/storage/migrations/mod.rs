//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::domain::storage::UniqueConstraint;
use crate::domain::DomainError;

/// Applies versioned schema migrations to PostgreSQL
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                success BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Runs a single migration; returns false when it was already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            debug!(version = migration.version, "Migration already applied");
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        info!(
            version = migration.version,
            description = %migration.description,
            "Migration applied"
        );

        Ok(true)
    }

    /// Reverts a single migration
    pub async fn revert_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        self.ensure_migrations_table().await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin revert: {}", e)))?;

        sqlx::raw_sql(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit revert: {}", e)))?;

        info!(version = migration.version, "Migration reverted");

        Ok(())
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM _migrations WHERE success = TRUE")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to get migration version: {}", e))
                })?;

        Ok(version)
    }
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Schema of the registration store
pub fn registration_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create categories table",
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                CONSTRAINT uq_categories_name UNIQUE (name)
            );
            "#,
            "DROP TABLE IF EXISTS categories;",
        ),
        Migration::new(
            2,
            "Create universities table",
            r#"
            CREATE TABLE IF NOT EXISTS universities (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                city VARCHAR(255),
                CONSTRAINT uq_universities_name UNIQUE (name)
            );
            "#,
            "DROP TABLE IF EXISTS universities;",
        ),
        Migration::new(
            3,
            "Create teams table",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS teams (
                    id BIGSERIAL PRIMARY KEY,
                    team_name VARCHAR(100) NOT NULL,
                    category_id BIGINT NOT NULL REFERENCES categories(id),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    CONSTRAINT {} UNIQUE (team_name, category_id)
                );
                CREATE INDEX IF NOT EXISTS ix_teams_team_name ON teams(team_name);
                CREATE INDEX IF NOT EXISTS ix_teams_category_id ON teams(category_id);
                "#,
                UniqueConstraint::TEAM_NAME_CATEGORY
            ),
            "DROP TABLE IF EXISTS teams;",
        ),
        Migration::new(
            4,
            "Create participants table",
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS participants (
                    id BIGSERIAL PRIMARY KEY,
                    full_name VARCHAR(100) NOT NULL,
                    email VARCHAR(100) NOT NULL,
                    telegram VARCHAR(100) NOT NULL,
                    phone VARCHAR(100) NOT NULL,
                    is_student BOOLEAN NOT NULL,
                    study_year INTEGER CHECK (study_year BETWEEN 1 AND 7),
                    university_id BIGINT REFERENCES universities(id),
                    category_id BIGINT NOT NULL REFERENCES categories(id),
                    participation_format VARCHAR(16) NOT NULL,
                    team_id BIGINT REFERENCES teams(id) ON DELETE SET NULL,
                    team_leader BOOLEAN NOT NULL DEFAULT FALSE,
                    wants_job BOOLEAN NOT NULL DEFAULT FALSE,
                    job_description TEXT,
                    cv_url VARCHAR(100),
                    linkedin VARCHAR(100),
                    work_consent BOOLEAN NOT NULL DEFAULT FALSE,
                    source VARCHAR(100) NOT NULL,
                    comment TEXT,
                    personal_data_consent BOOLEAN NOT NULL,
                    skills_text TEXT NOT NULL DEFAULT '',
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    CONSTRAINT {} UNIQUE (email),
                    CONSTRAINT {} UNIQUE (telegram)
                );
                CREATE INDEX IF NOT EXISTS ix_participants_full_name ON participants(full_name);
                CREATE INDEX IF NOT EXISTS ix_participants_team_id ON participants(team_id);
                "#,
                UniqueConstraint::PARTICIPANT_EMAIL,
                UniqueConstraint::PARTICIPANT_TELEGRAM
            ),
            "DROP TABLE IF EXISTS participants;",
        ),
    ]
}

/// Runs all pending registration migrations, returning how many were applied
pub async fn run_registration_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in registration_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}

/// Reverts up to `steps` applied migrations, newest first
pub async fn revert_registration_migrations(
    pool: &PgPool,
    steps: usize,
) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let migrations = registration_migrations();
    let mut reverted = 0;

    while reverted < steps {
        let Some(version) = migrator.current_version().await? else {
            break;
        };
        let Some(migration) = migrations.iter().find(|m| m.version == version) else {
            return Err(DomainError::storage(format!(
                "Applied migration {} is unknown to this build",
                version
            )));
        };

        migrator.revert_migration(migration).await?;
        reverted += 1;
    }

    Ok(reverted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "Test migration", "CREATE TABLE test", "DROP TABLE test");

        assert_eq!(migration.version, 1);
        assert_eq!(migration.description, "Test migration");
        assert_eq!(migration.up, "CREATE TABLE test");
        assert_eq!(migration.down, "DROP TABLE test");
    }

    #[test]
    fn test_registration_migrations_order() {
        let migrations = registration_migrations();

        assert_eq!(migrations.len(), 4);
        for pair in migrations.windows(2) {
            assert!(
                pair[1].version > pair[0].version,
                "Migrations should be in ascending order"
            );
        }
    }

    #[test]
    fn test_schema_declares_engine_constraints() {
        let schema: String = registration_migrations()
            .into_iter()
            .map(|migration| migration.up)
            .collect();

        assert!(schema.contains("CONSTRAINT uix_team_name_category UNIQUE (team_name, category_id)"));
        assert!(schema.contains("CONSTRAINT uq_participants_email UNIQUE (email)"));
        assert!(schema.contains("CONSTRAINT uq_participants_telegram UNIQUE (telegram)"));
        assert!(schema.contains("REFERENCES teams(id) ON DELETE SET NULL"));
    }

    #[test]
    fn test_migrations_have_down_scripts() {
        for migration in registration_migrations() {
            assert!(!migration.description.is_empty());
            assert!(migration.down.starts_with("DROP TABLE"));
        }
    }
}
