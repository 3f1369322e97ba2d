//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::participant::ParticipantRepository;
use crate::domain::reference::ReferenceRepository;
use crate::domain::storage::RegistrationStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryStore;
use super::postgres::{PostgresConfig, PostgresStore};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Reference data preloaded into the in-memory backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySeed {
    pub categories: Vec<String>,
    pub institutions: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory(MemorySeed),
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an empty in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory(MemorySeed::default())
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory(_) => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Every collaborator the registration engine needs, backed by one store
#[derive(Clone)]
pub struct Stores {
    pub references: Arc<dyn ReferenceRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub registrations: Arc<dyn RegistrationStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    /// Share a single backend across all collaborator roles
    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: ReferenceRepository + ParticipantRepository + RegistrationStore + 'static,
    {
        Self {
            references: store.clone(),
            participants: store.clone(),
            registrations: store,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the stores for the configured backend
    pub async fn create(config: &StorageConfig) -> Result<Stores, DomainError> {
        match config {
            StorageConfig::InMemory(seed) => {
                let store = Self::create_in_memory(seed)?;
                Ok(Stores::from_backend(store))
            }
            StorageConfig::Postgres(pg_config) => {
                let store = Self::create_postgres(pg_config).await?;
                Ok(Stores::from_backend(store))
            }
        }
    }

    /// Creates an in-memory store preloaded with reference data
    pub fn create_in_memory(seed: &MemorySeed) -> Result<Arc<InMemoryStore>, DomainError> {
        let store = InMemoryStore::new();

        for name in &seed.categories {
            store.add_category(name.as_str())?;
        }
        for name in &seed.institutions {
            store.add_institution(name.as_str(), None)?;
        }

        info!(
            categories = seed.categories.len(),
            institutions = seed.institutions.len(),
            "In-memory store initialized"
        );

        Ok(Arc::new(store))
    }

    /// Creates a PostgreSQL store
    pub async fn create_postgres(config: &PostgresConfig) -> Result<Arc<PostgresStore>, DomainError> {
        let store = PostgresStore::connect(config).await?;
        info!(max_connections = config.max_connections, "PostgreSQL pool created");
        Ok(Arc::new(store))
    }
}
