//! Storage infrastructure - Registration store implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{MemorySeed, StorageConfig, StorageFactory, StorageType, Stores};
pub use in_memory::{InMemoryStore, InMemoryTransaction};
pub use migrations::{
    revert_registration_migrations, run_registration_migrations, Migration, PostgresMigrator,
};
pub use postgres::{PostgresConfig, PostgresRegistrationTransaction, PostgresStore};
