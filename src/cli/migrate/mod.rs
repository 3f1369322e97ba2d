//! Migrate command - creates the schema the PostgreSQL backend relies on

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{
    revert_registration_migrations, run_registration_migrations, PostgresMigrator,
    StorageConfig, StorageFactory,
};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Revert this many of the most recent migrations instead of applying
    #[arg(long, value_name = "STEPS")]
    pub revert: Option<usize>,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let StorageConfig::Postgres(pg_config) = config.storage.to_storage_config()? else {
        anyhow::bail!("Migrations require the postgres storage backend");
    };

    let store = StorageFactory::create_postgres(&pg_config).await?;
    let pool = store.pool();

    match args.revert {
        Some(steps) => {
            let reverted = revert_registration_migrations(pool, steps).await?;
            info!(reverted, "Migrations reverted");
        }
        None => {
            let applied = run_registration_migrations(pool).await?;
            info!(applied, "Migrations applied");
        }
    }

    let version = PostgresMigrator::new(pool.clone()).current_version().await?;
    info!(version = ?version, "Schema version");

    Ok(())
}
