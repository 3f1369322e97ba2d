use serde::Deserialize;

use crate::domain::team::TeamPolicy;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::{MemorySeed, PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    /// Team policy knobs under `registration`
    #[serde(default)]
    pub registration: TeamPolicy,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage section as written in config files and environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `postgres` or `memory`
    pub backend: String,
    /// Falls back to `DATABASE_URL`
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Apply pending migrations when the server starts
    pub auto_migrate: bool,
    /// Reference data loaded into the memory backend at startup
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedSettings {
    pub categories: Vec<String>,
    pub institutions: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let pool = PostgresConfig::default();

        Self {
            backend: "postgres".to_string(),
            url: None,
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_secs: pool.connect_timeout_secs,
            idle_timeout_secs: pool.idle_timeout_secs,
            auto_migrate: false,
            seed: SeedSettings::default(),
        }
    }
}

impl StorageSettings {
    /// Resolve the backend, reading `DATABASE_URL` when no url is configured
    pub fn to_storage_config(&self) -> Result<StorageConfig, config::ConfigError> {
        self.resolve(std::env::var("DATABASE_URL").ok())
    }

    fn resolve(&self, database_url: Option<String>) -> Result<StorageConfig, config::ConfigError> {
        let backend = StorageType::from_str(&self.backend).ok_or_else(|| {
            config::ConfigError::Message(format!("Unknown storage backend '{}'", self.backend))
        })?;

        match backend {
            StorageType::InMemory => Ok(StorageConfig::InMemory(MemorySeed {
                categories: self.seed.categories.clone(),
                institutions: self.seed.institutions.clone(),
            })),
            StorageType::Postgres => {
                let url = self
                    .url
                    .clone()
                    .or(database_url)
                    .unwrap_or_else(|| PostgresConfig::default().url);

                Ok(StorageConfig::Postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_connect_timeout(self.connect_timeout_secs)
                        .with_idle_timeout(self.idle_timeout_secs),
                ))
            }
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .with_list_parse_key("storage.seed.categories")
                    .with_list_parse_key("storage.seed.institutions")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
