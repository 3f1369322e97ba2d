//! Application configuration loaded from files and environment

mod app_config;

pub use app_config::{
    AppConfig, LogFormat, LoggingConfig, SeedSettings, ServerConfig, StorageSettings,
};
