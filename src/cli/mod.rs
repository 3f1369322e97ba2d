//! CLI module for the registration service
//!
//! - `serve`: HTTP server
//! - `migrate`: create (or revert) the PostgreSQL schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Hackathon registration service
#[derive(Parser)]
#[command(name = "hackathon-registration")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Apply the database schema
    Migrate(migrate::MigrateArgs),
}
