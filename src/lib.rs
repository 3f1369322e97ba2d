//! Hackathon registration service
//!
//! Accepts participant registrations and resolves each one into a solo entry
//! or membership in a team. The engine lives in
//! [`infrastructure::registration::RegistrationService`]; the HTTP layer and
//! CLI are thin wrappers around it.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{Outcome, Submission};
pub use infrastructure::registration::RegistrationService;
