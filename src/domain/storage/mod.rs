//! Storage domain - transactional persistence contracts

mod constraint;
mod transaction;

pub use constraint::UniqueConstraint;
pub use transaction::{RegistrationStore, RegistrationTransaction};
