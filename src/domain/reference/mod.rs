//! Reference data domain module
//!
//! Categories and institutions are maintained outside the registration flow;
//! registration only needs to confirm that a referenced row exists.

mod entity;
mod repository;

pub use entity::{Category, CategoryId, Institution, InstitutionId};
pub use repository::ReferenceRepository;

#[cfg(test)]
pub use repository::MockReferenceRepository;
