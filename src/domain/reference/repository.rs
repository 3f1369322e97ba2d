//! Reference data repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{CategoryId, InstitutionId};
use crate::domain::DomainError;

/// Read-only existence checks against reference data
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Check whether a category with this ID exists
    async fn category_exists(&self, id: CategoryId) -> Result<bool, DomainError>;

    /// Check whether an institution with this ID exists
    async fn institution_exists(&self, id: InstitutionId) -> Result<bool, DomainError>;
}
