//! Existence checks for referenced category and institution

use std::sync::Arc;

use tracing::warn;

use crate::domain::participant::NewParticipant;
use crate::domain::reference::ReferenceRepository;
use crate::domain::registration::{RegistrationError, SubmissionField};

/// Confirms that every reference in a participant record points at a real row
#[derive(Clone)]
pub struct ReferenceResolver {
    references: Arc<dyn ReferenceRepository>,
}

impl ReferenceResolver {
    pub fn new(references: Arc<dyn ReferenceRepository>) -> Self {
        Self { references }
    }

    /// Institution first (only when supplied), then category
    pub async fn resolve(&self, participant: &NewParticipant) -> Result<(), RegistrationError> {
        if let Some(institution_id) = participant.university_id {
            if !self.references.institution_exists(institution_id).await? {
                warn!(
                    university_id = %institution_id,
                    email = %participant.email,
                    "Registration rejected: university not found"
                );
                return Err(RegistrationError::ReferenceNotFound {
                    field: SubmissionField::UniversityId,
                });
            }
        }

        if !self.references.category_exists(participant.category_id).await? {
            warn!(
                category_id = %participant.category_id,
                email = %participant.email,
                "Registration rejected: category not found"
            );
            return Err(RegistrationError::ReferenceNotFound {
                field: SubmissionField::CategoryId,
            });
        }

        Ok(())
    }
}
