//! Domain layer - Core business logic and entities

pub mod error;
pub mod participant;
pub mod reference;
pub mod registration;
pub mod storage;
pub mod team;

pub use error::DomainError;
pub use participant::{NewParticipant, Participant, ParticipantId, ParticipationFormat, StudyYear};
pub use reference::{Category, CategoryId, Institution, InstitutionId, ReferenceRepository};
pub use registration::{
    Outcome, Registration, RegistrationError, RegistrationStatus, Rejection, Submission,
};
pub use storage::{RegistrationStore, RegistrationTransaction, UniqueConstraint};
pub use team::{NewTeam, Team, TeamId, TeamPolicy};
