//! Participant domain module

mod entity;
mod repository;

pub use entity::{NewParticipant, Participant, ParticipantId, ParticipationFormat, StudyYear};
pub use repository::ParticipantRepository;

#[cfg(test)]
pub use repository::MockParticipantRepository;
