//! Registration engine: the storage-facing stages of the pipeline and the
//! service that runs a submission through all of them

mod commit;
mod duplicate_guard;
mod reference_resolver;
mod service;
mod team_resolution;

pub use commit::commit_registration;
pub use duplicate_guard::DuplicateGuard;
pub use reference_resolver::ReferenceResolver;
pub use service::RegistrationService;
pub use team_resolution::{Resolution, ResolvedTeam, TeamResolver};
