//! Team domain module
//!
//! A team is scoped to one category and is created lazily by the first
//! participant who registers as its leader. Everyone after that joins.

mod entity;
mod policy;

pub use entity::{NewTeam, Team, TeamId};
pub use policy::TeamPolicy;
