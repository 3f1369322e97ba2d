//! Infrastructure layer - storage backends, the registration engine and
//! process-wide observability

pub mod logging;
pub mod observability;
pub mod registration;
pub mod storage;
