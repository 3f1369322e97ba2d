//! Request and response bodies of the HTTP layer

pub mod error;
pub mod json;
pub mod registration;

pub use error::{ApiError, ApiErrorResponse, REJECTED_STATUS};
pub use json::Json;
pub use registration::RegistrationResponse;
