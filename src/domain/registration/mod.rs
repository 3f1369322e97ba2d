//! Registration domain module
//!
//! Pure stages of the intake pipeline: a raw [`Submission`] is normalized,
//! then validated into a [`ValidatedSubmission`]. Everything that needs
//! storage lives in the infrastructure layer.

mod error;
mod normalize;
mod outcome;
mod submission;
mod validation;

pub use error::{FieldError, ReasonCode, RegistrationError, TeamPolicyReason};
pub use normalize::{
    join_skills, normalize, normalize_phone, normalize_skills, resolve_source, OTHER_SOURCES,
    SKILLS_SEPARATOR,
};
pub use outcome::{Outcome, Registration, RegistrationStatus, Rejection, RejectionKind};
pub use submission::{
    NormalizedSubmission, Submission, SubmissionField, TeamIntent, ValidatedSubmission,
};
pub use validation::validate;
