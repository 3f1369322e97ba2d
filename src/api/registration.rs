//! `POST /form/` handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use super::state::AppState;
use super::types::{ApiError, Json, RegistrationResponse};
use crate::domain::registration::{Outcome, Submission};

/// Register a participant from the submitted form
pub async fn submit_form(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Response {
    match state.registration.register(submission).await {
        Outcome::Registered(registration) => {
            Json(RegistrationResponse::from(registration)).into_response()
        }
        Outcome::Rejected(rejection) => ApiError::from(rejection).into_response(),
    }
}
