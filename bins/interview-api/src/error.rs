use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use interview_core::ControllerError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Controller(e) if e.is_invalid_transition() => StatusCode::CONFLICT,
            ApiError::Controller(ControllerError::EmptySubmission | ControllerError::EmptyMessage) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Controller(ControllerError::Grading(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Controller(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
