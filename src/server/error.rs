use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::models::ClickerError;

impl ClickerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClickerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ClickerError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ClickerError::UsernameTaken(_) => StatusCode::CONFLICT,
            ClickerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ClickerError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ClickerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ClickerError::Upload(_) => StatusCode::BAD_REQUEST,
            ClickerError::DatabaseError(_)
            | ClickerError::IoError(_)
            | ClickerError::SerializationError(_)
            | ClickerError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClickerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
