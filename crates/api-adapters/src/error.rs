use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use domains::DomainError;

/// A [`DomainError`] on its way out as an HTTP response.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub DomainError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::NotFound(..) => StatusCode::NOT_FOUND,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::InvalidReference(_) | DomainError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::Unauthenticated(_) | DomainError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::Conflict(_) => StatusCode::CONFLICT,
            DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            // Detail was logged where the fault happened.
            DomainError::Store(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
