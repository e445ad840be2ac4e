use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use portal_core::ShortenerError;
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    InvalidUrl(String),
    NotFound(String),
    Shortener(ShortenerError),
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self::Shortener(value)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Shortener(e) => match e {
                ShortenerError::InvalidUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ShortenerError::InvalidShortCode(_) => StatusCode::NOT_FOUND,
                ShortenerError::HashCollision { .. } => StatusCode::CONFLICT,
                ShortenerError::Counter(_) | ShortenerError::Storage(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::InvalidUrl(message) | AppError::NotFound(message) => message,
            AppError::Shortener(e) => {
                if status.is_server_error() {
                    error!(error = %e, "store failure");
                    "service temporarily unavailable".to_string()
                } else {
                    warn!(error = %e, "request rejected");
                    e.to_string()
                }
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::{CacheError, StorageError};

    #[test]
    fn shortener_errors_map_to_statuses() {
        let cases = [
            (
                ShortenerError::InvalidUrl("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ShortenerError::InvalidShortCode("x".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                ShortenerError::HashCollision {
                    code: "abc".into(),
                    existing_url: "https://example.com".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                ShortenerError::Counter(CacheError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ShortenerError::Storage(StorageError::Timeout("slow".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }
}
