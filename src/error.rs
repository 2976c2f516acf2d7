use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed caller input (bad option letter, empty student name).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A quiz cannot start from a question set with no questions.
    #[error("question set has no questions")]
    EmptyQuestionSet,

    /// Duplicate submission or an advance against a stale session.
    #[error("{0}")]
    Conflict(String),

    /// Unknown session or question set.
    #[error("resource not found")]
    NotFound,

    /// The durable store is degraded. Sessions keep serving from memory.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// An internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<deadpool_postgres::CreatePoolError> for AppError {
    fn from(e: deadpool_postgres::CreatePoolError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(ref msg) => {
                tracing::debug!("Invalid input: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::EmptyQuestionSet => {
                tracing::debug!("Rejected start of an empty question set");
                (
                    StatusCode::BAD_REQUEST,
                    "This question set is empty. Please add questions before starting the quiz."
                        .to_string(),
                )
            }

            AppError::Conflict(ref msg) => {
                tracing::debug!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::StoreUnavailable(ref msg) => {
                tracing::warn!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Durable store unavailable".to_string(),
                )
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
