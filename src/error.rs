use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use stockpredict::{
    error::{ErrorKind, StockError},
    models::ErrorResponse,
};
use tracing::{debug, error, warn};

pub const HISTORY_NOT_FOUND: &str = "Stock data not found";
pub const HISTORY_FAILED: &str = "Failed to fetch stock history";
pub const PREDICTION_FAILED: &str = "Local prediction failed";

/// Error returned by route handlers, rendered as `{"error": .., "details": ..}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn internal(message: &str) -> Self {
        Self::Internal {
            message: message.to_string(),
            details: None,
        }
    }

    /// History route: internal failures carry no details.
    pub fn history(err: StockError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::BadRequest(validation_message(err)),
            ErrorKind::NotFound => Self::NotFound(HISTORY_NOT_FOUND.to_string()),
            _ => {
                error!(error = %err, "History read failed");
                Self::internal(HISTORY_FAILED)
            }
        }
    }

    /// Predict route: internal failures carry the underlying diagnostic,
    /// including raw predictor output for parse errors.
    pub fn prediction(err: StockError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::BadRequest(validation_message(err)),
            ErrorKind::NotFound => Self::NotFound(HISTORY_NOT_FOUND.to_string()),
            _ => {
                error!(error = %err, "Prediction failed");
                if let Some(raw) = err.raw_output() {
                    debug!(raw, "Predictor output");
                }
                Self::Internal {
                    message: PREDICTION_FAILED.to_string(),
                    details: Some(err.to_string()),
                }
            }
        }
    }

    /// Listing routes (`/stocks`, `/companies`)
    pub fn listing(err: StockError, message: &str) -> Self {
        error!(error = %err, message, "Listing failed");
        Self::internal(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn validation_message(err: StockError) -> String {
    match err {
        StockError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            warn!(status = status.as_u16(), error = %self, "Rejected request");
        }

        let body = match self {
            ApiError::BadRequest(error) | ApiError::NotFound(error) => ErrorResponse {
                error,
                details: None,
            },
            ApiError::Internal { message, details } => ErrorResponse {
                error: message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
