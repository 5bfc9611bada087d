use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use crate::service::WalletError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid address format")]
    InvalidAddress,

    #[error("Upstream rate limit exceeded")]
    RateLimited,

    #[error("Failed to fetch wallet data")]
    Upstream,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::InvalidAddress => (StatusCode::BAD_REQUEST, "Invalid blockchain address format".to_string()),
            ApiError::RateLimited => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::Upstream => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnrecognizedAddress(_) => ApiError::InvalidAddress,
            ValidationError::MissingParameter(param) =>
                ApiError::BadRequest(format!("Missing parameter: {}", param)),
        }
    }
}

// Top-level failures surface a generic message; details stay in the logs
impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        if err.is_rate_limited() {
            return ApiError::RateLimited;
        }
        match err {
            WalletError::InvalidAddress(err) => err.into(),
            WalletError::WalletFetchFailed { .. } => ApiError::Upstream,
        }
    }
}
