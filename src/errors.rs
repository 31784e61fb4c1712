use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use thiserror::Error;

use crate::external::market_provider::MarketDataError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),
    #[error("No news available: {0}")]
    NoNewsAvailable(String),
    #[error("Report generation failed: {0}")]
    GenerationFailed(String),
}

/// Errors raised by LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key not configured")]
    Disabled,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by LLM provider")]
    RateLimited,
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DataUnavailable(_) => StatusCode::NOT_FOUND,
            AppError::NoNewsAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<LlmError> for AppError {
    fn from(value: LlmError) -> Self {
        AppError::GenerationFailed(value.to_string())
    }
}

impl From<MarketDataError> for AppError {
    fn from(value: MarketDataError) -> Self {
        AppError::DataUnavailable(value.to_string())
    }
}
