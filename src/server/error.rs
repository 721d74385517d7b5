use crate::model::{MalformedDataError, ProviderError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors returned to HTTP clients as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotFound(symbol) => ApiError::NotFound(format!("Symbol not found: {symbol}")),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<MalformedDataError> for ApiError {
    fn from(e: MalformedDataError) -> Self {
        ApiError::Upstream(format!("Malformed data from provider: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ Request failed [{}]: {}", status, self);
        } else {
            warn!("Rejected request [{}]: {}", status, self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_statuses() {
        let not_found: ApiError = ProviderError::NotFound("ZZZZ".into()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Symbol not found: ZZZZ");

        let upstream: ApiError = ProviderError::Api("rate limited".into()).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn malformed_data_is_a_gateway_error() {
        let err: ApiError = MalformedDataError::new(3, "missing field `volume`").into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("bar #3"));
    }
}
