//! Gatekeeper Error Types
//!
//! Errors on the gating path never reach clients (the gatekeeper fails
//! open); only the analytics endpoint turns them into responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use platform::store::StoreError;
use thiserror::Error;

/// Gatekeeper result type alias
pub type GatekeeperResult<T> = Result<T, GatekeeperError>;

#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Counter store call failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Rate limit task panicked or was cancelled
    #[error("Rate limit check aborted: {0}")]
    Aborted(String),

    /// Analytics could not be read
    #[error("Analytics temporarily unavailable")]
    AnalyticsUnavailable(#[source] StoreError),
}

impl GatekeeperError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatekeeperError::AnalyticsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatekeeperError::Store(_) | GatekeeperError::Aborted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GatekeeperError::AnalyticsUnavailable(e) => {
                tracing::warn!(error = %e, "Analytics query failed");
            }
            GatekeeperError::Store(e) => {
                tracing::error!(error = %e, "Gatekeeper store error");
            }
            GatekeeperError::Aborted(msg) => {
                tracing::error!(message = %msg, "Gatekeeper task aborted");
            }
        }
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        match self {
            GatekeeperError::AnalyticsUnavailable(_) => {
                let body = serde_json::json!({
                    "error": "Analytics temporarily unavailable",
                    "status": "error",
                });
                (status, Json(body)).into_response()
            }
            // Store details stay in the logs
            GatekeeperError::Store(_) | GatekeeperError::Aborted(_) => (status, ()).into_response(),
        }
    }
}
