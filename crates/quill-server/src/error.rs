//! Error-to-HTTP mapping.
//!
//! Every failure serialises as `{ "code": ..., "message": ... }`, with
//! extra structured fields where the flow defines them (lock expiry,
//! quota detail). Internal failures are logged server-side and leave
//! only a generic message in the response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quill_auth::error::{AuthError, ResolveError};
use serde_json::json;
use tracing::error;

pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn new(status: u16, code: &str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: json!({ "code": code, "message": message }),
        }
    }

    /// Authenticated but not allowed: permission flag checks.
    pub fn forbidden(message: &str) -> Self {
        Self::new(403, "FORBIDDEN", message.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = err.status();
        let code = err.code();

        if status >= 500 {
            error!(code, error = %err, "Request failed");
            let message = if code == "STORE_UNAVAILABLE" {
                "store temporarily unavailable, retry later".to_string()
            } else {
                "internal error".to_string()
            };
            return Self::new(status, code, message);
        }

        let mut api = Self::new(status, code, err.to_string());
        match &err {
            AuthError::AccountLocked { until } => {
                api.body["lockUntil"] = json!(until.to_rfc3339());
            }
            AuthError::NoteLimitReached(denial) => {
                api.body["currentCount"] = json!(denial.current_count);
                api.body["limit"] = json!(denial.limit);
                api.body["plan"] = json!(denial.plan);
            }
            _ => {}
        }
        api
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        let status = err.status();
        let code = err.code();
        if status >= 500 {
            error!(code, error = %err, "Authentication failed on infrastructure");
            return Self::new(status, code, "internal error".to_string());
        }
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
