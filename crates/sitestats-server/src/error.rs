//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sitestats_core::error::{ErrorCode, SiteStatsError};
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from sitestats-core errors; the body code is the core error code.
impl From<SiteStatsError> for ApiError {
    fn from(err: SiteStatsError) -> Self {
        let code = err.code().as_str();
        let suggestion = err.suggestion().map(str::to_string);

        let api = match err {
            SiteStatsError::DuplicateVersion {
                message,
                url,
                active_start_date,
                ..
            } => ApiError::conflict(message).with_details(serde_json::json!({
                "url": url,
                "active_start_date": active_start_date,
            })),
            SiteStatsError::NonCurrentEdit {
                message,
                version_id,
                ..
            } => ApiError::forbidden(message)
                .with_details(serde_json::json!({ "version_id": version_id })),
            SiteStatsError::NotFound { message, .. } => ApiError::not_found(message),
            SiteStatsError::Conflict { message, .. } => ApiError::conflict(message),
            SiteStatsError::Validation { message, .. } => ApiError::validation(message),
            SiteStatsError::Parse { message, .. } => ApiError::validation(message),
            SiteStatsError::Csv(e) => ApiError::validation(format!("CSV error: {}", e)),
            SiteStatsError::Configuration(msg) => ApiError::bad_request(msg),
            SiteStatsError::Database {
                message,
                code: ErrorCode::DbBusy,
                ..
            } => ApiError::unavailable(message),
            SiteStatsError::Database { message, .. } => {
                ApiError::internal(format!("Database error: {}", message))
            }
            SiteStatsError::Serialization(e) => {
                ApiError::internal(format!("Serialization error: {}", e))
            }
            SiteStatsError::Io(e) => ApiError::internal(format!("IO error: {}", e)),
            SiteStatsError::Internal(msg) => ApiError::internal(msg),
        };

        let api = ApiError { code: code.to_string(), ..api };
        match (suggestion, api.details.is_none()) {
            (Some(suggestion), true) => {
                api.with_details(serde_json::json!({ "suggestion": suggestion }))
            }
            _ => api,
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_mapping() {
        let ts = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let cases = [
            (SiteStatsError::duplicate_version("u", ts), StatusCode::CONFLICT),
            (SiteStatsError::non_current_edit(1), StatusCode::FORBIDDEN),
            (SiteStatsError::version_not_found(1), StatusCode::NOT_FOUND),
            (
                SiteStatsError::already_exists("Language", "English"),
                StatusCode::CONFLICT,
            ),
            (SiteStatsError::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (SiteStatsError::database("disk"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_core_code_and_details_carried() {
        let err = ApiError::from(SiteStatsError::non_current_edit(7));
        assert_eq!(err.code, "SITE_003");
        assert_eq!(err.details.unwrap()["version_id"], 7);

        let err = ApiError::from(SiteStatsError::version_not_found(3));
        assert!(err.details.unwrap()["suggestion"].is_string());
    }
}
