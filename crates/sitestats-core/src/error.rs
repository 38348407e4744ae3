//! Error types for sitestats operations.
//!
//! This module provides the error hierarchy shared by the store, the
//! importers and the REST server, with structured error codes and
//! suggestions for resolution.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for sitestats operations.
pub type StatsResult<T> = Result<T, SiteStatsError>;

/// Main error type for all sitestats operations.
#[derive(Error, Debug)]
pub enum SiteStatsError {
    /// A version with the same start timestamp already exists for the url.
    #[error("Duplicate version: {message}")]
    DuplicateVersion {
        message: String,
        code: ErrorCode,
        url: String,
        active_start_date: DateTime<Utc>,
    },

    /// Attempt to derive a new version from a historical one.
    #[error("Edit rejected: {message}")]
    NonCurrentEdit {
        message: String,
        code: ErrorCode,
        version_id: i64,
    },

    /// Site, version or lookup row not found.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        key: Option<String>,
    },

    /// A uniquely named row (language, geo zone) already exists.
    #[error("Conflict: {message}")]
    Conflict { message: String, code: ErrorCode },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,
    ValUnknownColumn,

    // Site versions (SITE_xxx)
    SiteNotFound,
    SiteDuplicateVersion,
    SiteNonCurrentEdit,

    // Catalog lookups (CAT_xxx)
    CatDuplicate,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbBusy,

    // Parse (PARSE_xxx)
    ParseInvalidDate,
    ParseInvalidNumber,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::ValUnknownColumn => "VAL_004",
            ErrorCode::SiteNotFound => "SITE_001",
            ErrorCode::SiteDuplicateVersion => "SITE_002",
            ErrorCode::SiteNonCurrentEdit => "SITE_003",
            ErrorCode::CatDuplicate => "CAT_002",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbBusy => "DB_003",
            ErrorCode::ParseInvalidDate => "PARSE_001",
            ErrorCode::ParseInvalidNumber => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl SiteStatsError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with a specific code.
    pub fn validation_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a duplicate version error.
    pub fn duplicate_version(url: impl Into<String>, active_start_date: DateTime<Utc>) -> Self {
        let url = url.into();
        Self::DuplicateVersion {
            message: format!(
                "Site '{}' already has a version starting at {}",
                url,
                active_start_date.to_rfc3339()
            ),
            code: ErrorCode::SiteDuplicateVersion,
            url,
            active_start_date,
        }
    }

    /// Create a non-current edit error.
    pub fn non_current_edit(version_id: i64) -> Self {
        Self::NonCurrentEdit {
            message: format!(
                "Version {} has been superseded and cannot be edited",
                version_id
            ),
            code: ErrorCode::SiteNonCurrentEdit,
            version_id,
        }
    }

    /// Create a not found error for a site version id.
    pub fn version_not_found(id: i64) -> Self {
        Self::NotFound {
            message: format!("Site version with id '{}' not found", id),
            code: ErrorCode::SiteNotFound,
            key: Some(id.to_string()),
        }
    }

    /// Create a not found error for a site url.
    pub fn site_not_found(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::NotFound {
            message: format!("Site with url '{}' not found", url),
            code: ErrorCode::SiteNotFound,
            key: Some(url),
        }
    }

    /// Create a conflict error for an already existing lookup row.
    pub fn already_exists(kind: &str, name: &str) -> Self {
        Self::Conflict {
            message: format!("{} with this Name already exists: '{}'", kind, name),
            code: ErrorCode::CatDuplicate,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidDate,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateVersion { code, .. } => *code,
            Self::NonCurrentEdit { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Conflict { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Csv(_) => ErrorCode::ValInvalidFormat,
            _ => ErrorCode::Internal,
        }
    }

    /// Whether a caller may retry the failed operation.
    ///
    /// Only lock contention on the database qualifies; every domain error is
    /// final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Database {
                code: ErrorCode::DbBusy,
                ..
            }
        )
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::DuplicateVersion { .. } => {
                Some("Choose a different active_start_date or edit the existing version")
            }
            Self::NonCurrentEdit { .. } => Some("Edit the current version of the site instead"),
            Self::NotFound { .. } => Some("Please check the id or url and ensure it exists"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Database {
                code: ErrorCode::DbBusy,
                ..
            } => Some("The database is busy, please retry"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SiteStatsError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                ErrorCode::DbBusy
            }
            Some(rusqlite::ErrorCode::CannotOpen) => ErrorCode::DbConnectionFailed,
            _ => ErrorCode::DbOperationFailed,
        };
        Self::Database {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}
