//! # Service Error Types
//!
//! `ServiceError` is what the pipeline returns; `ApiError` is what a caller
//! is allowed to see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in TripSplit                              │
//! │                                                                         │
//! │  CoreError ─────────────┐                                              │
//! │  SessionNotFound ───────┤                                              │
//! │  NotSessionMember ──────┼──► ServiceError ──► ApiError ──► caller      │
//! │  ExpenditureNotFound ───┤                      code + reason + message │
//! │  DbError ───────────────┘                                              │
//! │                                                                         │
//! │  Database and config failures are logged in full and reported as       │
//! │  { "code": "INTERNAL", "message": "Internal server error" }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use tripsplit_core::{CoreError, RejectionReason};
use tripsplit_db::DbError;

/// Result type alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything the request pipeline can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// The payload broke a split rule.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The session does not exist.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The acting member is not part of the session.
    #[error("Member {member_id} is not in session {session_id}")]
    NotSessionMember {
        session_id: String,
        member_id: String,
    },

    /// The expenditure does not exist (or not in this session).
    #[error("Expenditure not found: {0}")]
    ExpenditureNotFound(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Store failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),
}

impl ServiceError {
    /// Machine-readable reason for caller errors; `None` for internal ones.
    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            ServiceError::Validation(e) => Some(e.reason()),
            ServiceError::SessionNotFound(_) => Some(RejectionReason::SessionNotFound),
            ServiceError::NotSessionMember { .. } => Some(RejectionReason::NotSessionMember),
            ServiceError::ExpenditureNotFound(_) => Some(RejectionReason::ExpenditureNotFound),
            ServiceError::Database(_)
            | ServiceError::InvalidConfig(_)
            | ServiceError::ConfigLoadFailed(_) => None,
        }
    }

    /// Returns true if the caller caused this error.
    pub fn is_caller_error(&self) -> bool {
        self.reason().is_some()
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// API Error
// =============================================================================

/// Error returned to the client.
///
/// ## Serialization
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "reason": "DISTRIBUTION_AMOUNT_MISMATCH",
///   "message": "Distribution for alice does not match items: declared 5, allocated 7"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ApiError {
    /// Machine-readable error class.
    pub code: ErrorCode,

    /// Exact rejection kind, absent for internal errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub reason: Option<RejectionReason>,

    /// Human-readable error message for display.
    pub message: String,
}

/// Error classes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Session or expenditure not found (404)
    NotFound,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, reason: Option<RejectionReason>, message: impl Into<String>) -> Self {
        ApiError {
            code,
            reason,
            message: message.into(),
        }
    }

    /// Creates an internal error with a generic message.
    pub fn internal() -> Self {
        ApiError::new(ErrorCode::Internal, None, "Internal server error")
    }
}

/// Converts pipeline errors to API errors, hiding internal detail.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let reason = err.reason();
        match err {
            ServiceError::Validation(e) => {
                ApiError::new(ErrorCode::ValidationError, reason, e.to_string())
            }
            ServiceError::NotSessionMember { .. } => {
                ApiError::new(ErrorCode::ValidationError, reason, err.to_string())
            }
            ServiceError::SessionNotFound(_) | ServiceError::ExpenditureNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, reason, err.to_string())
            }
            ServiceError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                ApiError::internal()
            }
            ServiceError::InvalidConfig(e) | ServiceError::ConfigLoadFailed(e) => {
                tracing::error!(error = %e, "Configuration error");
                ApiError::internal()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_shape() {
        let err = ServiceError::Validation(CoreError::TotalMismatch {
            declared: "30".to_string(),
            distributed: "2999/100".to_string(),
        });
        let api: ApiError = err.into();

        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["reason"], "TOTAL_MISMATCH");
        assert!(json["message"].as_str().unwrap().contains("2999/100"));
    }

    #[test]
    fn test_not_found_shape() {
        let api: ApiError = ServiceError::ExpenditureNotFound("e-1".to_string()).into();
        assert_eq!(api.code, ErrorCode::NotFound);
        assert_eq!(api.reason, Some(RejectionReason::ExpenditureNotFound));
        assert_eq!(api.message, "Expenditure not found: e-1");
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = ServiceError::Database(DbError::QueryFailed(
            "no such table: expenditure_payers".to_string(),
        ));
        assert!(!err.is_caller_error());

        let api: ApiError = err.into();
        assert_eq!(api, ApiError::internal());

        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("reason").is_none());
        assert!(!json.to_string().contains("expenditure_payers"));
    }

    #[test]
    fn test_non_member_is_caller_error() {
        let err = ServiceError::NotSessionMember {
            session_id: "s".to_string(),
            member_id: "mallory".to_string(),
        };
        assert!(err.is_caller_error());

        let api: ApiError = err.into();
        assert_eq!(api.code, ErrorCode::ValidationError);
        assert_eq!(api.reason, Some(RejectionReason::NotSessionMember));
    }
}
