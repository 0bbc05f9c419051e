//! Application error type shared by every layer.
//!
//! Each variant carries a human-readable message plus structured `details`
//! that end up as fields in the log line recording the failure.

use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Search, navigation or HTTP failure. Never retried within the same pass.
    #[error("transient fetch failure: {message}")]
    TransientFetch { message: String, details: Value },

    /// Another task or an earlier run already recorded this key.
    #[error("persistence conflict: {message}")]
    Conflict { message: String, details: Value },

    /// Invalid thresholds, windows or settings. Fatal before any task launches.
    #[error("configuration error: {message}")]
    Configuration { message: String, details: Value },

    #[error("not found: {message}")]
    NotFound { message: String, details: Value },

    /// The stop signal was observed at a state-transition boundary.
    #[error("cancelled: {message}")]
    Cancelled { message: String, details: Value },

    #[error("internal error: {message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn transient(message: impl Into<String>, details: Value) -> Self {
        Self::TransientFetch {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn configuration(message: impl Into<String>, details: Value) -> Self {
        Self::Configuration {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn cancelled(message: impl Into<String>, details: Value) -> Self {
        Self::Cancelled {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code, used as a metrics label and log field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::TransientFetch { .. } => "transient_fetch",
            AppError::Conflict { .. } => "conflict",
            AppError::Configuration { .. } => "configuration",
            AppError::NotFound { .. } => "not_found",
            AppError::Cancelled { .. } => "cancelled",
            AppError::Internal { .. } => "internal",
        }
    }

    pub fn details(&self) -> &Value {
        match self {
            AppError::TransientFetch { details, .. }
            | AppError::Conflict { details, .. }
            | AppError::Configuration { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::Cancelled { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict { .. })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    AppError::internal("Database error", json!({ "reason": e.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::transient("x", json!({})).code(), "transient_fetch");
        assert_eq!(AppError::conflict("x", json!({})).code(), "conflict");
        assert_eq!(
            AppError::configuration("x", json!({})).code(),
            "configuration"
        );
        assert_eq!(AppError::cancelled("x", json!({})).code(), "cancelled");
        assert_eq!(AppError::internal("x", json!({})).code(), "internal");
    }

    #[test]
    fn test_display_includes_message() {
        let err = AppError::configuration("ENGAGEMENT_FLOOR is invalid", json!({}));
        assert_eq!(
            err.to_string(),
            "configuration error: ENGAGEMENT_FLOOR is invalid"
        );
    }

    #[test]
    fn test_details_are_kept() {
        let err = AppError::transient("search failed", json!({ "status": 503 }));
        assert_eq!(err.details()["status"], 503);
        assert!(!err.is_conflict());
        assert!(AppError::conflict("dup", json!({})).is_conflict());
    }

    #[test]
    fn test_non_database_sqlx_error_is_internal() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
