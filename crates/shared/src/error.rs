//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain layers keep their own error enums and convert into this envelope at the
/// HTTP boundary, carrying a machine-readable code alongside the message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Field-level validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Offending input field, when known.
        field: Option<String>,
        /// Human-readable description.
        message: String,
    },

    /// Business rule violation.
    #[error("Business rule violation: {message}")]
    BusinessRule {
        /// Machine-readable rule code.
        code: &'static str,
        /// Human-readable description.
        message: String,
    },

    /// Conflict with existing state (e.g., a duplicate entry).
    #[error("Conflict: {message}")]
    Conflict {
        /// Machine-readable conflict code.
        code: &'static str,
        /// Human-readable description.
        message: String,
    },

    /// A row lock could not be acquired in time. Safe to retry.
    #[error("Resource busy: {0}")]
    Busy(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error bound to a field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation { .. } => 400,
            Self::BusinessRule { .. } => 422,
            Self::Conflict { .. } => 409,
            Self::Busy(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::BusinessRule { code, .. } | Self::Conflict { code, .. } => code,
            Self::Busy(_) => "BUSY",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the offending field for validation errors.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the client may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Database(_))
    }
}
