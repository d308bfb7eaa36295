use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ApiError {
    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ApiError::Validation(_) => 2,
            ApiError::NotFound(_) => 3,
            ApiError::Conflict(_) => 4,
            ApiError::ServiceUnavailable(_) => 5,
            ApiError::Internal(_) => 1,
        }
    }

    /// Caller-facing body. Internal details are logged, never shown.
    pub fn into_body(self) -> ErrorBody {
        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".into()
            }
        };

        ErrorBody {
            error: self.error_code().into(),
            message,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => ApiError::Validation(e.to_string()),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                ApiError::ServiceUnavailable("Database is unavailable".into())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ApiError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ApiError::Internal(format!("Migration failed: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("I/O error: {}", err))
    }
}
