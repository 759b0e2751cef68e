//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and the mapping
//! from core errors to HTTP rejections used by the handlers.

use crate::config::ConfigError;
use axum::http::StatusCode;
use study_planner_core::planner::PlanError;
use study_planner_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The error half of every handler's return type.
pub type Rejection = (StatusCode, String);

/// Maps a port failure to a rejection, logging anything that is not the caller's fault.
pub fn port_rejection(context: &str, e: PortError) -> Rejection {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Invalid(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        PortError::Unexpected(_) => {
            error!("{}: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

pub fn plan_rejection(e: PlanError) -> Rejection {
    match e {
        PlanError::NoSubjectsSelected => (StatusCode::BAD_REQUEST, e.to_string()),
        PlanError::MissingPreferences => (StatusCode::NOT_FOUND, e.to_string()),
        PlanError::NothingToSchedule | PlanError::NoValidSubjects => {
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        PlanError::Port(e) => port_rejection("Failed to generate schedule", e),
    }
}

pub fn bad_request(message: impl Into<String>) -> Rejection {
    (StatusCode::BAD_REQUEST, message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_errors_map_to_client_statuses() {
        assert_eq!(plan_rejection(PlanError::NoSubjectsSelected).0, StatusCode::BAD_REQUEST);
        assert_eq!(plan_rejection(PlanError::MissingPreferences).0, StatusCode::NOT_FOUND);
        assert_eq!(
            plan_rejection(PlanError::NothingToSchedule).0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn unexpected_port_errors_hide_details() {
        let (status, body) = port_rejection(
            "Failed to list subjects",
            PortError::Unexpected("password authentication failed".into()),
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to list subjects");
    }
}
