//! crates/study_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete record store behind them.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use crate::domain::{
    NewStudySession, NewSubject, StudySession, StudySessionUpdate, Subject, SubjectUpdate,
    User, UserPreferences,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User>;

    // --- Subject Management ---
    /// All subjects owned by the user, earliest exam first.
    async fn list_subjects(&self, user_id: Uuid) -> PortResult<Vec<Subject>>;

    async fn get_subject(&self, subject_id: Uuid) -> PortResult<Subject>;

    async fn create_subject(&self, subject: NewSubject) -> PortResult<Subject>;

    async fn update_subject(&self, subject_id: Uuid, update: SubjectUpdate) -> PortResult<Subject>;

    async fn delete_subject(&self, subject_id: Uuid) -> PortResult<()>;

    // --- Preferences ---
    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<UserPreferences>>;

    async fn upsert_preferences(
        &self,
        user_id: Uuid,
        preferences: UserPreferences,
    ) -> PortResult<UserPreferences>;

    // --- Study Sessions ---
    /// Sessions owned by the user in date order; both bounds are inclusive.
    async fn list_study_sessions(
        &self,
        user_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> PortResult<Vec<StudySession>>;

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession>;

    /// Inserts every session in one batch.
    async fn create_study_sessions(
        &self,
        sessions: Vec<NewStudySession>,
    ) -> PortResult<Vec<StudySession>>;

    async fn update_study_session(
        &self,
        session_id: Uuid,
        update: StudySessionUpdate,
    ) -> PortResult<StudySession>;

    async fn delete_study_session(&self, session_id: Uuid) -> PortResult<()>;

    async fn delete_sessions_for_subject(&self, subject_id: Uuid) -> PortResult<()>;
}
