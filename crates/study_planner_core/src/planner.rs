//! crates/study_planner_core/src/planner.rs
//!
//! The "generate a plan for me" use case. Loads the user's preferences and
//! selected subjects from the store, runs the generator, keeps only sessions
//! that reference known subjects, and saves them in one batch.
//!
//! A failed save never throws the generated plan away: the outcome is
//! returned with `saved = false` so the caller can still show it.

use chrono::NaiveDateTime;
use rand::Rng;
use std::collections::HashSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{ScheduleResult, StudySession, Subject};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::scheduler::{generate_schedule, summarize};

//=========================================================================================
// Errors and Outcome
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Select at least one subject to schedule")]
    NoSubjectsSelected,
    #[error("Study preferences have not been configured for this user")]
    MissingPreferences,
    #[error("No study session could be placed before the selected exams")]
    NothingToSchedule,
    #[error("None of the generated sessions refer to a known subject")]
    NoValidSubjects,
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The generated plan, restricted to known subjects.
    pub result: ScheduleResult,
    /// Selected subjects that were planned, counted by id.
    pub subject_count: usize,
    /// Rows written to the store; empty when the save failed.
    pub persisted: Vec<StudySession>,
    pub saved: bool,
    pub save_error: Option<String>,
}

//=========================================================================================
// Use Cases
//=========================================================================================

/// Generates and stores a plan for `selected` subjects of `user_id`.
///
/// Subjects are scheduled in store order (earliest exam first); ids that do
/// not belong to the user are ignored.
pub async fn generate_plan<R: Rng + ?Sized>(
    db: &dyn DatabaseService,
    user_id: Uuid,
    selected: &[Uuid],
    now: NaiveDateTime,
    rng: &mut R,
) -> Result<PlanOutcome, PlanError> {
    if selected.is_empty() {
        return Err(PlanError::NoSubjectsSelected);
    }

    let preferences = db
        .get_preferences(user_id)
        .await?
        .ok_or(PlanError::MissingPreferences)?;

    let known: Vec<Subject> = db.list_subjects(user_id).await?;
    let wanted: HashSet<Uuid> = selected.iter().copied().collect();
    let to_schedule: Vec<Subject> = known
        .iter()
        .filter(|s| wanted.contains(&s.id))
        .cloned()
        .collect();
    if to_schedule.is_empty() {
        return Err(PlanError::NoSubjectsSelected);
    }

    let generated = generate_schedule(&to_schedule, &preferences, now, rng);
    if generated.schedule.is_empty() {
        return Err(PlanError::NothingToSchedule);
    }

    // Referential integrity is the caller's job: drop anything the store does not know.
    let known_ids: HashSet<Uuid> = known.iter().map(|s| s.id).collect();
    let generated_count = generated.schedule.len();
    let schedule: Vec<_> = generated
        .schedule
        .into_iter()
        .filter(|s| known_ids.contains(&s.subject_id))
        .collect();
    if schedule.is_empty() {
        return Err(PlanError::NoValidSubjects);
    }
    if schedule.len() < generated_count {
        warn!(
            dropped = generated_count - schedule.len(),
            "Dropped sessions for unknown subjects"
        );
    }

    let result = ScheduleResult {
        summary: summarize(&to_schedule, &schedule),
        schedule,
    };
    let requests = result
        .schedule
        .iter()
        .map(|s| s.to_new_session(user_id))
        .collect();

    match db.create_study_sessions(requests).await {
        Ok(persisted) => {
            info!(
                user_id = %user_id,
                sessions = persisted.len(),
                subjects = to_schedule.len(),
                "Study plan saved"
            );
            Ok(PlanOutcome {
                result,
                subject_count: to_schedule.len(),
                persisted,
                saved: true,
                save_error: None,
            })
        }
        Err(e) => {
            error!("Failed to save generated study plan: {:?}", e);
            Ok(PlanOutcome {
                result,
                subject_count: to_schedule.len(),
                persisted: Vec::new(),
                saved: false,
                save_error: Some(e.to_string()),
            })
        }
    }
}

/// Deletes a subject together with all of its study sessions.
pub async fn remove_subject(db: &dyn DatabaseService, subject_id: Uuid) -> PortResult<()> {
    db.delete_sessions_for_subject(subject_id).await?;
    db.delete_subject(subject_id).await
}
