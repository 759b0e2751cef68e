//! services/api/src/web/reminders.rs
//!
//! What the client should remind the user about right now.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Duration;
use std::sync::Arc;
use study_planner_core::reminders::{upcoming_exams, upcoming_sessions};
use uuid::Uuid;

use crate::error::{port_rejection, Rejection};
use crate::web::dto::{ExamWarningResponse, RemindersResponse, StudySessionResponse};
use crate::web::state::AppState;

/// Sessions starting soon and exams coming up.
#[utoipa::path(
    get,
    path = "/reminders",
    responses(
        (status = 200, description = "Pending reminders", body = RemindersResponse),
        (status = 500, description = "Reminder window out of range")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn reminders_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    let now = state.clock.now();
    let lead = Duration::minutes(state.config.reminder_lead_minutes);
    let window_end = now.checked_add_signed(lead).ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Reminder window is out of range".to_string(),
        )
    })?;

    // Every session inside the lead window falls between these two dates.
    let sessions = state
        .db
        .list_study_sessions(user_id, Some(now.date()), Some(window_end.date()))
        .await
        .map_err(|e| port_rejection("Failed to list study sessions", e))?;
    let subjects = state
        .db
        .list_subjects(user_id)
        .await
        .map_err(|e| port_rejection("Failed to list subjects", e))?;

    let response = RemindersResponse {
        upcoming_sessions: upcoming_sessions(&sessions, now, lead)
            .into_iter()
            .cloned()
            .map(StudySessionResponse::from)
            .collect(),
        upcoming_exams: upcoming_exams(&subjects, now, state.config.exam_warning_days)
            .into_iter()
            .map(ExamWarningResponse::from)
            .collect(),
    };
    Ok(Json(response))
}
