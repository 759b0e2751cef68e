//! services/api/src/web/schedule.rs
//!
//! Study plan generation. `POST /schedule` generates and stores a plan;
//! `POST /schedule/preview` only generates it.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::collections::HashSet;
use std::sync::Arc;
use study_planner_core::domain::Subject;
use study_planner_core::planner::{generate_plan, PlanError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{plan_rejection, port_rejection, Rejection};
use crate::web::dto::{
    GenerateScheduleRequest, GenerateScheduleResponse, ScheduleSessionResponse,
    ScheduleSummaryResponse, StudySessionResponse,
};
use crate::web::state::AppState;

/// Generate a study plan for the selected subjects and store it.
///
/// When storing fails the generated plan is still returned, with `saved = false`.
#[utoipa::path(
    post,
    path = "/schedule",
    request_body = GenerateScheduleRequest,
    responses(
        (status = 201, description = "Plan generated and stored", body = GenerateScheduleResponse),
        (
            status = 200,
            description = "Plan generated but not stored",
            body = GenerateScheduleResponse
        ),
        (status = 400, description = "No subject selected"),
        (status = 404, description = "Preferences not configured"),
        (status = 422, description = "Nothing could be scheduled")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn generate_schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateScheduleRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let mut rng = state.generator.rng();
    let outcome = generate_plan(
        state.db.as_ref(),
        user_id,
        &req.subject_ids,
        state.generator.now(),
        &mut rng,
    )
    .await
    .map_err(plan_rejection)?;

    let subject_count = outcome.subject_count;
    let session_count = outcome.result.schedule.len();
    let (status, message) = if outcome.saved {
        info!(user_id = %user_id, session_count, subject_count, "Schedule generated");
        (
            StatusCode::CREATED,
            format!(
                "Created {} study sessions for {} subjects",
                session_count, subject_count
            ),
        )
    } else {
        warn!(user_id = %user_id, "Schedule generated but not saved");
        (
            StatusCode::OK,
            format!(
                "Generated {} study sessions but could not save them: {}",
                session_count,
                outcome.save_error.unwrap_or_default()
            ),
        )
    };

    let response = GenerateScheduleResponse {
        schedule: outcome
            .result
            .schedule
            .iter()
            .map(ScheduleSessionResponse::from)
            .collect(),
        summary: ScheduleSummaryResponse::from(outcome.result.summary),
        saved: outcome.saved,
        message,
        sessions: outcome
            .persisted
            .into_iter()
            .map(StudySessionResponse::from)
            .collect(),
    };
    Ok((status, Json(response)))
}

/// Generate a study plan without storing it.
#[utoipa::path(
    post,
    path = "/schedule/preview",
    request_body = GenerateScheduleRequest,
    responses(
        (status = 200, description = "Generated plan", body = GenerateScheduleResponse),
        (status = 400, description = "No subject selected"),
        (status = 404, description = "Preferences not configured")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn preview_schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateScheduleRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let preferences = state
        .db
        .get_preferences(user_id)
        .await
        .map_err(|e| port_rejection("Failed to load preferences", e))?
        .ok_or_else(|| plan_rejection(PlanError::MissingPreferences))?;

    let wanted: HashSet<Uuid> = req.subject_ids.iter().copied().collect();
    let subjects: Vec<Subject> = state
        .db
        .list_subjects(user_id)
        .await
        .map_err(|e| port_rejection("Failed to list subjects", e))?
        .into_iter()
        .filter(|s| wanted.contains(&s.id))
        .collect();
    if subjects.is_empty() {
        return Err(plan_rejection(PlanError::NoSubjectsSelected));
    }

    let result = state.generator.generate(&subjects, &preferences);
    let message = format!("Previewing {} study sessions", result.schedule.len());
    Ok(Json(GenerateScheduleResponse {
        schedule: result
            .schedule
            .iter()
            .map(ScheduleSessionResponse::from)
            .collect(),
        summary: ScheduleSummaryResponse::from(result.summary),
        saved: false,
        message,
        sessions: Vec::new(),
    }))
}
