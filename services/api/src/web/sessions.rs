//! services/api/src/web/sessions.rs
//!
//! Listing, editing and deleting stored study sessions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::domain::{StudySession, StudySessionUpdate};
use uuid::Uuid;

use crate::error::{bad_request, port_rejection, Rejection};
use crate::web::dto::{SessionRangeQuery, StudySessionResponse, UpdateSessionRequest};
use crate::web::state::AppState;

async fn owned_session(
    state: &AppState,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<StudySession, Rejection> {
    let session = state
        .db
        .get_study_session(session_id)
        .await
        .map_err(|e| port_rejection("Failed to load study session", e))?;
    if session.user_id != user_id {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Study session {} not found", session_id),
        ));
    }
    Ok(session)
}

/// List the caller's study sessions in date order.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Stored sessions", body = [StudySessionResponse]),
        (status = 400, description = "Invalid date range")
    ),
    params(
        SessionRangeQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(range): Query<SessionRangeQuery>,
) -> Result<impl IntoResponse, Rejection> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        if from > to {
            return Err(bad_request("`from` must not be after `to`"));
        }
    }
    let sessions = state
        .db
        .list_study_sessions(user_id, range.from, range.to)
        .await
        .map_err(|e| port_rejection("Failed to list study sessions", e))?;
    let body: Vec<StudySessionResponse> =
        sessions.into_iter().map(StudySessionResponse::from).collect();
    Ok(Json(body))
}

/// Edit a stored session (mark it done, move it, add notes).
#[utoipa::path(
    patch,
    path = "/sessions/{id}",
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Updated session", body = StudySessionResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "No such session for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Study session id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let update = StudySessionUpdate::try_from(req).map_err(bad_request)?;
    owned_session(&state, user_id, session_id).await?;
    let session = state
        .db
        .update_study_session(session_id, update)
        .await
        .map_err(|e| port_rejection("Failed to update study session", e))?;
    Ok(Json(StudySessionResponse::from(session)))
}

/// Delete a stored session.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "No such session for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Study session id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    owned_session(&state, user_id, session_id).await?;
    state
        .db
        .delete_study_session(session_id)
        .await
        .map_err(|e| port_rejection("Failed to delete study session", e))?;
    Ok(StatusCode::NO_CONTENT)
}
