//! services/api/src/web/subjects.rs
//!
//! Subject CRUD for the calling user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::domain::{Subject, SubjectUpdate};
use study_planner_core::planner::remove_subject;
use tracing::info;
use uuid::Uuid;

use crate::error::{bad_request, port_rejection, Rejection};
use crate::web::dto::{CreateSubjectRequest, SubjectResponse, UpdateSubjectRequest};
use crate::web::state::AppState;

/// Loads a subject and checks that it belongs to `user_id`.
///
/// Someone else's subject answers 404, the same as a missing one.
pub(crate) async fn owned_subject(
    state: &AppState,
    user_id: Uuid,
    subject_id: Uuid,
) -> Result<Subject, Rejection> {
    let subject = state
        .db
        .get_subject(subject_id)
        .await
        .map_err(|e| port_rejection("Failed to load subject", e))?;
    if subject.user_id != user_id {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Subject {} not found", subject_id),
        ));
    }
    Ok(subject)
}

/// List the caller's subjects, earliest exam first.
#[utoipa::path(
    get,
    path = "/subjects",
    responses(
        (status = 200, description = "Subjects of the user", body = [SubjectResponse]),
        (status = 500, description = "Internal server error")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    let subjects = state
        .db
        .list_subjects(user_id)
        .await
        .map_err(|e| port_rejection("Failed to list subjects", e))?;
    let body: Vec<SubjectResponse> = subjects.into_iter().map(SubjectResponse::from).collect();
    Ok(Json(body))
}

/// Create a subject.
#[utoipa::path(
    post,
    path = "/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Invalid subject")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn create_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let new_subject = req.into_new_subject(user_id).map_err(bad_request)?;
    let subject = state
        .db
        .create_subject(new_subject)
        .await
        .map_err(|e| port_rejection("Failed to create subject", e))?;
    info!(user_id = %user_id, subject_id = %subject.id, "Subject created");
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(subject))))
}

/// Fetch one subject.
#[utoipa::path(
    get,
    path = "/subjects/{id}",
    responses(
        (status = 200, description = "The subject", body = SubjectResponse),
        (status = 404, description = "No such subject for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Subject id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    let subject = owned_subject(&state, user_id, subject_id).await?;
    Ok(Json(SubjectResponse::from(subject)))
}

/// Change some fields of a subject. Existing sessions are left as they are.
#[utoipa::path(
    patch,
    path = "/subjects/{id}",
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Updated subject", body = SubjectResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "No such subject for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Subject id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
    Json(req): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, Rejection> {
    let update = SubjectUpdate::try_from(req).map_err(bad_request)?;
    owned_subject(&state, user_id, subject_id).await?;
    let subject = state
        .db
        .update_subject(subject_id, update)
        .await
        .map_err(|e| port_rejection("Failed to update subject", e))?;
    Ok(Json(SubjectResponse::from(subject)))
}

/// Delete a subject and every study session planned for it.
#[utoipa::path(
    delete,
    path = "/subjects/{id}",
    responses(
        (status = 204, description = "Subject and its sessions deleted"),
        (status = 404, description = "No such subject for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "Subject id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    owned_subject(&state, user_id, subject_id).await?;
    remove_subject(state.db.as_ref(), subject_id)
        .await
        .map_err(|e| port_rejection("Failed to delete subject", e))?;
    info!(user_id = %user_id, subject_id = %subject_id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}
