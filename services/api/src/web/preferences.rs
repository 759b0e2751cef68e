//! services/api/src/web/preferences.rs
//!
//! Reading and replacing the caller's study preferences.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::domain::UserPreferences;
use uuid::Uuid;

use crate::error::{bad_request, port_rejection, Rejection};
use crate::web::dto::PreferencesPayload;
use crate::web::state::AppState;

/// Fetch the caller's preferences.
#[utoipa::path(
    get,
    path = "/preferences",
    responses(
        (status = 200, description = "Current preferences", body = PreferencesPayload),
        (status = 404, description = "Preferences not configured yet")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, Rejection> {
    let preferences = state
        .db
        .get_preferences(user_id)
        .await
        .map_err(|e| port_rejection("Failed to load preferences", e))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                "Preferences have not been configured".to_string(),
            )
        })?;
    Ok(Json(PreferencesPayload::from(preferences)))
}

/// Replace the caller's preferences.
#[utoipa::path(
    put,
    path = "/preferences",
    request_body = PreferencesPayload,
    responses(
        (status = 200, description = "Stored preferences", body = PreferencesPayload),
        (status = 400, description = "Invalid preferences")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn put_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<PreferencesPayload>,
) -> Result<impl IntoResponse, Rejection> {
    let preferences = UserPreferences::try_from(payload).map_err(bad_request)?;
    let stored = state
        .db
        .upsert_preferences(user_id, preferences)
        .await
        .map_err(|e| port_rejection("Failed to save preferences", e))?;
    Ok(Json(PreferencesPayload::from(stored)))
}
