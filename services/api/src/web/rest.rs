//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the router that
//! mounts every REST endpoint behind the user middleware.

use crate::web::{
    dto::{
        CreateSubjectRequest, ExamWarningResponse, GenerateScheduleRequest,
        GenerateScheduleResponse, PreferencesPayload, RemindersResponse, ScheduleSessionResponse,
        ScheduleSummaryResponse, StudySessionResponse, SubjectResponse, UpdateSessionRequest,
        UpdateSubjectRequest,
    },
    middleware::require_user,
    preferences, reminders, schedule, sessions,
    state::AppState,
    subjects,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        subjects::list_subjects_handler,
        subjects::create_subject_handler,
        subjects::get_subject_handler,
        subjects::update_subject_handler,
        subjects::delete_subject_handler,
        preferences::get_preferences_handler,
        preferences::put_preferences_handler,
        sessions::list_sessions_handler,
        sessions::update_session_handler,
        sessions::delete_session_handler,
        schedule::generate_schedule_handler,
        schedule::preview_schedule_handler,
        reminders::reminders_handler,
    ),
    components(
        schemas(
            SubjectResponse,
            CreateSubjectRequest,
            UpdateSubjectRequest,
            PreferencesPayload,
            StudySessionResponse,
            UpdateSessionRequest,
            GenerateScheduleRequest,
            GenerateScheduleResponse,
            ScheduleSessionResponse,
            ScheduleSummaryResponse,
            RemindersResponse,
            ExamWarningResponse,
        )
    ),
    tags(
        (
            name = "Study Planner API",
            description = "Subjects, preferences and generated study sessions."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Every API route, with user identification applied. CORS and Swagger UI are added by the binary.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/subjects",
            get(subjects::list_subjects_handler).post(subjects::create_subject_handler),
        )
        .route(
            "/subjects/{id}",
            get(subjects::get_subject_handler)
                .patch(subjects::update_subject_handler)
                .delete(subjects::delete_subject_handler),
        )
        .route(
            "/preferences",
            get(preferences::get_preferences_handler).put(preferences::put_preferences_handler),
        )
        .route("/sessions", get(sessions::list_sessions_handler))
        .route(
            "/sessions/{id}",
            patch(sessions::update_session_handler).delete(sessions::delete_session_handler),
        )
        .route("/schedule", post(schedule::generate_schedule_handler))
        .route("/schedule/preview", post(schedule::preview_schedule_handler))
        .route("/reminders", get(reminders::reminders_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_user,
        ))
        .with_state(app_state)
}
