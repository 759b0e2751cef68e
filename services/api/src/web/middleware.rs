//! services/api/src/web/middleware.rs
//!
//! User identification middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

/// Header carrying the id of the user a request acts for.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that reads the `x-user-id` header and makes sure the user row exists.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If missing or malformed, returns 400 Bad Request.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Extract and parse the header
    let user_id = match req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => id,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, "Invalid x-user-id format").into_response()
            }
        },
        None => {
            return (StatusCode::BAD_REQUEST, "x-user-id header is required").into_response()
        }
    };

    // 2. Ensure the owning user exists in the store
    if let Err(e) = state.db.get_or_create_user(user_id).await {
        error!("Failed to load user {}: {:?}", user_id, e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load user").into_response();
    }

    // 3. Insert user_id into request extensions and continue to the handler
    req.extensions_mut().insert(user_id);
    next.run(req).await
}
