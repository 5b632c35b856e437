//! Axum route handlers for the caller's own profile: display name and the
//! review history feed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::errors::AppError;
use crate::models::activity::HistoryEntry;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// PATCH /api/v1/me
pub async fn handle_update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name cannot be empty"));
    }
    Ok(Json(state.store.update_user_name(user.id, name).await?))
}

/// GET /api/v1/me/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.store.list_history(user.id).await?))
}

/// DELETE /api/v1/me/history/:entry_id
pub async fn handle_delete_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_history(user.id, entry_id).await? {
        return Err(AppError::not_found(format!(
            "History entry {entry_id} not found"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
