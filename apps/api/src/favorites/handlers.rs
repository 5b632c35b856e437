use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::errors::AppError;
use crate::favorites::toggle_favorite;
use crate::models::activity::Favorite;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FavoriteStateResponse {
    pub recipe_id: Uuid,
    pub favorited: bool,
}

/// POST /api/v1/recipes/:id/favorite
pub async fn handle_toggle_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<FavoriteStateResponse>, AppError> {
    let favorited = toggle_favorite(state.store.as_ref(), user.id, recipe_id).await?;
    Ok(Json(FavoriteStateResponse {
        recipe_id,
        favorited,
    }))
}

/// GET /api/v1/me/favorites
pub async fn handle_list_favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Favorite>>, AppError> {
    Ok(Json(state.store.list_favorites(user.id).await?))
}

/// DELETE /api/v1/me/favorites/:recipe_id
pub async fn handle_remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_favorite(user.id, recipe_id).await? {
        return Err(AppError::not_found(format!(
            "Recipe {recipe_id} is not in favorites"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
