use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::admin;
use crate::auth::session::AdminUser;
use crate::errors::AppError;
use crate::models::recipe::{Recipe, RecipeInput};
use crate::models::review::ModeratedReview;
use crate::models::user::User;
use crate::ratings::RatingSummary;
use crate::reviews::handlers::remove_review;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModerationResponse {
    pub recipe_id: Uuid,
    pub review_id: Uuid,
    pub rating: RatingSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Recipes
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/recipes
pub async fn handle_list_recipes(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(state.store.all_recipes().await?))
}

/// POST /api/v1/admin/recipes
pub async fn handle_create_recipe(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    let recipe = admin::create_recipe(&state, &admin, input).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// GET /api/v1/admin/recipes/:id
pub async fn handle_get_recipe(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<Recipe>, AppError> {
    state
        .store
        .get_recipe(recipe_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))
}

/// PUT /api/v1/admin/recipes/:id
pub async fn handle_update_recipe(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(recipe_id): Path<Uuid>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<Recipe>, AppError> {
    Ok(Json(admin::update_recipe(&state, recipe_id, input).await?))
}

/// DELETE /api/v1/admin/recipes/:id
pub async fn handle_delete_recipe(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin::delete_recipe(&state, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.store.list_users().await?))
}

/// POST /api/v1/admin/users/:id/role
pub async fn handle_toggle_role(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(admin::toggle_role(&state, user_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Moderation
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/reviews
pub async fn handle_list_reviews(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<ModeratedReview>>, AppError> {
    Ok(Json(state.store.list_all_reviews().await?))
}

/// DELETE /api/v1/admin/reviews/:recipe_id/:review_id
pub async fn handle_delete_review(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path((recipe_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ModerationResponse>, AppError> {
    let rating = remove_review(&state, recipe_id, review_id).await?;
    Ok(Json(ModerationResponse {
        recipe_id,
        review_id,
        rating,
    }))
}
