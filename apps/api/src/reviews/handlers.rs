use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::session::CurrentUser;
use crate::errors::AppError;
use crate::events::RecipeEvent;
use crate::models::review::{NewReview, Review, ReviewEdit};
use crate::ratings::{Rating, RatingSummary};
use crate::reviews::clean_review_text;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditReviewRequest {
    pub text: String,
    #[serde(default)]
    pub rating: Option<i32>,
}

#[derive(Serialize)]
pub struct ReviewPageResponse {
    pub reviews: Vec<Review>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub review: Review,
    pub rating: RatingSummary,
}

#[derive(Serialize)]
pub struct RatingResponse {
    pub rating: RatingSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/recipes/:id/reviews
pub async fn handle_list_reviews(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    Query(params): Query<CursorQuery>,
) -> Result<Json<ReviewPageResponse>, AppError> {
    if state.store.get_recipe(recipe_id).await?.is_none() {
        return Err(AppError::not_found(format!("Recipe {recipe_id} not found")));
    }

    let page = state
        .store
        .list_reviews(recipe_id, params.cursor, state.config.review_page_size)
        .await?;
    let has_more = page.has_more();

    Ok(Json(ReviewPageResponse {
        reviews: page.items,
        next_cursor: page.next_cursor,
        has_more,
    }))
}

/// POST /api/v1/recipes/:id/reviews
pub async fn handle_create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let rating = Rating::new(req.rating)?;
    let text = clean_review_text(&req.text)?;

    let author_name = if user.name.trim().is_empty() {
        "Anonymous".to_string()
    } else {
        user.name.clone()
    };

    let (review, summary) = state
        .store
        .add_review(NewReview {
            recipe_id,
            user_id: user.id,
            author_name,
            rating,
            text,
        })
        .await?;

    state.events.publish(RecipeEvent::rating(recipe_id, summary));

    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            review,
            rating: summary,
        }),
    ))
}

/// PATCH /api/v1/recipes/:id/reviews/:review_id
/// Only the author may edit. Text-only edits leave the aggregate untouched.
pub async fn handle_edit_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((recipe_id, review_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<EditReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let existing = state
        .store
        .get_review(recipe_id, review_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;
    if existing.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let edit = ReviewEdit {
        text: clean_review_text(&req.text)?,
        rating: req.rating.map(Rating::new).transpose()?,
    };
    let (review, summary) = state.store.edit_review(recipe_id, review_id, edit).await?;

    if review.rating != existing.rating {
        state.events.publish(RecipeEvent::rating(recipe_id, summary));
    }

    Ok(Json(ReviewResponse {
        review,
        rating: summary,
    }))
}

/// DELETE /api/v1/recipes/:id/reviews/:review_id
/// The author or an admin may delete.
pub async fn handle_delete_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((recipe_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RatingResponse>, AppError> {
    let existing = state
        .store
        .get_review(recipe_id, review_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;
    if existing.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let summary = remove_review(&state, recipe_id, review_id).await?;
    Ok(Json(RatingResponse { rating: summary }))
}

/// Deletes a review and announces the new aggregate. Shared with moderation.
pub async fn remove_review(
    state: &AppState,
    recipe_id: Uuid,
    review_id: Uuid,
) -> Result<RatingSummary, AppError> {
    let (removed, summary) = state.store.delete_review(recipe_id, review_id).await?;
    info!(
        "Review {} by {} removed from recipe {}",
        removed.id, removed.user_id, recipe_id
    );
    state.events.publish(RecipeEvent::rating(recipe_id, summary));
    Ok(summary)
}
