use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::session::MaybeUser;
use crate::errors::AppError;
use crate::events::{self, RecipeEvent};
use crate::models::recipe::Recipe;
use crate::recipes::listing::{search_within, ListParams};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<Recipe>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

#[derive(Serialize)]
pub struct RecipeDetailResponse {
    pub recipe: Recipe,
    /// `None` for anonymous callers.
    pub is_favorite: Option<bool>,
}

/// GET /api/v1/recipes
pub async fn handle_list_recipes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let query = params.to_query(state.config.recipe_page_size)?;
    let page = state.store.list_recipes(&query).await?;
    let has_more = page.has_more();
    let term = params.search_term();

    Ok(Json(RecipeListResponse {
        recipes: search_within(page.items, term.as_deref()),
        next_cursor: page.next_cursor,
        has_more,
    }))
}

/// GET /api/v1/recipes/:id
pub async fn handle_get_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    MaybeUser(user): MaybeUser,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let recipe = state
        .store
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Recipe {id} not found")))?;

    let is_favorite = match user {
        Some(user) => Some(state.store.get_favorite(user.id, id).await?.is_some()),
        None => None,
    };

    Ok(Json(RecipeDetailResponse {
        recipe,
        is_favorite,
    }))
}

/// GET /api/v1/recipes/feed
/// Pushes `recipe_created` for every recipe added after the client connects.
pub async fn handle_recipe_feed(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = events::filtered(state.events.subscribe(), |e| {
        matches!(e, RecipeEvent::RecipeCreated { .. })
    })
    .map(|e| e.to_sse());

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/v1/recipes/:id/rating/stream
/// Emits the current rating first, then every change for this recipe.
pub async fn handle_rating_stream(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    // subscribe before reading so no change between the two is lost
    let rx = state.events.subscribe();
    let recipe = state
        .store
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Recipe {id} not found")))?;

    let current = RecipeEvent::rating(id, recipe.rating());
    let updates = events::filtered(rx, move |e| {
        e.recipe_id() == id && !matches!(e, RecipeEvent::RecipeCreated { .. })
    });
    let stream = stream::once(async move { current })
        .chain(updates)
        .map(|e| e.to_sse());

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
