//! Storage seam. Every persistent read and write goes through `RecipeStore`.
//!
//! Default: `PgStore` (PostgreSQL via sqlx).
//! `MemoryStore` keeps everything in process; used for local runs without a
//! database and throughout the test suite.
//!
//! `AppState` holds an `Arc<dyn RecipeStore>`, picked at startup via config.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::{Favorite, HistoryEntry};
use crate::models::recipe::{Category, Recipe, RecipeDraft, SortField};
use crate::models::review::{ModeratedReview, NewReview, Review, ReviewEdit};
use crate::models::user::{Role, User};
use crate::ratings::RatingSummary;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ────────────────────────────────────────────────────────────────────────────
// Cursor pages
// ────────────────────────────────────────────────────────────────────────────

/// One page of a cursor-paginated listing. `next_cursor` is the id of the
/// last item and is present only when at least one more item exists.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Uuid>,
}

impl<T> Page<T> {
    /// Builds a page from a query that fetched `limit + 1` rows.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64, id_of: impl Fn(&T) -> Uuid) -> Self {
        let limit = usize::try_from(limit).unwrap_or(0);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(id_of)
        } else {
            None
        };
        Page {
            items: rows,
            next_cursor,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RecipeQuery {
    pub category: Option<Category>,
    pub sort: SortField,
    pub cursor: Option<Uuid>,
    pub limit: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RecipeStore: Send + Sync {
    // users
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Fails with `AppError::Conflict` when the email is already taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<User, AppError>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, AppError>;

    // recipes
    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<Recipe>, AppError>;
    async fn all_recipes(&self) -> Result<Vec<Recipe>, AppError>;
    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, AppError>;
    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError>;
    async fn update_recipe(&self, id: Uuid, draft: RecipeDraft) -> Result<Recipe, AppError>;
    /// Removes the recipe with its reviews and favorites.
    async fn delete_recipe(&self, id: Uuid) -> Result<bool, AppError>;

    // reviews
    async fn list_reviews(
        &self,
        recipe_id: Uuid,
        cursor: Option<Uuid>,
        limit: i64,
    ) -> Result<Page<Review>, AppError>;
    async fn get_review(&self, recipe_id: Uuid, review_id: Uuid)
        -> Result<Option<Review>, AppError>;
    /// Writes the review, the updated aggregate and the author's history
    /// entry atomically.
    async fn add_review(&self, review: NewReview) -> Result<(Review, RatingSummary), AppError>;
    async fn edit_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
        edit: ReviewEdit,
    ) -> Result<(Review, RatingSummary), AppError>;
    async fn delete_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
    ) -> Result<(Review, RatingSummary), AppError>;
    /// Every review across all recipes, newest first.
    async fn list_all_reviews(&self) -> Result<Vec<ModeratedReview>, AppError>;

    // favorites
    async fn get_favorite(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Favorite>, AppError>;
    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), AppError>;
    async fn delete_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, AppError>;
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, AppError>;

    // history
    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError>;
    async fn delete_history(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool, AppError>;
}
