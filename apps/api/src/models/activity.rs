use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::recipe::{Category, Recipe};
use crate::models::review::Review;

#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub category: Option<Category>,
    pub saved_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(user_id: Uuid, recipe: &Recipe) -> Self {
        Favorite {
            user_id,
            recipe_id: recipe.id,
            recipe_title: recipe.title.clone(),
            category: recipe.category,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FavoriteRow {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub category: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Favorite {
            user_id: row.user_id,
            recipe_id: row.recipe_id,
            recipe_title: row.recipe_title,
            category: row.category.as_deref().and_then(Category::parse),
            saved_at: row.saved_at,
        }
    }
}

/// One entry in a user's own activity feed. A denormalized copy of the
/// review event, kept even if the review or recipe is later removed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub recipe_id: Uuid,
    pub recipe_title: String,
    pub rating: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn for_review(review: &Review, recipe_title: &str) -> Self {
        HistoryEntry {
            id: Uuid::new_v4(),
            user_id: review.user_id,
            kind: "review".to_string(),
            recipe_id: review.recipe_id,
            recipe_title: recipe_title.to_string(),
            rating: review.rating,
            text: review.text.clone(),
            created_at: review.created_at,
        }
    }
}
