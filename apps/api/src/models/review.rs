use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::ratings::Rating;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A review joined with the title of the recipe it belongs to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ModeratedReview {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub review: Review,
    pub recipe_title: String,
}

/// A validated review about to be written.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub rating: Rating,
    pub text: String,
}

impl NewReview {
    pub fn into_review(self) -> Review {
        Review {
            id: Uuid::new_v4(),
            recipe_id: self.recipe_id,
            user_id: self.user_id,
            author_name: self.author_name,
            rating: self.rating.get(),
            text: self.text,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// Changes requested by the author of a review.
#[derive(Debug, Clone)]
pub struct ReviewEdit {
    pub text: String,
    pub rating: Option<Rating>,
}
