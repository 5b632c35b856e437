//! Running-average maintenance for recipe ratings.
//!
//! A recipe stores `avg_rating` and `rating_count` instead of recomputing the
//! mean from its reviews. Every review mutation moves the pair through one of
//! the transitions below inside the same transaction that writes the review.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A star rating, always within `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rating(i32);

impl Rating {
    pub fn new(value: i32) -> Result<Self, AppError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(AppError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )))
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

/// The denormalized aggregate stored on each recipe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub rating_count: i32,
}

impl RatingSummary {
    pub fn new(avg_rating: f64, rating_count: i32) -> Self {
        Self {
            avg_rating,
            rating_count: rating_count.max(0),
        }
    }

    /// Folds one new rating into the mean.
    pub fn with_added(self, rating: i32) -> Self {
        let old = self.rating_count.max(0);
        let count = old + 1;
        let avg = (self.avg_rating * f64::from(old) + f64::from(rating)) / f64::from(count);
        Self {
            avg_rating: avg,
            rating_count: count,
        }
    }

    /// Removes one rating from the mean. The count never drops below zero and
    /// an empty aggregate always reads 0.
    pub fn with_removed(self, rating: i32) -> Self {
        let old = self.rating_count.max(0);
        let count = (old - 1).max(0);
        let avg = if count > 0 {
            (self.avg_rating * f64::from(old) - f64::from(rating)) / f64::from(count)
        } else {
            0.0
        };
        Self {
            avg_rating: avg,
            rating_count: count,
        }
    }

    /// Swaps one existing rating for another; the count is unchanged.
    pub fn with_replaced(self, old_rating: i32, new_rating: i32) -> Self {
        if self.rating_count <= 0 || old_rating == new_rating {
            return self;
        }
        let count = f64::from(self.rating_count);
        Self {
            avg_rating: (self.avg_rating * count - f64::from(old_rating) + f64::from(new_rating))
                / count,
            rating_count: self.rating_count,
        }
    }
}
