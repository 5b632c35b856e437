use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::{Favorite, HistoryEntry};
use crate::models::recipe::{Recipe, RecipeDraft, SortField};
use crate::models::review::{ModeratedReview, NewReview, Review, ReviewEdit};
use crate::models::user::{Role, User};
use crate::ratings::RatingSummary;
use crate::store::{Page, RecipeQuery, RecipeStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    recipes: HashMap<Uuid, Recipe>,
    reviews: HashMap<Uuid, Review>,
    favorites: HashMap<(Uuid, Uuid), Favorite>,
    history: HashMap<Uuid, HistoryEntry>,
}

/// In-process store. A single lock covers every table, so each trait method
/// is one isolated read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Descending order on the sort field with id as tiebreak, matching the
/// `ORDER BY <col> DESC, id DESC` of the SQL store.
fn recipe_order(a: &Recipe, b: &Recipe, sort: SortField) -> Ordering {
    let primary = match sort {
        SortField::CreatedAt => b.created_at.cmp(&a.created_at),
        SortField::AvgRating => b.avg_rating.total_cmp(&a.avg_rating),
        SortField::RatingCount => b.rating_count.cmp(&a.rating_count),
    };
    primary.then_with(|| b.id.cmp(&a.id))
}

fn review_order(a: &Review, b: &Review) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(
                "This email is already registered".to_string(),
            ));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(users)
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.name = name.to_string();
        Ok(user.clone())
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<Recipe>, AppError> {
        let tables = self.tables.lock().await;

        let anchor = match query.cursor {
            Some(id) => match tables.recipes.get(&id) {
                Some(recipe) => Some(recipe),
                // a cursor naming a vanished recipe yields nothing, as in SQL
                None => return Ok(Page::from_overfetch(Vec::new(), query.limit, |r: &Recipe| r.id)),
            },
            None => None,
        };

        let mut rows: Vec<Recipe> = tables
            .recipes
            .values()
            .filter(|r| query.category.map_or(true, |c| r.category == Some(c)))
            .filter(|r| {
                anchor.map_or(true, |a| {
                    recipe_order(a, r, query.sort) == Ordering::Less
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| recipe_order(a, b, query.sort));
        rows.truncate(usize::try_from(query.limit + 1).unwrap_or(0));

        Ok(Page::from_overfetch(rows, query.limit, |r: &Recipe| r.id))
    }

    async fn all_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Recipe> = tables.recipes.values().cloned().collect();
        rows.sort_by(|a, b| recipe_order(a, b, SortField::CreatedAt));
        Ok(rows)
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, AppError> {
        Ok(self.tables.lock().await.recipes.get(&id).cloned())
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.recipes.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn update_recipe(&self, id: Uuid, draft: RecipeDraft) -> Result<Recipe, AppError> {
        let mut tables = self.tables.lock().await;
        let recipe = tables
            .recipes
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Recipe {id} not found")))?;
        recipe.apply_draft(draft);
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.recipes.remove(&id).is_none() {
            return Ok(false);
        }
        tables.reviews.retain(|_, r| r.recipe_id != id);
        tables.favorites.retain(|(_, recipe_id), _| *recipe_id != id);
        Ok(true)
    }

    async fn list_reviews(
        &self,
        recipe_id: Uuid,
        cursor: Option<Uuid>,
        limit: i64,
    ) -> Result<Page<Review>, AppError> {
        let tables = self.tables.lock().await;

        let anchor = match cursor {
            Some(id) => match tables.reviews.get(&id) {
                Some(review) => Some(review),
                None => return Ok(Page::from_overfetch(Vec::new(), limit, |r: &Review| r.id)),
            },
            None => None,
        };

        let mut rows: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.recipe_id == recipe_id)
            .filter(|r| anchor.map_or(true, |a| review_order(a, r) == Ordering::Less))
            .cloned()
            .collect();
        rows.sort_by(review_order);
        rows.truncate(usize::try_from(limit + 1).unwrap_or(0));

        Ok(Page::from_overfetch(rows, limit, |r: &Review| r.id))
    }

    async fn get_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reviews
            .get(&review_id)
            .filter(|r| r.recipe_id == recipe_id)
            .cloned())
    }

    async fn add_review(&self, review: NewReview) -> Result<(Review, RatingSummary), AppError> {
        let mut tables = self.tables.lock().await;

        let recipe_id = review.recipe_id;
        let recipe = tables
            .recipes
            .get_mut(&recipe_id)
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;

        let review = review.into_review();
        let updated = recipe.rating().with_added(review.rating);
        recipe.set_rating(updated);
        let entry = HistoryEntry::for_review(&review, &recipe.title);

        tables.history.insert(entry.id, entry);
        tables.reviews.insert(review.id, review.clone());
        Ok((review, updated))
    }

    async fn edit_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
        edit: ReviewEdit,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tables = self.tables.lock().await;
        let Tables {
            recipes, reviews, ..
        } = &mut *tables;

        let recipe = recipes
            .get_mut(&recipe_id)
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;
        let review = reviews
            .get_mut(&review_id)
            .filter(|r| r.recipe_id == recipe_id)
            .ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;

        let new_rating = edit.rating.map(|r| r.get()).unwrap_or(review.rating);
        let updated = recipe.rating().with_replaced(review.rating, new_rating);
        recipe.set_rating(updated);

        review.text = edit.text;
        review.rating = new_rating;
        review.updated_at = Some(Utc::now());
        Ok((review.clone(), updated))
    }

    async fn delete_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tables = self.tables.lock().await;
        let Tables {
            recipes, reviews, ..
        } = &mut *tables;

        let recipe = recipes
            .get_mut(&recipe_id)
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;
        if !reviews
            .get(&review_id)
            .is_some_and(|r| r.recipe_id == recipe_id)
        {
            return Err(AppError::not_found(format!("Review {review_id} not found")));
        }
        let removed = reviews
            .remove(&review_id)
            .ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;

        let updated = recipe.rating().with_removed(removed.rating);
        recipe.set_rating(updated);
        Ok((removed, updated))
    }

    async fn list_all_reviews(&self) -> Result<Vec<ModeratedReview>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&Review> = tables.reviews.values().collect();
        rows.sort_by(|a, b| review_order(a, b));
        Ok(rows
            .into_iter()
            .filter_map(|review| {
                tables
                    .recipes
                    .get(&review.recipe_id)
                    .map(|recipe| ModeratedReview {
                        review: review.clone(),
                        recipe_title: recipe.title.clone(),
                    })
            })
            .collect())
    }

    async fn get_favorite(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Favorite>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.favorites.get(&(user_id, recipe_id)).cloned())
    }

    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables
            .favorites
            .entry((favorite.user_id, favorite.recipe_id))
            .or_insert_with(|| favorite.clone());
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.favorites.remove(&(user_id, recipe_id)).is_some())
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Favorite> = tables
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(rows)
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<HistoryEntry> = tables
            .history
            .values()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn delete_history(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables
            .history
            .get(&entry_id)
            .is_some_and(|h| h.user_id == user_id)
        {
            return Ok(false);
        }
        Ok(tables.history.remove(&entry_id).is_some())
    }
}
