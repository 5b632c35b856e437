use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::{Favorite, FavoriteRow, HistoryEntry};
use crate::models::recipe::{Recipe, RecipeDraft, RecipeRow};
use crate::models::review::{ModeratedReview, NewReview, Review, ReviewEdit};
use crate::models::user::{Role, User, UserRow};
use crate::ratings::RatingSummary;
use crate::store::{Page, RecipeQuery, RecipeStore};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Locks the recipe row for the rest of the transaction and returns its
/// aggregate.
async fn lock_rating(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
) -> Result<(String, RatingSummary), AppError> {
    let row: Option<(String, f64, i32)> = sqlx::query_as(
        "SELECT title, avg_rating, rating_count FROM recipes WHERE id = $1 FOR UPDATE",
    )
    .bind(recipe_id)
    .fetch_optional(&mut **tx)
    .await?;

    let (title, avg, count) =
        row.ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;
    Ok((title, RatingSummary::new(avg, count)))
}

async fn store_rating(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    recipe_id: Uuid,
    summary: RatingSummary,
) -> Result<(), AppError> {
    sqlx::query("UPDATE recipes SET avg_rating = $1, rating_count = $2 WHERE id = $3")
        .bind(summary.avg_rating)
        .bind(summary.rating_count)
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "This email is already registered".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user_name(&self, id: Uuid, name: &str) -> Result<User, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as("UPDATE users SET name = $1 WHERE id = $2 RETURNING *")
                .bind(name)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::from)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let row: Option<UserRow> =
            sqlx::query_as("UPDATE users SET role = $1 WHERE id = $2 RETURNING *")
                .bind(role.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::from)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn list_recipes(&self, query: &RecipeQuery) -> Result<Page<Recipe>, AppError> {
        // The sort column comes from a closed enum, never from user text.
        let sql = format!(
            r#"
            SELECT * FROM recipes
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::uuid IS NULL OR ({col}, id) < (SELECT {col}, id FROM recipes WHERE id = $2))
            ORDER BY {col} DESC, id DESC
            LIMIT $3
            "#,
            col = query.sort.column()
        );

        let rows: Vec<RecipeRow> = sqlx::query_as(&sql)
            .bind(query.category.map(|c| c.as_str()))
            .bind(query.cursor)
            .bind(query.limit + 1)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            "Recipe page: sort={:?} category={:?} rows={}",
            query.sort,
            query.category,
            rows.len()
        );

        let recipes = rows.into_iter().map(Recipe::from).collect();
        Ok(Page::from_overfetch(recipes, query.limit, |r: &Recipe| r.id))
    }

    async fn all_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let rows: Vec<RecipeRow> =
            sqlx::query_as("SELECT * FROM recipes ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn get_recipe(&self, id: Uuid) -> Result<Option<Recipe>, AppError> {
        let row: Option<RecipeRow> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Recipe::from))
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO recipes
                (id, title, category, description, cook_time, servings, difficulty,
                 ingredients, steps, avg_rating, rating_count, author_name, author_id,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.title)
        .bind(recipe.category.map(|c| c.as_str()))
        .bind(&recipe.description)
        .bind(recipe.cook_time)
        .bind(recipe.servings)
        .bind(&recipe.difficulty)
        .bind(&recipe.ingredients)
        .bind(&recipe.steps)
        .bind(recipe.avg_rating)
        .bind(recipe.rating_count)
        .bind(&recipe.author_name)
        .bind(recipe.author_id)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted recipe {} ({})", recipe.id, recipe.title);
        Ok(())
    }

    async fn update_recipe(&self, id: Uuid, draft: RecipeDraft) -> Result<Recipe, AppError> {
        let row: Option<RecipeRow> = sqlx::query_as(
            r#"
            UPDATE recipes
            SET title = $1, category = $2, description = $3, cook_time = $4,
                servings = $5, difficulty = $6, ingredients = $7, steps = $8,
                updated_at = $9
            WHERE id = $10
            RETURNING *
            "#,
        )
        .bind(&draft.title)
        .bind(draft.category.map(|c| c.as_str()))
        .bind(&draft.description)
        .bind(draft.cook_time)
        .bind(draft.servings)
        .bind(&draft.difficulty)
        .bind(&draft.ingredients)
        .bind(&draft.steps)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Recipe::from)
            .ok_or_else(|| AppError::not_found(format!("Recipe {id} not found")))
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<bool, AppError> {
        // reviews and favorites go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(
        &self,
        recipe_id: Uuid,
        cursor: Option<Uuid>,
        limit: i64,
    ) -> Result<Page<Review>, AppError> {
        let rows: Vec<Review> = sqlx::query_as(
            r#"
            SELECT * FROM reviews
            WHERE recipe_id = $1
              AND ($2::uuid IS NULL OR (created_at, id) < (SELECT created_at, id FROM reviews WHERE id = $2))
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(recipe_id)
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(rows, limit, |r: &Review| r.id))
    }

    async fn get_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<Review>, AppError> {
        Ok(
            sqlx::query_as("SELECT * FROM reviews WHERE id = $1 AND recipe_id = $2")
                .bind(review_id)
                .bind(recipe_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn add_review(&self, review: NewReview) -> Result<(Review, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;

        let (recipe_title, current) = lock_rating(&mut tx, review.recipe_id).await?;
        let review = review.into_review();
        let updated = current.with_added(review.rating);

        sqlx::query(
            r#"
            INSERT INTO reviews (id, recipe_id, user_id, author_name, rating, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id)
        .bind(review.recipe_id)
        .bind(review.user_id)
        .bind(&review.author_name)
        .bind(review.rating)
        .bind(&review.text)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await?;

        store_rating(&mut tx, review.recipe_id, updated).await?;

        let entry = HistoryEntry::for_review(&review, &recipe_title);
        sqlx::query(
            r#"
            INSERT INTO history (id, user_id, kind, recipe_id, recipe_title, rating, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.kind)
        .bind(entry.recipe_id)
        .bind(&entry.recipe_title)
        .bind(entry.rating)
        .bind(&entry.text)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Review {} on recipe {}: avg {:.2} over {}",
            review.id, review.recipe_id, updated.avg_rating, updated.rating_count
        );
        Ok((review, updated))
    }

    async fn edit_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
        edit: ReviewEdit,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;

        let (_, current) = lock_rating(&mut tx, recipe_id).await?;
        let existing: Option<Review> =
            sqlx::query_as("SELECT * FROM reviews WHERE id = $1 AND recipe_id = $2")
                .bind(review_id)
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await?;
        let existing =
            existing.ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;

        let new_rating = edit.rating.map(|r| r.get()).unwrap_or(existing.rating);
        let updated = current.with_replaced(existing.rating, new_rating);

        let review: Review = sqlx::query_as(
            r#"
            UPDATE reviews SET text = $1, rating = $2, updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&edit.text)
        .bind(new_rating)
        .bind(Utc::now())
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

        if updated != current {
            store_rating(&mut tx, recipe_id, updated).await?;
        }

        tx.commit().await?;
        Ok((review, updated))
    }

    async fn delete_review(
        &self,
        recipe_id: Uuid,
        review_id: Uuid,
    ) -> Result<(Review, RatingSummary), AppError> {
        let mut tx = self.pool.begin().await?;

        let (_, current) = lock_rating(&mut tx, recipe_id).await?;
        let removed: Option<Review> =
            sqlx::query_as("DELETE FROM reviews WHERE id = $1 AND recipe_id = $2 RETURNING *")
                .bind(review_id)
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await?;
        let removed =
            removed.ok_or_else(|| AppError::not_found(format!("Review {review_id} not found")))?;

        let updated = current.with_removed(removed.rating);
        store_rating(&mut tx, recipe_id, updated).await?;

        tx.commit().await?;

        info!(
            "Deleted review {review_id} from recipe {recipe_id}: avg {:.2} over {}",
            updated.avg_rating, updated.rating_count
        );
        Ok((removed, updated))
    }

    async fn list_all_reviews(&self) -> Result<Vec<ModeratedReview>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT r.*, c.title AS recipe_title
            FROM reviews r
            JOIN recipes c ON c.id = r.recipe_id
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_favorite(
        &self,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> Result<Option<Favorite>, AppError> {
        let row: Option<FavoriteRow> =
            sqlx::query_as("SELECT * FROM favorites WHERE user_id = $1 AND recipe_id = $2")
                .bind(user_id)
                .bind(recipe_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Favorite::from))
    }

    async fn insert_favorite(&self, favorite: &Favorite) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO favorites (user_id, recipe_id, recipe_title, category, saved_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            "#,
        )
        .bind(favorite.user_id)
        .bind(favorite.recipe_id)
        .bind(&favorite.recipe_title)
        .bind(favorite.category.map(|c| c.as_str()))
        .bind(favorite.saved_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, AppError> {
        let rows: Vec<FavoriteRow> =
            sqlx::query_as("SELECT * FROM favorites WHERE user_id = $1 ORDER BY saved_at DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(sqlx::query_as(
            "SELECT * FROM history WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_history(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM history WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
