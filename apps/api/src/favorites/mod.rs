pub mod handlers;

use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::Favorite;
use crate::store::RecipeStore;

/// Flips the favorite state of `(user, recipe)` and returns the new state.
pub async fn toggle_favorite(
    store: &dyn RecipeStore,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<bool, AppError> {
    if store.get_favorite(user_id, recipe_id).await?.is_some() {
        store.delete_favorite(user_id, recipe_id).await?;
        debug!("User {user_id} unfavorited recipe {recipe_id}");
        return Ok(false);
    }

    let recipe = store
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id} not found")))?;
    store
        .insert_favorite(&Favorite::new(user_id, &recipe))
        .await?;
    debug!("User {user_id} favorited recipe {recipe_id}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::{RecipeDraft, RecipeInput};
    use crate::models::user::{Role, User};
    use crate::store::MemoryStore;
    use chrono::Utc;

    async fn seeded() -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let author = User {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            name: "A".into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: Utc::now(),
        };
        let recipe = RecipeDraft::try_from(RecipeInput {
            title: "Okroshka".into(),
            category: Some("soups".into()),
            description: None,
            cook_time: None,
            servings: None,
            difficulty: None,
            ingredients: vec![],
            steps: vec![],
        })
        .unwrap()
        .into_recipe(&author);
        store.insert_recipe(&recipe).await.unwrap();
        (store, recipe.id)
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let (store, recipe_id) = seeded().await;
        let user_id = Uuid::new_v4();

        assert!(toggle_favorite(&store, user_id, recipe_id).await.unwrap());
        let favs = store.list_favorites(user_id).await.unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].recipe_title, "Okroshka");

        assert!(!toggle_favorite(&store, user_id, recipe_id).await.unwrap());
        assert!(store.get_favorite(user_id, recipe_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_toggle_missing_recipe() {
        let (store, _) = seeded().await;
        let err = toggle_favorite(&store, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
