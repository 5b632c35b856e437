//! Back-office operations. Every route under `/api/v1/admin` requires an
//! admin session via the `AdminUser` extractor.

pub mod handlers;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::RecipeEvent;
use crate::models::recipe::{Recipe, RecipeDraft, RecipeInput};
use crate::models::user::User;
use crate::state::AppState;

/// Validates the form input and stores a new recipe authored by `admin`.
pub async fn create_recipe(
    state: &AppState,
    admin: &User,
    input: RecipeInput,
) -> Result<Recipe, AppError> {
    let recipe = RecipeDraft::try_from(input)?.into_recipe(admin);
    state.store.insert_recipe(&recipe).await?;
    info!("Admin {} created recipe {} ({})", admin.id, recipe.id, recipe.title);
    state.events.publish(RecipeEvent::created(&recipe));
    Ok(recipe)
}

/// Replaces the editable fields. Rating aggregate and author are kept.
pub async fn update_recipe(
    state: &AppState,
    recipe_id: Uuid,
    input: RecipeInput,
) -> Result<Recipe, AppError> {
    let draft = RecipeDraft::try_from(input)?;
    let recipe = state.store.update_recipe(recipe_id, draft).await?;
    info!("Recipe {recipe_id} updated");
    Ok(recipe)
}

pub async fn delete_recipe(state: &AppState, recipe_id: Uuid) -> Result<(), AppError> {
    if !state.store.delete_recipe(recipe_id).await? {
        return Err(AppError::not_found(format!("Recipe {recipe_id} not found")));
    }
    info!("Recipe {recipe_id} deleted");
    state.events.publish(RecipeEvent::RecipeDeleted { recipe_id });
    Ok(())
}

/// Flips `user` ↔ `admin`. An admin may demote themselves.
pub async fn toggle_role(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
    let role = user.role.toggled();
    let updated = state.store.set_user_role(user_id, role).await?;
    info!("User {user_id} role set to {}", role.as_str());
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::user::Role;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Config::default())
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            name: "Chef".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    fn input(title: &str) -> RecipeInput {
        RecipeInput {
            title: title.into(),
            category: Some("desserts".into()),
            description: Some("Sweet".into()),
            cook_time: Some(40),
            servings: Some(6),
            difficulty: None,
            ingredients: vec!["cream cheese\nsugar".into()],
            steps: vec!["mix".into(), "bake".into()],
        }
    }

    #[tokio::test]
    async fn test_create_recipe_publishes_event() {
        let state = state();
        let admin = user(Role::Admin);
        let mut rx = state.events.subscribe();

        let recipe = create_recipe(&state, &admin, input("Cheesecake")).await.unwrap();
        assert_eq!(recipe.rating_count, 0);
        assert_eq!(recipe.author_id, Some(admin.id));
        assert_eq!(recipe.ingredients, vec!["cream cheese", "sugar"]);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.recipe_id(), recipe.id);
        assert_eq!(event.name(), "recipe_created");
    }

    #[tokio::test]
    async fn test_update_keeps_rating() {
        let state = state();
        let admin = user(Role::Admin);
        let recipe = create_recipe(&state, &admin, input("Cheesecake")).await.unwrap();

        let updated = update_recipe(&state, recipe.id, input("New York cheesecake"))
            .await
            .unwrap();
        assert_eq!(updated.title, "New York cheesecake");
        assert_eq!(updated.created_at, recipe.created_at);
        assert_eq!(updated.rating_count, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_recipe() {
        let state = state();
        let err = delete_recipe(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_role_flips() {
        let state = state();
        let member = user(Role::User);
        state.store.insert_user(&member).await.unwrap();

        let promoted = toggle_role(&state, member.id).await.unwrap();
        assert!(promoted.is_admin());
        let demoted = toggle_role(&state, member.id).await.unwrap();
        assert_eq!(demoted.role, Role::User);
    }
}
