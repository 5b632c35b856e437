pub mod handlers;
pub mod password;
pub mod session;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::store::RecipeStore;

use password::{hash_password, normalize_email, verify_password};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn check_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Fill in all fields"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates an account. The email pre-check mirrors the user-facing error;
/// the store still enforces uniqueness for concurrent registrations.
pub async fn register_user(
    store: &dyn RecipeStore,
    salt: &str,
    req: RegisterRequest,
) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    check_credentials(&email, &req.password)?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Enter your name"));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "This email is already registered".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        email,
        name,
        password_hash: hash_password(salt, &req.password),
        role: Role::User,
        created_at: Utc::now(),
    };
    store.insert_user(&user).await?;

    info!("Registered user {} <{}>", user.id, user.email);
    Ok(user)
}

pub async fn login_user(
    store: &dyn RecipeStore,
    salt: &str,
    req: LoginRequest,
) -> Result<User, AppError> {
    let email = normalize_email(&req.email);
    check_credentials(&email, &req.password)?;

    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if !verify_password(salt, &req.password, &user.password_hash) {
        warn!("Failed login for user {}", user.id);
        return Err(AppError::Unauthorized("Wrong password".to_string()));
    }

    info!("User {} logged in", user.id);
    Ok(user)
}
