use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::session::{clear_session_cookie, session_cookie, session_token, MaybeUser};
use crate::auth::{login_user, register_user, LoginRequest, RegisterRequest};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub session_token: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: Option<User>,
}

fn session_response(state: &AppState, status: StatusCode, user: User) -> Response {
    let token = user.id.to_string();
    let cookie = session_cookie(&token, state.config.secure_cookies);
    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            user,
            session_token: token,
        }),
    )
        .into_response()
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let user = register_user(state.store.as_ref(), &state.config.password_salt, req).await?;
    Ok(session_response(&state, StatusCode::CREATED, user))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = login_user(state.store.as_ref(), &state.config.password_salt, req).await?;
    Ok(session_response(&state, StatusCode::OK, user))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}

/// GET /api/v1/auth/me
/// A token naming a deleted user is cleared from the client.
pub async fn handle_me(headers: HeaderMap, MaybeUser(user): MaybeUser) -> Response {
    if user.is_none() && session_token(&headers).is_some() {
        return (
            [(header::SET_COOKIE, clear_session_cookie())],
            Json(MeResponse { user: None }),
        )
            .into_response();
    }
    Json(MeResponse { user }).into_response()
}
