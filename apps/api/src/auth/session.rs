//! Session resolution. The session token is the user's id, held by the
//! client in the `session_uid` cookie or sent as a bearer token. It never
//! expires; removing it is the only way to log out.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_uid";

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads the raw session token, preferring `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// The session's user id. A bearer value that is not a user id does not
/// shadow a valid cookie.
pub fn session_user_id(headers: &HeaderMap) -> Option<Uuid> {
    let parse = |token: String| Uuid::parse_str(&token).ok();
    bearer_token(headers)
        .and_then(parse)
        .or_else(|| cookie_token(headers).and_then(parse))
}

pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(user_id) = session_user_id(&parts.headers) else {
        return Ok(None);
    };
    state.store.find_user(user_id).await
}

/// The caller, if logged in.
pub struct MaybeUser(pub Option<User>);

/// A logged-in caller; rejects with 401 otherwise.
pub struct CurrentUser(pub User);

/// A logged-in admin; 401 without a session, 403 for ordinary users.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Log in to continue".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_uid=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_uid=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(session_token(&headers).as_deref(), Some("header"));
    }

    #[test]
    fn test_malformed_bearer_falls_back_to_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("session_uid={id}")).unwrap(),
        );
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-uuid"));
        assert_eq!(session_user_id(&headers), Some(id));

        let other = Uuid::new_v4();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {other}")).unwrap(),
        );
        assert_eq!(session_user_id(&headers), Some(other));

        headers.remove(header::COOKIE);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer junk"));
        assert_eq!(session_user_id(&headers), None);
    }

    #[test]
    fn test_empty_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_uid="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        assert_eq!(
            session_cookie("u1", true),
            "session_uid=u1; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
