pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::auth::handlers as auth;
use crate::favorites::handlers as favorites;
use crate::pages;
use crate::profile;
use crate::recipes::handlers as recipes;
use crate::reviews::handlers as reviews;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pages
        .route("/", get(pages::home_page))
        .route("/recipe", get(pages::recipe_page))
        .route("/profile", get(pages::profile_page))
        .route("/auth", get(pages::auth_page))
        .route("/admin", get(pages::admin_page))
        // Session
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Recipes
        .route("/api/v1/recipes", get(recipes::handle_list_recipes))
        .route("/api/v1/recipes/feed", get(recipes::handle_recipe_feed))
        .route("/api/v1/recipes/:id", get(recipes::handle_get_recipe))
        .route(
            "/api/v1/recipes/:id/rating/stream",
            get(recipes::handle_rating_stream),
        )
        .route(
            "/api/v1/recipes/:id/reviews",
            get(reviews::handle_list_reviews).post(reviews::handle_create_review),
        )
        .route(
            "/api/v1/recipes/:id/reviews/:review_id",
            patch(reviews::handle_edit_review).delete(reviews::handle_delete_review),
        )
        .route(
            "/api/v1/recipes/:id/favorite",
            post(favorites::handle_toggle_favorite),
        )
        // Caller's own data
        .route("/api/v1/me", patch(profile::handle_update_profile))
        .route("/api/v1/me/favorites", get(favorites::handle_list_favorites))
        .route(
            "/api/v1/me/favorites/:recipe_id",
            delete(favorites::handle_remove_favorite),
        )
        .route("/api/v1/me/history", get(profile::handle_list_history))
        .route(
            "/api/v1/me/history/:entry_id",
            delete(profile::handle_delete_history),
        )
        // Back office
        .route(
            "/api/v1/admin/recipes",
            get(admin::handle_list_recipes).post(admin::handle_create_recipe),
        )
        .route(
            "/api/v1/admin/recipes/:id",
            get(admin::handle_get_recipe)
                .put(admin::handle_update_recipe)
                .delete(admin::handle_delete_recipe),
        )
        .route("/api/v1/admin/users", get(admin::handle_list_users))
        .route(
            "/api/v1/admin/users/:id/role",
            post(admin::handle_toggle_role),
        )
        .route("/api/v1/admin/reviews", get(admin::handle_list_reviews))
        .route(
            "/api/v1/admin/reviews/:recipe_id/:review_id",
            delete(admin::handle_delete_review),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::user::Role;
    use crate::store::{MemoryStore, RecipeStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        router: Router,
        store: Arc<MemoryStore>,
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Vec<u8>,
    }

    impl Reply {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap()
        }

        fn text(&self) -> String {
            String::from_utf8(self.body.clone()).unwrap()
        }
    }

    fn app_with(config: Config) -> TestApp {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        TestApp {
            router: build_router(state),
            store,
        }
    }

    fn app() -> TestApp {
        app_with(Config::default())
    }

    impl TestApp {
        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> Reply {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            Reply {
                status,
                headers,
                body: body.to_vec(),
            }
        }

        async fn register(&self, email: &str, name: &str) -> String {
            let reply = self
                .call(
                    Method::POST,
                    "/api/v1/auth/register",
                    None,
                    Some(json!({"email": email, "password": "secret1", "name": name})),
                )
                .await;
            assert_eq!(reply.status, StatusCode::CREATED);
            reply.json()["session_token"].as_str().unwrap().to_string()
        }

        async fn admin(&self) -> String {
            let token = self.register("admin@example.com", "Admin").await;
            let id = Uuid::parse_str(&token).unwrap();
            self.store.set_user_role(id, Role::Admin).await.unwrap();
            token
        }

        async fn create_recipe(&self, admin: &str, title: &str) -> String {
            let reply = self
                .call(
                    Method::POST,
                    "/api/v1/admin/recipes",
                    Some(admin),
                    Some(json!({
                        "title": title,
                        "category": "soups",
                        "ingredients": ["beet", "  ", "cabbage"],
                        "steps": ["boil"]
                    })),
                )
                .await;
            assert_eq!(reply.status, StatusCode::CREATED);
            reply.json()["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let reply = app().call(Method::GET, "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json()["service"], "recipebook");
    }

    #[tokio::test]
    async fn test_register_login_and_session_cookie() {
        let app = app();
        let reply = app
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({"email": "Ann@Example.com", "password": "secret1", "name": "Ann"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        let body = reply.json();
        assert_eq!(body["user"]["email"], "ann@example.com");
        assert!(body["user"].get("password_hash").is_none());
        let token = body["session_token"].as_str().unwrap().to_string();
        assert_eq!(body["user"]["id"], token.as_str());
        let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("session_uid={token}")));

        let dup = app
            .call(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({"email": "ann@example.com", "password": "secret1", "name": "Ann"})),
            )
            .await;
        assert_eq!(dup.status, StatusCode::CONFLICT);

        let wrong = app
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ann@example.com", "password": "nope123"})),
            )
            .await;
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

        let unknown = app
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "bob@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);

        let ok = app
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"email": "ANN@example.com", "password": "secret1"})),
            )
            .await;
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.json()["session_token"], token.as_str());

        let me = app.call(Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(me.json()["user"]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_review_aggregate_through_api() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Borscht").await;
        let alice = app.register("alice@example.com", "Alice").await;
        let bob = app.register("bob@example.com", "Bob").await;
        let reviews_uri = format!("/api/v1/recipes/{recipe_id}/reviews");

        let first = app
            .call(
                Method::POST,
                &reviews_uri,
                Some(&alice),
                Some(json!({"rating": 5, "text": "Excellent soup"})),
            )
            .await;
        assert_eq!(first.status, StatusCode::CREATED);
        let alice_review = first.json()["review"]["id"].as_str().unwrap().to_string();

        let second = app
            .call(
                Method::POST,
                &reviews_uri,
                Some(&bob),
                Some(json!({"rating": 2, "text": "Too salty"})),
            )
            .await;
        assert_eq!(second.json()["rating"]["rating_count"], 2);
        assert_eq!(second.json()["rating"]["avg_rating"], 3.5);

        let bad = app
            .call(
                Method::POST,
                &reviews_uri,
                Some(&bob),
                Some(json!({"rating": 6, "text": "Way off the scale"})),
            )
            .await;
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let review_uri = format!("{reviews_uri}/{alice_review}");
        let text_only = app
            .call(
                Method::PATCH,
                &review_uri,
                Some(&alice),
                Some(json!({"text": "Excellent soup, again"})),
            )
            .await;
        assert_eq!(text_only.status, StatusCode::OK);
        assert_eq!(text_only.json()["rating"]["avg_rating"], 3.5);

        let not_author = app
            .call(
                Method::PATCH,
                &review_uri,
                Some(&bob),
                Some(json!({"text": "Hijacked review"})),
            )
            .await;
        assert_eq!(not_author.status, StatusCode::FORBIDDEN);

        let removed = app
            .call(Method::DELETE, &review_uri, Some(&alice), None)
            .await;
        assert_eq!(removed.json()["rating"]["rating_count"], 1);
        assert_eq!(removed.json()["rating"]["avg_rating"], 2.0);

        let detail = app
            .call(Method::GET, &format!("/api/v1/recipes/{recipe_id}"), None, None)
            .await;
        assert_eq!(detail.json()["recipe"]["rating_count"], 1);
        assert!(detail.json()["is_favorite"].is_null());

        let history = app
            .call(Method::GET, "/api/v1/me/history", Some(&bob), None)
            .await;
        assert_eq!(history.json()[0]["recipe_title"], "Borscht");
    }

    #[tokio::test]
    async fn test_review_pages_and_rating_edit() {
        let app = app_with(Config {
            review_page_size: 2,
            ..Config::default()
        });
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Okroshka").await;
        let reviews_uri = format!("/api/v1/recipes/{recipe_id}/reviews");

        let mut first_review = None;
        let mut first_author = None;
        for (i, rating) in [1, 3, 4, 4, 3].into_iter().enumerate() {
            let user = app
                .register(&format!("cook{i}@example.com"), &format!("Cook {i}"))
                .await;
            let reply = app
                .call(
                    Method::POST,
                    &reviews_uri,
                    Some(&user),
                    Some(json!({"rating": rating, "text": "Cold and fresh"})),
                )
                .await;
            assert_eq!(reply.status, StatusCode::CREATED);
            if i == 0 {
                first_review = reply.json()["review"]["id"].as_str().map(str::to_string);
                first_author = Some(user);
            }
        }

        let mut sizes = Vec::new();
        let mut flags = Vec::new();
        let mut ids = Vec::new();
        let mut uri = reviews_uri.clone();
        loop {
            let body = app.call(Method::GET, &uri, None, None).await.json();
            let page = body["reviews"].as_array().unwrap().clone();
            sizes.push(page.len());
            flags.push(body["has_more"].as_bool().unwrap());
            ids.extend(page.iter().map(|r| r["id"].as_str().unwrap().to_string()));
            match body["next_cursor"].as_str() {
                Some(cursor) => uri = format!("{reviews_uri}?cursor={cursor}"),
                None => break,
            }
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(flags, vec![true, true, false]);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        let edited = app
            .call(
                Method::PATCH,
                &format!("{reviews_uri}/{}", first_review.unwrap()),
                first_author.as_deref(),
                Some(json!({"text": "Grew on me", "rating": 5})),
            )
            .await;
        assert_eq!(edited.status, StatusCode::OK);
        let body = edited.json();
        assert_eq!(body["review"]["rating"], 5);
        assert_eq!(body["rating"]["rating_count"], 5);
        let avg = body["rating"]["avg_rating"].as_f64().unwrap();
        assert!((avg - 3.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rating_stream_starts_with_current_summary() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Kvass").await;
        let user = app.register("taster@example.com", "Taster").await;
        app.call(
            Method::POST,
            &format!("/api/v1/recipes/{recipe_id}/reviews"),
            Some(&user),
            Some(json!({"rating": 4, "text": "Refreshing"})),
        )
        .await;

        let request = Request::builder()
            .uri(format!("/api/v1/recipes/{recipe_id}/rating/stream"))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut frames = response.into_body().into_data_stream();
        let first = frames.next().await.unwrap().unwrap();
        let frame = String::from_utf8(first.to_vec()).unwrap();
        assert!(frame.contains("event: rating_changed"));
        assert!(frame.contains("\"rating_count\":1"));

        let missing = app
            .call(
                Method::GET,
                &format!("/api/v1/recipes/{}/rating/stream", Uuid::new_v4()),
                None,
                None,
            )
            .await;
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_last_page_hides_load_more() {
        let app = app_with(Config {
            recipe_page_size: 2,
            ..Config::default()
        });
        let admin = app.admin().await;
        for title in ["Shchi", "Solyanka", "Ukha"] {
            app.create_recipe(&admin, title).await;
        }

        let first = app.call(Method::GET, "/api/v1/recipes", None, None).await;
        let body = first.json();
        assert_eq!(body["recipes"].as_array().unwrap().len(), 2);
        assert_eq!(body["has_more"], true);
        let cursor = body["next_cursor"].as_str().unwrap().to_string();

        let second = app
            .call(Method::GET, &format!("/api/v1/recipes?cursor={cursor}"), None, None)
            .await;
        let body = second.json();
        assert_eq!(body["recipes"].as_array().unwrap().len(), 1);
        assert_eq!(body["has_more"], false);
        assert!(body["next_cursor"].is_null());

        let home = app.call(Method::GET, "/", None, None).await;
        assert!(home.text().contains("Load more"));
        let last = app
            .call(Method::GET, &format!("/?cursor={cursor}"), None, None)
            .await;
        assert_eq!(last.status, StatusCode::OK);
        assert!(!last.text().contains("Load more"));
    }

    #[tokio::test]
    async fn test_search_only_filters_current_page() {
        let app = app();
        let admin = app.admin().await;
        app.create_recipe(&admin, "Borscht").await;
        app.create_recipe(&admin, "Pelmeni").await;

        let reply = app
            .call(Method::GET, "/api/v1/recipes?q=BORS", None, None)
            .await;
        let recipes = reply.json()["recipes"].as_array().unwrap().clone();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["title"], "Borscht");

        let html = app.call(Method::GET, "/?q=bors", None, None).await.text();
        assert_eq!(html.matches("class=\"card\"").count(), 2);
        assert_eq!(html.matches("hidden=\"\"").count(), 1);
    }

    #[tokio::test]
    async fn test_favorite_toggle_twice() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Blini").await;
        let user = app.register("fan@example.com", "Fan").await;
        let uri = format!("/api/v1/recipes/{recipe_id}/favorite");

        let on = app.call(Method::POST, &uri, Some(&user), None).await;
        assert_eq!(on.json()["favorited"], true);
        let favs = app
            .call(Method::GET, "/api/v1/me/favorites", Some(&user), None)
            .await;
        assert_eq!(favs.json().as_array().unwrap().len(), 1);

        let off = app.call(Method::POST, &uri, Some(&user), None).await;
        assert_eq!(off.json()["favorited"], false);
        let detail = app
            .call(Method::GET, &format!("/api/v1/recipes/{recipe_id}"), Some(&user), None)
            .await;
        assert_eq!(detail.json()["is_favorite"], false);

        let anon = app.call(Method::POST, &uri, None, None).await;
        assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin() {
        let app = app();
        let user = app.register("user@example.com", "User").await;

        let anon = app.call(Method::GET, "/api/v1/admin/users", None, None).await;
        assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
        let plain = app
            .call(Method::GET, "/api/v1/admin/users", Some(&user), None)
            .await;
        assert_eq!(plain.status, StatusCode::FORBIDDEN);
        assert_eq!(plain.json()["error"]["code"], "FORBIDDEN");

        let admin = app.admin().await;
        let toggled = app
            .call(
                Method::POST,
                &format!("/api/v1/admin/users/{user}/role"),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(toggled.json()["role"], "admin");
    }

    #[tokio::test]
    async fn test_moderation_deletes_with_aggregate() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Kvass").await;
        let user = app.register("drinker@example.com", "Drinker").await;
        app.call(
            Method::POST,
            &format!("/api/v1/recipes/{recipe_id}/reviews"),
            Some(&user),
            Some(json!({"rating": 4, "text": "Refreshing"})),
        )
        .await;

        let all = app
            .call(Method::GET, "/api/v1/admin/reviews", Some(&admin), None)
            .await;
        let entry = all.json()[0].clone();
        assert_eq!(entry["recipe_title"], "Kvass");
        let review_id = entry["id"].as_str().unwrap().to_string();

        let removed = app
            .call(
                Method::DELETE,
                &format!("/api/v1/admin/reviews/{recipe_id}/{review_id}"),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(removed.json()["rating"]["rating_count"], 0);
        assert_eq!(removed.json()["rating"]["avg_rating"], 0.0);
    }

    #[tokio::test]
    async fn test_profile_rename_and_history_delete() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app.create_recipe(&admin, "Syrniki").await;
        let user = app.register("cook@example.com", "Cook").await;

        let blank = app
            .call(Method::PATCH, "/api/v1/me", Some(&user), Some(json!({"name": "   "})))
            .await;
        assert_eq!(blank.status, StatusCode::BAD_REQUEST);
        let renamed = app
            .call(Method::PATCH, "/api/v1/me", Some(&user), Some(json!({"name": " Chef "})))
            .await;
        assert_eq!(renamed.json()["name"], "Chef");

        app.call(
            Method::POST,
            &format!("/api/v1/recipes/{recipe_id}/reviews"),
            Some(&user),
            Some(json!({"rating": 5, "text": "Just like grandma's"})),
        )
        .await;
        let history = app
            .call(Method::GET, "/api/v1/me/history", Some(&user), None)
            .await;
        let entry_id = history.json()[0]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/me/history/{entry_id}");

        let foreign = app.call(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(foreign.status, StatusCode::NOT_FOUND);
        let own = app.call(Method::DELETE, &uri, Some(&user), None).await;
        assert_eq!(own.status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_pages_escape_and_redirect() {
        let app = app();
        let admin = app.admin().await;
        let recipe_id = app
            .create_recipe(&admin, "<script>alert('x')</script>")
            .await;

        let page = app
            .call(Method::GET, &format!("/recipe?id={recipe_id}"), None, None)
            .await;
        assert_eq!(page.status, StatusCode::OK);
        let html = page.text();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));

        let missing = app
            .call(Method::GET, &format!("/recipe?id={}", Uuid::new_v4()), None, None)
            .await;
        assert_eq!(missing.status, StatusCode::SEE_OTHER);
        assert_eq!(missing.headers[header::LOCATION], "/");

        let no_id = app.call(Method::GET, "/recipe", None, None).await;
        assert_eq!(no_id.headers[header::LOCATION], "/");

        let profile = app.call(Method::GET, "/profile", None, None).await;
        assert_eq!(profile.headers[header::LOCATION], "/auth");

        let user = app.register("plain@example.com", "Plain").await;
        let admin_page = app.call(Method::GET, "/admin", Some(&user), None).await;
        assert_eq!(admin_page.headers[header::LOCATION], "/");
        let auth_page = app.call(Method::GET, "/auth", Some(&user), None).await;
        assert_eq!(auth_page.headers[header::LOCATION], "/");

        let admin_view = app
            .call(Method::GET, "/admin?section=recipes", Some(&admin), None)
            .await;
        assert_eq!(admin_view.status, StatusCode::OK);
        assert!(!admin_view.text().contains("<script>alert"));
    }
}
