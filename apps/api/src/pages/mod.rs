//! Server-rendered screens. These never answer with an error body for
//! navigation problems; they redirect instead.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::MaybeUser;
use crate::errors::AppError;
use crate::recipes::listing::{title_matches, ListParams};
use crate::render::components::{
    admin_recipe_form, admin_recipe_table, admin_review_table, admin_user_table, auth_form,
    empty_state, favorite_item, history_item, listing_controls, load_more, rating_block,
    recipe_card, recipe_detail, review_card, review_form, profile_form, sort_value,
};
use crate::render::{element, page, text_element, LiveStreams, Markup};
use crate::state::AppState;

const FEED_STREAM: &str = "/api/v1/recipes/feed";

// ────────────────────────────────────────────────────────────────────────────
// Home
// ────────────────────────────────────────────────────────────────────────────

/// GET /
pub async fn home_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let query = match params.to_query(state.config.recipe_page_size) {
        Ok(query) => query,
        Err(AppError::Validation(_)) => return Ok(Redirect::to("/").into_response()),
        Err(e) => return Err(e),
    };
    let page_items = state.store.list_recipes(&query).await?;
    let term = params.search_term();

    let mut grid = Markup::new();
    for recipe in &page_items.items {
        grid.child(recipe_card(
            recipe,
            !title_matches(&recipe.title, term.as_deref()),
        ));
    }

    let mut body = Markup::new();
    body.child(listing_controls(query.category, query.sort, params.q.as_deref()));
    if page_items.items.is_empty() {
        body.child(empty_state("🍽️", "No recipes yet", None));
    } else {
        body.child(element("div", &[("class", Some("grid"))], grid));
    }

    let next = page_items.next_cursor.map(|cursor| {
        let category = query.category.map(|c| c.as_str()).unwrap_or("all");
        let mut href = format!(
            "/?category={category}&sort={}&cursor={cursor}",
            sort_value(query.sort)
        );
        if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
            href.push_str("&q=");
            href.push_str(&encode_query_value(q));
        }
        href
    });
    body.child(load_more(next.as_deref()));

    let live = LiveStreams {
        feed: Some(FEED_STREAM.to_string()),
        rating: None,
    };
    Ok(Html(page("Recipes", user.as_ref(), &live, body)).into_response())
}

/// Percent-encodes a value for a query string.
fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecipePageParams {
    pub id: Option<String>,
    pub cursor: Option<String>,
}

/// GET /recipe?id=
pub async fn recipe_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<RecipePageParams>,
) -> Result<Response, AppError> {
    let Some(id) = params.id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok()) else {
        return Ok(Redirect::to("/").into_response());
    };
    let Some(recipe) = state.store.get_recipe(id).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let is_favorite = match &user {
        Some(u) => Some(state.store.get_favorite(u.id, id).await?.is_some()),
        None => None,
    };
    let cursor = params.cursor.as_deref().and_then(|raw| Uuid::parse_str(raw).ok());
    let reviews = state
        .store
        .list_reviews(id, cursor, state.config.review_page_size)
        .await?;

    let mut list = Markup::new();
    if reviews.items.is_empty() {
        list.child(text_element(
            "p",
            &[("class", Some("hint"))],
            "No reviews yet. Be the first!",
        ));
    }
    for review in &reviews.items {
        list.child(review_card(review, user.as_ref()));
    }

    let mut body = Markup::new();
    body.child(recipe_detail(&recipe, is_favorite))
        .raw("<h2>Reviews</h2>")
        .child(rating_block(recipe.rating()))
        .child(review_form(id, user.is_some()))
        .child(element("div", &[("class", Some("reviews"))], list));
    let next = reviews
        .next_cursor
        .map(|c| format!("/recipe?id={id}&cursor={c}"));
    body.child(load_more(next.as_deref()));

    let live = LiveStreams {
        feed: None,
        rating: Some(format!("/api/v1/recipes/{id}/rating/stream")),
    };
    Ok(Html(page(&recipe.title, user.as_ref(), &live, body)).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TabParams {
    pub tab: Option<String>,
}

/// GET /profile?tab=history|favorites|settings
pub async fn profile_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<TabParams>,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth").into_response());
    };

    let tab = params.tab.as_deref().unwrap_or("history");
    let mut tabs = Markup::new();
    tabs.raw("<a href=\"/profile?tab=history\">History</a> ")
        .raw("<a href=\"/profile?tab=favorites\">Favorites</a> ")
        .raw("<a href=\"/profile?tab=settings\">Settings</a>");

    let mut body = Markup::new();
    body.child(text_element("h1", &[], user.display_name()))
        .child(text_element("p", &[], &user.email))
        .child(element("nav", &[("class", Some("tabs"))], tabs));

    match tab {
        "favorites" => {
            let favorites = state.store.list_favorites(user.id).await?;
            if favorites.is_empty() {
                body.child(empty_state(
                    "❤️",
                    "No favorites yet",
                    Some("Save the recipes you like"),
                ));
            } else {
                body.raw("<h2>Favorites</h2>");
                for favorite in &favorites {
                    body.child(favorite_item(favorite));
                }
            }
        }
        "settings" => {
            body.raw("<h2>Settings</h2>").child(profile_form(&user));
        }
        _ => {
            let history = state.store.list_history(user.id).await?;
            if history.is_empty() {
                body.child(empty_state(
                    "📝",
                    "No reviews yet",
                    Some("Open a recipe and share your opinion"),
                ));
            } else {
                body.raw("<h2>Review history</h2>");
                for entry in &history {
                    body.child(history_item(entry));
                }
            }
        }
    }

    Ok(Html(page("Profile", Some(&user), &LiveStreams::default(), body)).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AuthParams {
    pub mode: Option<String>,
}

/// GET /auth?mode=login|register
pub async fn auth_page(
    MaybeUser(user): MaybeUser,
    Query(params): Query<AuthParams>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    let register = params.mode.as_deref() == Some("register");
    let title = if register { "Sign up" } else { "Log in" };

    let mut body = Markup::new();
    body.child(text_element("h1", &[], title)).child(auth_form(register));
    Html(page(title, None, &LiveStreams::default(), body)).into_response()
}

// ────────────────────────────────────────────────────────────────────────────
// Admin
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AdminParams {
    pub section: Option<String>,
    /// Recipe id to edit, or `new`.
    pub edit: Option<String>,
}

/// GET /admin?section=recipes|users|reviews
pub async fn admin_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<AdminParams>,
) -> Result<Response, AppError> {
    let Some(user) = user else {
        return Ok(Redirect::to("/auth").into_response());
    };
    if !user.is_admin() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut sections = Markup::new();
    sections
        .raw("<a href=\"/admin?section=recipes\">Recipes</a> ")
        .raw("<a href=\"/admin?section=users\">Users</a> ")
        .raw("<a href=\"/admin?section=reviews\">Reviews</a>");

    let mut body = Markup::new();
    body.child(element("nav", &[("class", Some("tabs"))], sections));

    match params.section.as_deref().unwrap_or("recipes") {
        "users" => {
            let users = state.store.list_users().await?;
            body.raw("<h2>Users</h2>").child(admin_user_table(&users));
        }
        "reviews" => {
            let reviews = state.store.list_all_reviews().await?;
            body.raw("<h2>Reviews</h2>");
            if reviews.is_empty() {
                body.child(empty_state("💬", "No reviews", None));
            } else {
                body.child(admin_review_table(&reviews));
            }
        }
        _ => {
            match params.edit.as_deref() {
                Some("new") => {
                    body.child(admin_recipe_form(None));
                }
                Some(raw) => {
                    let existing = match Uuid::parse_str(raw) {
                        Ok(id) => state.store.get_recipe(id).await?,
                        Err(_) => None,
                    };
                    match existing {
                        Some(recipe) => {
                            body.child(admin_recipe_form(Some(&recipe)));
                        }
                        None => return Ok(Redirect::to("/admin?section=recipes").into_response()),
                    }
                }
                None => {}
            }
            let recipes = state.store.all_recipes().await?;
            body.raw("<h2>Recipes</h2><a class=\"btn primary\" href=\"/admin?section=recipes&amp;edit=new\">New recipe</a>");
            if recipes.is_empty() {
                body.child(empty_state("🍽️", "No recipes yet", None));
            } else {
                body.child(admin_recipe_table(&recipes));
            }
        }
    }

    Ok(Html(page("Admin", Some(&user), &LiveStreams::default(), body)).into_response())
}
