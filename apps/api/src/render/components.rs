use uuid::Uuid;

use crate::models::activity::{Favorite, HistoryEntry};
use crate::models::recipe::{Category, Recipe, SortField};
use crate::models::review::{ModeratedReview, Review};
use crate::models::user::User;
use crate::ratings::RatingSummary;
use crate::render::{element, format_date, or_dash, pluralize, stars, text_element, Markup};

const FALLBACK_EMOJI: &str = "🍽️";

fn category_emoji(category: Option<Category>) -> &'static str {
    category.map(Category::emoji).unwrap_or(FALLBACK_EMOJI)
}

fn category_label(category: Option<Category>) -> String {
    or_dash(category.map(Category::label))
}

pub fn empty_state(icon: &str, title: &str, hint: Option<&str>) -> Markup {
    let mut inner = Markup::new();
    inner
        .child(text_element("p", &[], icon))
        .child(text_element("h3", &[], title));
    if let Some(hint) = hint {
        inner.child(text_element("p", &[], hint));
    }
    element("div", &[("class", Some("empty"))], inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Listing
// ────────────────────────────────────────────────────────────────────────────

/// A recipe card. `hidden` is set when the card does not match the
/// in-page title search.
pub fn recipe_card(recipe: &Recipe, hidden: bool) -> Markup {
    let href = format!("/recipe?id={}", recipe.id);
    let title_key = recipe.title.to_lowercase();
    let count = if recipe.rating_count > 0 {
        format!("({})", recipe.rating_count)
    } else {
        "no ratings".to_string()
    };

    let mut meta = Markup::new();
    meta.child(text_element(
        "span",
        &[],
        &format!("⏱ {} min", or_dash(recipe.cook_time)),
    ))
    .child(text_element(
        "span",
        &[],
        &format!(" 🍽 {} servings", or_dash(recipe.servings)),
    ));

    let mut rating = Markup::new();
    rating
        .child(text_element("span", &[("class", Some("stars"))], &stars(recipe.avg_rating)))
        .child(text_element("span", &[("class", Some("rating-n"))], &count));

    let mut body = Markup::new();
    body.child(text_element("div", &[("class", Some("card-thumb"))], category_emoji(recipe.category)))
        .child(text_element("span", &[("class", Some("card-cat"))], &category_label(recipe.category)))
        .child(text_element("h3", &[("class", Some("card-title"))], &recipe.title))
        .child(element("div", &[("class", Some("card-meta"))], meta))
        .child(element("div", &[("class", Some("card-rating"))], rating));

    element(
        "a",
        &[
            ("class", Some("card")),
            ("href", Some(href.as_str())),
            ("data-title", Some(title_key.as_str())),
            ("hidden", hidden.then_some("")),
        ],
        body,
    )
}

/// Category tabs, sort selector and the title search box.
pub fn listing_controls(active: Option<Category>, sort: SortField, q: Option<&str>) -> Markup {
    let sort_param = sort_value(sort);

    let mut tabs = Markup::new();
    let all_href = format!("/?sort={sort_param}");
    tabs.child(text_element(
        "a",
        &[
            ("href", Some(all_href.as_str())),
            ("class", active.is_none().then_some("active")),
        ],
        "All",
    ));
    for category in Category::ALL {
        let href = format!("/?category={}&sort={sort_param}", category.as_str());
        tabs.child(text_element(
            "a",
            &[
                ("href", Some(href.as_str())),
                ("class", (active == Some(category)).then_some("active")),
            ],
            &format!("{} {}", category.emoji(), category.label()),
        ));
    }

    let mut options = Markup::new();
    for (field, label) in [
        (SortField::CreatedAt, "Newest"),
        (SortField::AvgRating, "Top rated"),
        (SortField::RatingCount, "Most reviewed"),
    ] {
        options.child(text_element(
            "option",
            &[
                ("value", Some(sort_value(field))),
                ("selected", (field == sort).then_some("")),
            ],
            label,
        ));
    }

    let mut form = Markup::new();
    form.child(element(
        "select",
        &[("name", Some("sort")), ("onchange", Some("this.form.submit()"))],
        options,
    ))
    .child(element(
        "input",
        &[
            ("type", Some("hidden")),
            ("name", Some("category")),
            ("value", Some(active.map(Category::as_str).unwrap_or("all"))),
        ],
        Markup::new(),
    ))
    .child(element(
        "input",
        &[
            ("type", Some("search")),
            ("name", Some("q")),
            ("placeholder", Some("Search this page")),
            ("value", q),
        ],
        Markup::new(),
    ));

    let mut controls = Markup::new();
    controls
        .child(element("div", &[("class", Some("tabs"))], tabs))
        .child(element("form", &[("method", Some("get")), ("action", Some("/"))], form));
    controls
}

pub fn sort_value(sort: SortField) -> &'static str {
    sort.column()
}

/// "Load more" link, or nothing once the last page has been shown.
pub fn load_more(href: Option<&str>) -> Markup {
    match href {
        Some(href) => text_element(
            "a",
            &[("class", Some("btn load-more")), ("href", Some(href))],
            "Load more",
        ),
        None => Markup::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe detail
// ────────────────────────────────────────────────────────────────────────────

pub fn recipe_detail(recipe: &Recipe, is_favorite: Option<bool>) -> Markup {
    let mut info = Markup::new();
    for (label, value) in [
        ("Time", format!("{} min", or_dash(recipe.cook_time))),
        ("Servings", or_dash(recipe.servings)),
        ("Difficulty", or_dash(recipe.difficulty.as_deref())),
        ("Author", or_dash(Some(recipe.author_name.as_str()))),
    ] {
        let mut cell = Markup::new();
        cell.child(text_element("strong", &[], label)).raw(" ").text(&value);
        info.child(element("div", &[], cell));
    }

    let mut ingredients = Markup::new();
    for line in &recipe.ingredients {
        ingredients.child(text_element("li", &[], line));
    }
    let mut steps = Markup::new();
    for line in &recipe.steps {
        steps.child(text_element("li", &[], line));
    }

    let mut out = Markup::new();
    out.child(text_element(
        "div",
        &[("class", Some("eyebrow"))],
        recipe.category.map(Category::label).unwrap_or("Recipe"),
    ))
    .child(text_element("h1", &[("class", Some("recipe-title"))], &recipe.title))
    .child(text_element("div", &[("class", Some("hero-thumb"))], category_emoji(recipe.category)))
    .child(element("div", &[("class", Some("info-bar"))], info));
    if !recipe.description.is_empty() {
        out.child(text_element("p", &[("class", Some("desc"))], &recipe.description));
    }
    out.raw("<h2>Ingredients</h2>")
        .child(element("ul", &[("class", Some("ingredients"))], ingredients))
        .raw("<h2>Method</h2>")
        .child(element("ol", &[("class", Some("steps"))], steps));

    if let Some(is_favorite) = is_favorite {
        let action = format!("/api/v1/recipes/{}/favorite", recipe.id);
        out.child(text_element(
            "button",
            &[("class", Some("btn outline")), ("data-action", Some(action.as_str()))],
            if is_favorite {
                "💔 Remove from favorites"
            } else {
                "❤️ Add to favorites"
            },
        ));
    }
    out
}

pub fn rating_block(summary: RatingSummary) -> Markup {
    let count = i64::from(summary.rating_count);
    let label = pluralize(count, "review", "reviews");
    let noun = label.trim_start_matches(|c: char| c.is_ascii_digit()).trim_start();

    let mut sub = Markup::new();
    sub.child(text_element("span", &[("id", Some("count"))], &count.to_string()))
        .raw(" ")
        .text(noun);

    let mut stars_col = Markup::new();
    stars_col
        .child(text_element("div", &[("class", Some("stars lg"))], &stars(summary.avg_rating)))
        .child(element("div", &[("class", Some("rating-sub"))], sub));

    let mut block = Markup::new();
    block
        .child(text_element(
            "span",
            &[("class", Some("avg-num")), ("id", Some("avg"))],
            &format!("{:.1}", summary.avg_rating),
        ))
        .child(element("div", &[], stars_col));
    element("div", &[("class", Some("avg-rating"))], block)
}

pub fn review_form(recipe_id: Uuid, logged_in: bool) -> Markup {
    if !logged_in {
        let mut hint = Markup::new();
        hint.raw("<a href=\"/auth\">Log in</a> to leave a review");
        return element("p", &[("class", Some("hint"))], hint);
    }

    let action = format!("/api/v1/recipes/{recipe_id}/reviews");
    let mut options = Markup::new();
    for n in (1..=5).rev() {
        let value = n.to_string();
        options.child(text_element(
            "option",
            &[("value", Some(value.as_str()))],
            &"★".repeat(n),
        ));
    }

    let mut form = Markup::new();
    form.child(element("select", &[("name", Some("rating"))], options))
        .raw("<textarea name=\"text\" minlength=\"5\" placeholder=\"Share your experience\" required></textarea>")
        .raw("<button class=\"btn primary\" type=\"submit\">Publish</button><p class=\"error\"></p>");
    element(
        "form",
        &[("data-action", Some(action.as_str())), ("data-numbers", Some("rating"))],
        form,
    )
}

/// One review. Authors get edit and delete controls; admins get delete.
pub fn review_card(review: &Review, viewer: Option<&User>) -> Markup {
    let mine = viewer.is_some_and(|u| u.id == review.user_id);
    let can_delete = mine || viewer.is_some_and(User::is_admin);

    let mut who = Markup::new();
    who.child(text_element("strong", &[], &review.author_name))
        .raw(" ")
        .child(text_element("span", &[("class", Some("stars"))], &stars(f64::from(review.rating))));

    let mut head = Markup::new();
    head.child(element("div", &[], who)).child(text_element(
        "span",
        &[("class", Some("rev-date"))],
        &format_date(&review.created_at),
    ));

    let mut card = Markup::new();
    card.child(element("div", &[("class", Some("rev-head"))], head))
        .child(text_element("p", &[("class", Some("rev-text"))], &review.text));

    let target = format!(
        "/api/v1/recipes/{}/reviews/{}",
        review.recipe_id, review.id
    );
    if mine {
        let mut edit = Markup::new();
        edit.child(element(
            "textarea",
            &[("name", Some("text")), ("minlength", Some("5"))],
            Markup::from(review.text.as_str()),
        ))
        .raw("<button class=\"btn sm ghost\" type=\"submit\">Save</button><p class=\"error\"></p>");
        let mut details = Markup::new();
        details.raw("<summary>Edit</summary>").child(element(
            "form",
            &[("data-action", Some(target.as_str())), ("data-method", Some("PATCH"))],
            edit,
        ));
        card.child(element("details", &[], details));
    }
    if can_delete {
        card.child(text_element(
            "button",
            &[
                ("class", Some("btn sm danger")),
                ("data-action", Some(target.as_str())),
                ("data-method", Some("DELETE")),
                ("data-confirm", Some("Delete this review?")),
            ],
            "Delete",
        ));
    }

    let id = format!("rev_{}", review.id);
    element("div", &[("class", Some("review-card")), ("id", Some(id.as_str()))], card)
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

pub fn history_item(entry: &HistoryEntry) -> Markup {
    let href = format!("/recipe?id={}", entry.recipe_id);
    let delete = format!("/api/v1/me/history/{}", entry.id);

    let mut item = Markup::new();
    item.child(text_element("a", &[("href", Some(href.as_str()))], &entry.recipe_title))
        .child(text_element("span", &[("class", Some("stars"))], &stars(f64::from(entry.rating))))
        .child(text_element("p", &[], &entry.text))
        .child(text_element("div", &[("class", Some("hist-date"))], &format_date(&entry.created_at)))
        .child(text_element(
            "button",
            &[
                ("class", Some("btn sm ghost")),
                ("data-action", Some(delete.as_str())),
                ("data-method", Some("DELETE")),
            ],
            "Remove",
        ));
    element("div", &[("class", Some("hist-item"))], item)
}

pub fn favorite_item(favorite: &Favorite) -> Markup {
    let href = format!("/recipe?id={}", favorite.recipe_id);
    let delete = format!("/api/v1/me/favorites/{}", favorite.recipe_id);

    let mut item = Markup::new();
    item.child(text_element("span", &[], category_emoji(favorite.category)))
        .child(text_element("a", &[("href", Some(href.as_str()))], &favorite.recipe_title))
        .child(text_element("div", &[("class", Some("hist-date"))], &format_date(&favorite.saved_at)))
        .child(text_element(
            "button",
            &[
                ("class", Some("btn sm ghost")),
                ("data-action", Some(delete.as_str())),
                ("data-method", Some("DELETE")),
            ],
            "Remove",
        ));
    element("div", &[("class", Some("hist-item"))], item)
}

pub fn profile_form(user: &User) -> Markup {
    let mut form = Markup::new();
    form.raw("<label>Display name ")
        .child(element(
            "input",
            &[("name", Some("name")), ("value", Some(user.name.as_str())), ("required", Some(""))],
            Markup::new(),
        ))
        .raw("</label><button class=\"btn primary\" type=\"submit\">Save</button><p class=\"error\"></p>");
    element(
        "form",
        &[("data-action", Some("/api/v1/me")), ("data-method", Some("PATCH"))],
        form,
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

pub fn auth_form(register: bool) -> Markup {
    let (action, submit, switch) = if register {
        (
            "/api/v1/auth/register",
            "Sign up",
            "<a href=\"/auth\">I already have an account</a>",
        )
    } else {
        (
            "/api/v1/auth/login",
            "Log in",
            "<a href=\"/auth?mode=register\">Create an account</a>",
        )
    };

    let mut form = Markup::new();
    if register {
        form.raw("<input name=\"name\" placeholder=\"Name\" required>");
    }
    form.raw("<input name=\"email\" type=\"email\" placeholder=\"Email\" required>")
        .raw("<input name=\"password\" type=\"password\" minlength=\"6\" placeholder=\"Password\" required>")
        .child(text_element("button", &[("class", Some("btn primary")), ("type", Some("submit"))], submit))
        .raw("<p class=\"error\"></p>");

    let mut out = Markup::new();
    out.child(element(
        "form",
        &[("data-action", Some(action)), ("data-next", Some("/"))],
        form,
    ))
    .raw(switch);
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Admin
// ────────────────────────────────────────────────────────────────────────────

fn table(headers: &[&'static str], rows: Markup) -> Markup {
    let mut head = Markup::new();
    for h in headers {
        head.child(text_element("th", &[], h));
    }
    let mut t = Markup::new();
    t.child(element("thead", &[], element("tr", &[], head)))
        .child(element("tbody", &[], rows));
    element("table", &[], t)
}

fn delete_button(action: &str, confirm: &str) -> Markup {
    text_element(
        "button",
        &[
            ("class", Some("btn sm danger")),
            ("data-action", Some(action)),
            ("data-method", Some("DELETE")),
            ("data-confirm", Some(confirm)),
        ],
        "Delete",
    )
}

pub fn admin_recipe_table(recipes: &[Recipe]) -> Markup {
    let mut rows = Markup::new();
    for recipe in recipes {
        let edit = format!("/admin?section=recipes&edit={}", recipe.id);
        let delete = format!("/api/v1/admin/recipes/{}", recipe.id);
        let mut actions = Markup::new();
        actions
            .child(text_element("a", &[("href", Some(edit.as_str()))], "Edit"))
            .raw(" ")
            .child(delete_button(&delete, "Delete this recipe and all its reviews?"));

        let mut row = Markup::new();
        row.child(text_element("td", &[], &recipe.title))
            .child(text_element("td", &[], &category_label(recipe.category)))
            .child(text_element(
                "td",
                &[],
                &format!("{:.1} ({})", recipe.avg_rating, recipe.rating_count),
            ))
            .child(text_element("td", &[], &format_date(&recipe.created_at)))
            .child(element("td", &[], actions));
        rows.child(element("tr", &[], row));
    }
    table(&["Title", "Category", "Rating", "Created", ""], rows)
}

/// Create form when `recipe` is `None`, edit form otherwise.
pub fn admin_recipe_form(recipe: Option<&Recipe>) -> Markup {
    let (action, method, heading) = match recipe {
        Some(r) => (format!("/api/v1/admin/recipes/{}", r.id), "PUT", "Edit recipe"),
        None => ("/api/v1/admin/recipes".to_string(), "POST", "New recipe"),
    };
    let title = recipe.map(|r| r.title.as_str()).unwrap_or("");
    let description = recipe.map(|r| r.description.as_str()).unwrap_or("");
    let cook_time = recipe.and_then(|r| r.cook_time).map(|v| v.to_string());
    let servings = recipe.and_then(|r| r.servings).map(|v| v.to_string());
    let difficulty = recipe.and_then(|r| r.difficulty.as_deref());
    let ingredients = recipe.map(|r| r.ingredients.join("\n")).unwrap_or_default();
    let steps = recipe.map(|r| r.steps.join("\n")).unwrap_or_default();
    let current = recipe.and_then(|r| r.category);

    let mut categories = Markup::new();
    categories.raw("<option value=\"\">—</option>");
    for category in Category::ALL {
        categories.child(text_element(
            "option",
            &[
                ("value", Some(category.as_str())),
                ("selected", (current == Some(category)).then_some("")),
            ],
            category.label(),
        ));
    }

    let input = |name: &'static str, kind: &'static str, value: Option<&str>| {
        element(
            "input",
            &[("name", Some(name)), ("type", Some(kind)), ("placeholder", Some(name)), ("value", value)],
            Markup::new(),
        )
    };

    let mut form = Markup::new();
    form.child(text_element("h3", &[], heading))
        .child(input("title", "text", Some(title)))
        .child(element("select", &[("name", Some("category"))], categories))
        .child(element(
            "textarea",
            &[("name", Some("description")), ("placeholder", Some("Description"))],
            Markup::from(description),
        ))
        .child(input("cook_time", "number", cook_time.as_deref()))
        .child(input("servings", "number", servings.as_deref()))
        .child(input("difficulty", "text", difficulty))
        .child(element(
            "textarea",
            &[("name", Some("ingredients")), ("placeholder", Some("One ingredient per line"))],
            Markup::from(ingredients.as_str()),
        ))
        .child(element(
            "textarea",
            &[("name", Some("steps")), ("placeholder", Some("One step per line"))],
            Markup::from(steps.as_str()),
        ))
        .raw("<button class=\"btn primary\" type=\"submit\">Save</button><p class=\"error\"></p>");

    element(
        "form",
        &[
            ("data-action", Some(action.as_str())),
            ("data-method", Some(method)),
            ("data-lines", Some("ingredients,steps")),
            ("data-numbers", Some("cook_time,servings")),
            ("data-next", Some("/admin?section=recipes")),
        ],
        form,
    )
}

pub fn admin_user_table(users: &[User]) -> Markup {
    let mut rows = Markup::new();
    for user in users {
        let action = format!("/api/v1/admin/users/{}/role", user.id);
        let mut row = Markup::new();
        row.child(text_element("td", &[], &or_dash(Some(user.name.as_str()))))
            .child(text_element("td", &[], &user.email))
            .child(text_element("td", &[], user.role.as_str()))
            .child(text_element("td", &[], &format_date(&user.created_at)))
            .child(element(
                "td",
                &[],
                text_element(
                    "button",
                    &[("class", Some("btn sm")), ("data-action", Some(action.as_str()))],
                    if user.is_admin() { "Make user" } else { "Make admin" },
                ),
            ));
        rows.child(element("tr", &[], row));
    }
    table(&["Name", "Email", "Role", "Joined", ""], rows)
}

pub fn admin_review_table(reviews: &[ModeratedReview]) -> Markup {
    let mut rows = Markup::new();
    for entry in reviews {
        let review = &entry.review;
        let action = format!(
            "/api/v1/admin/reviews/{}/{}",
            review.recipe_id, review.id
        );
        let mut row = Markup::new();
        row.child(text_element("td", &[], &entry.recipe_title))
            .child(text_element("td", &[], &review.author_name))
            .child(text_element("td", &[("class", Some("stars"))], &stars(f64::from(review.rating))))
            .child(text_element("td", &[], &review.text))
            .child(text_element("td", &[], &format_date(&review.created_at)))
            .child(element("td", &[], delete_button(&action, "Delete this review?")));
        rows.child(element("tr", &[], row));
    }
    table(&["Recipe", "Author", "Rating", "Text", "Date", ""], rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::{RecipeDraft, RecipeInput};
    use crate::models::user::Role;
    use chrono::Utc;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            email: "chef@example.com".into(),
            name: "Chef".into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    fn hostile_recipe() -> Recipe {
        RecipeDraft::try_from(RecipeInput {
            title: "<script>alert(1)</script>".into(),
            category: None,
            description: Some("<img src=x onerror=alert(2)>".into()),
            cook_time: None,
            servings: None,
            difficulty: None,
            ingredients: vec!["<b>salt</b>".into()],
            steps: vec![],
        })
        .unwrap()
        .into_recipe(&admin())
    }

    #[test]
    fn test_card_escapes_title_and_uses_dash_fallback() {
        let html = recipe_card(&hostile_recipe(), false).into_string();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("⏱ — min"));
        assert!(html.contains("no ratings"));
        assert!(!html.contains("hidden"));
    }

    #[test]
    fn test_hidden_card() {
        let html = recipe_card(&hostile_recipe(), true).into_string();
        assert!(html.contains("hidden=\"\""));
    }

    #[test]
    fn test_detail_escapes_every_field() {
        let html = recipe_detail(&hostile_recipe(), Some(true)).into_string();
        assert!(!html.contains("<img"));
        assert!(!html.contains("<b>salt"));
        assert!(html.contains("Remove from favorites"));
    }

    #[test]
    fn test_review_card_controls() {
        let author = admin();
        let review = Review {
            id: Uuid::new_v4(),
            recipe_id: Uuid::new_v4(),
            user_id: author.id,
            author_name: "<i>Eve</i>".into(),
            rating: 4,
            text: "</p><script>x</script>".into(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let anon = review_card(&review, None).into_string();
        assert!(!anon.contains("data-method=\"DELETE\""));
        assert!(!anon.contains("<script>"));
        assert!(anon.contains("★★★★☆"));

        let own = review_card(&review, Some(&author)).into_string();
        assert!(own.contains("data-method=\"PATCH\""));
        assert!(own.contains("data-method=\"DELETE\""));
    }

    #[test]
    fn test_rating_block() {
        let html = rating_block(RatingSummary::new(4.5, 2)).into_string();
        assert!(html.contains(">4.5<"));
        assert!(html.contains("reviews"));
        let single = rating_block(RatingSummary::new(3.0, 1)).into_string();
        assert!(single.contains("</span> review<"));
    }

    #[test]
    fn test_load_more_hidden_without_cursor() {
        assert!(load_more(None).is_empty());
        assert!(load_more(Some("/?cursor=x")).as_str().contains("Load more"));
    }
}
