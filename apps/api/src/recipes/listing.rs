use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::recipe::{Category, Recipe, SortField};
use crate::store::RecipeQuery;

/// Query parameters shared by the listing API and the home page.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub sort: Option<SortField>,
    pub cursor: Option<Uuid>,
    pub q: Option<String>,
}

impl ListParams {
    pub fn category(&self) -> Result<Option<Category>, AppError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => Category::parse(raw)
                .map(Some)
                .ok_or_else(|| AppError::validation(format!("unknown category '{raw}'"))),
        }
    }

    pub fn to_query(&self, page_size: i64) -> Result<RecipeQuery, AppError> {
        Ok(RecipeQuery {
            category: self.category()?,
            sort: self.sort.unwrap_or_default(),
            cursor: self.cursor,
            limit: page_size,
        })
    }

    /// Lowercased, trimmed search term; `None` when blank.
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
    }
}

/// Case-insensitive title match. `term` must already be lowercased.
pub fn title_matches(title: &str, term: Option<&str>) -> bool {
    match term {
        None => true,
        Some(term) => title.to_lowercase().contains(term),
    }
}

/// Narrows an already-fetched page to matching titles. Never looks past the
/// page it is given.
pub fn search_within(recipes: Vec<Recipe>, term: Option<&str>) -> Vec<Recipe> {
    recipes
        .into_iter()
        .filter(|r| title_matches(&r.title, term))
        .collect()
}
