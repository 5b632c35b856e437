use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::ratings::RatingSummary;

/// The fixed set of recipe categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Breakfast,
    Soups,
    Salads,
    Baking,
    Desserts,
    Dinners,
    Drinks,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Breakfast,
        Category::Soups,
        Category::Salads,
        Category::Baking,
        Category::Desserts,
        Category::Dinners,
        Category::Drinks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Soups => "soups",
            Category::Salads => "salads",
            Category::Baking => "baking",
            Category::Desserts => "desserts",
            Category::Dinners => "dinners",
            Category::Drinks => "drinks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Soups => "Soups",
            Category::Salads => "Salads",
            Category::Baking => "Baking",
            Category::Desserts => "Desserts",
            Category::Dinners => "Dinners",
            Category::Drinks => "Drinks",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::Breakfast => "🥞",
            Category::Soups => "🍜",
            Category::Salads => "🥗",
            Category::Baking => "🥐",
            Category::Desserts => "🍰",
            Category::Dinners => "🍝",
            Category::Drinks => "🥤",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Sort fields accepted by the recipe listing. Always descending.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    AvgRating,
    RatingCount,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::AvgRating => "avg_rating",
            SortField::RatingCount => "rating_count",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub category: Option<Category>,
    pub description: String,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub avg_rating: f64,
    pub rating_count: i32,
    pub author_name: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn rating(&self) -> RatingSummary {
        RatingSummary::new(self.avg_rating, self.rating_count)
    }

    pub fn set_rating(&mut self, summary: RatingSummary) {
        self.avg_rating = summary.avg_rating;
        self.rating_count = summary.rating_count;
    }

    pub fn apply_draft(&mut self, draft: RecipeDraft) {
        self.title = draft.title;
        self.category = draft.category;
        self.description = draft.description;
        self.cook_time = draft.cook_time;
        self.servings = draft.servings;
        self.difficulty = draft.difficulty;
        self.ingredients = draft.ingredients;
        self.steps = draft.steps;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub category: Option<String>,
    pub description: String,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub avg_rating: f64,
    pub rating_count: i32,
    pub author_name: String,
    pub author_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            title: row.title,
            category: row.category.as_deref().and_then(Category::parse),
            description: row.description,
            cook_time: row.cook_time,
            servings: row.servings,
            difficulty: row.difficulty,
            ingredients: row.ingredients,
            steps: row.steps,
            avg_rating: row.avg_rating,
            rating_count: row.rating_count,
            author_name: row.author_name,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Editable recipe fields as submitted from the admin form.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cook_time: Option<i32>,
    #[serde(default)]
    pub servings: Option<i32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Validated, normalized recipe fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub category: Option<Category>,
    pub description: String,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

impl TryFrom<RecipeInput> for RecipeDraft {
    type Error = AppError;

    fn try_from(input: RecipeInput) -> Result<Self, Self::Error> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("title is required"));
        }

        let category = match input.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Category::parse(raw)
                    .ok_or_else(|| AppError::validation(format!("unknown category '{raw}'")))?,
            ),
        };

        Ok(RecipeDraft {
            title,
            category,
            description: input.description.unwrap_or_default().trim().to_string(),
            cook_time: input.cook_time.filter(|v| *v > 0),
            servings: input.servings.filter(|v| *v > 0),
            difficulty: input
                .difficulty
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ingredients: clean_lines(input.ingredients),
            steps: clean_lines(input.steps),
        })
    }
}

impl RecipeDraft {
    pub fn into_recipe(self, author: &User) -> Recipe {
        let now = Utc::now();
        Recipe {
            id: Uuid::new_v4(),
            title: self.title,
            category: self.category,
            description: self.description,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty: self.difficulty,
            ingredients: self.ingredients,
            steps: self.steps,
            avg_rating: 0.0,
            rating_count: 0,
            author_name: author.display_name().to_string(),
            author_id: Some(author.id),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Trims every entry, splits multi-line entries and drops blanks.
fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .iter()
        .flat_map(|l| l.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
