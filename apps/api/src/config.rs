use anyhow::{bail, Context, Result};

pub const DEFAULT_PASSWORD_SALT: &str = "rb_salt_";
pub const DEFAULT_RECIPE_PAGE_SIZE: i64 = 12;
pub const DEFAULT_REVIEW_PAGE_SIZE: i64 = 10;

/// Which `RecipeStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub password_salt: String,
    pub recipe_page_size: i64,
    pub review_page_size: i64,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(raw) => StoreBackend::parse(&raw)?,
            Err(_) => StoreBackend::Postgres,
        };

        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        Ok(Config {
            store_backend,
            database_url,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            password_salt: std::env::var("PASSWORD_SALT")
                .unwrap_or_else(|_| DEFAULT_PASSWORD_SALT.to_string()),
            recipe_page_size: page_size_env("RECIPE_PAGE_SIZE", DEFAULT_RECIPE_PAGE_SIZE)?,
            review_page_size: page_size_env("REVIEW_PAGE_SIZE", DEFAULT_REVIEW_PAGE_SIZE)?,
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            password_salt: DEFAULT_PASSWORD_SALT.to_string(),
            recipe_page_size: DEFAULT_RECIPE_PAGE_SIZE,
            review_page_size: DEFAULT_REVIEW_PAGE_SIZE,
            secure_cookies: false,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn page_size_env(key: &str, default: i64) -> Result<i64> {
    let size = match std::env::var(key) {
        Ok(raw) => raw
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer"))?,
        Err(_) => default,
    };
    if size < 1 {
        bail!("{key} must be at least 1");
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("postgres").unwrap(), StoreBackend::Postgres);
        assert_eq!(StoreBackend::parse(" Memory ").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::parse("firestore").is_err());
    }

    #[test]
    fn test_default_page_sizes() {
        let config = Config::default();
        assert_eq!(config.recipe_page_size, 12);
        assert_eq!(config.review_page_size, 10);
        assert_eq!(config.password_salt, "rb_salt_");
    }
}
