use std::sync::Arc;

use crate::config::Config;
use crate::events::EventBus;
use crate::store::RecipeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable storage. Default: PgStore. Swap via STORE_BACKEND env.
    pub store: Arc<dyn RecipeStore>,
    pub config: Config,
    /// Recipe change notifications for the SSE endpoints.
    pub events: EventBus,
}

impl AppState {
    pub fn new(store: Arc<dyn RecipeStore>, config: Config) -> Self {
        Self {
            store,
            config,
            events: EventBus::new(),
        }
    }
}
