//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use buddy_chat::{QueryRouter, SessionStore};
use buddy_core::config::SearchConfig;
use buddy_core::TravelConfig;
use buddy_places::PlaceSearch;

/// Shared application state.
///
/// All fields use `Arc` or are cheap to clone across handler tasks.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<QueryRouter>,
    pub store: Arc<SessionStore>,
    /// Place provider for detail and reverse geocoding lookups.
    pub places: Arc<dyn PlaceSearch>,
    /// Bounds for radius preferences.
    pub search: SearchConfig,
    /// Bearer token required on session routes; `None` disables auth.
    pub api_token: Option<String>,
    /// Inbound requests allowed per second.
    pub requests_per_second: u64,
    /// Port used to build the CORS origin list.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: &TravelConfig, router: Arc<QueryRouter>) -> Self {
        Self {
            store: Arc::clone(router.store()),
            places: Arc::clone(router.places()),
            router,
            search: config.search.clone(),
            api_token: config.general.api_token.clone(),
            requests_per_second: config.general.requests_per_second,
            port: config.general.port,
            start_time: Instant::now(),
        }
    }
}
