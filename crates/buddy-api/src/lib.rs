//! Travel Buddy HTTP API.
//!
//! Exposes the query router and session store as a JSON API for the chat
//! UI: sending messages, reading and clearing history, exporting sessions
//! and adjusting per-session preferences.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
