//! Conversational core of Travel Buddy.
//!
//! Holds per-session conversation memory and routes each user message
//! through intent classification, place search and reply generation.

pub mod context;
pub mod error;
pub mod intent;
pub mod mock;
pub mod prompt;
pub mod report;
pub mod router;
pub mod store;

pub use context::{QueryResolver, Resolution};
pub use error::ChatError;
pub use intent::parse_classification;
pub use mock::{MockCompletion, MockPlaces};
pub use report::render_report;
pub use router::{QueryRouter, RouterConfig, RouterResponse};
pub use store::{SessionStore, SessionSummary};
