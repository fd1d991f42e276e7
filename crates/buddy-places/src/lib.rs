//! Place Query Client for Travel Buddy.
//!
//! Searches a hosted place provider for restaurants, hotels, attractions and
//! activities around a location, then de-duplicates, filters and ranks the
//! results before handing them to the chat layer.

pub mod catalog;
pub mod client;
pub mod error;
pub mod filter;
pub mod google;
pub mod rate_limit;
pub mod ranker;

pub use client::{location_name, PlaceSearch};
pub use error::PlacesError;
pub use google::GooglePlacesClient;
pub use rate_limit::RequestRateLimiter;
