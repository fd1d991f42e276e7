//! Carry-forward of place query fields across turns.
//!
//! A message that only partly specifies a search inherits each missing
//! field from the most recent turn that knew it (see
//! [`SessionStore::carried_fields`](crate::store::SessionStore::carried_fields)).
//! Radius falls back to the session preference and then the configured
//! default; category and location have no default and must come from the
//! message or history.

use buddy_core::config::SearchConfig;
use buddy_core::{PlaceQuery, QueryHints};

/// Outcome of resolving a place intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ready(PlaceQuery),
    /// Fields that could not be filled from the message or history.
    Missing(Vec<&'static str>),
}

/// Builds complete place queries from partial hints.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    search: SearchConfig,
}

impl QueryResolver {
    pub fn new(search: SearchConfig) -> Self {
        Self { search }
    }

    /// Overlay the message's hints on the fields carried from history.
    pub fn merge(&self, hints: &QueryHints, carried: &QueryHints) -> QueryHints {
        hints.or(carried)
    }

    /// Turn merged fields into a query, taking the radius from the session
    /// preference and then the default when neither message nor history
    /// gave one.
    pub fn resolve(&self, fields: &QueryHints, radius_preference: Option<u32>) -> Resolution {
        let (Some(category), Some(location)) = (fields.category, fields.location.clone()) else {
            let mut missing = Vec::new();
            if fields.category.is_none() {
                missing.push("category");
            }
            if fields.location.is_none() {
                missing.push("location");
            }
            return Resolution::Missing(missing);
        };

        let requested = fields
            .radius_m
            .or(radius_preference)
            .unwrap_or(self.search.default_radius_m);
        let radius_m = self.search.clamp_radius(requested);
        if radius_m != requested {
            tracing::warn!(
                requested,
                used = radius_m,
                max = self.search.max_radius_m,
                "Search radius out of bounds, clamped"
            );
        }

        Resolution::Ready(PlaceQuery {
            location,
            radius_m,
            category,
        })
    }
}
