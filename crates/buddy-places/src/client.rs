//! The place search boundary.

use async_trait::async_trait;

use buddy_core::{Location, PlaceDetails, PlaceQuery, PlaceResult};

use crate::error::PlacesError;

/// Anything that can answer a place query.
///
/// Results come back ranked best first. An empty vector is a valid answer,
/// not an error.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, PlacesError>;

    /// Contact details, opening hours and status of one place.
    async fn details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError>;

    /// Human-readable address for coordinates. `None` when the provider
    /// knows no address there.
    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, PlacesError>;
}

/// Name for coordinates, falling back to a plain coordinates label when
/// reverse geocoding fails or finds nothing.
pub async fn location_name(places: &dyn PlaceSearch, lat: f64, lng: f64) -> String {
    match places.reverse_geocode(lat, lng).await {
        Ok(Some(name)) => name,
        Ok(None) => Location::coordinates_label(lat, lng),
        Err(e) => {
            tracing::warn!(error = %e, "Reverse geocoding failed, using coordinates");
            Location::coordinates_label(lat, lng)
        }
    }
}
