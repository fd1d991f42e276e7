//! Google Places (legacy web service) implementation of [`PlaceSearch`].
//!
//! A search geocodes free-text locations, runs one nearby search per
//! provider type of the category, then de-duplicates, filters, ranks and
//! truncates the combined results. Place details and reverse geocoding go
//! through the same rate limiter and retry policy.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use buddy_core::config::{HttpConfig, PlacesConfig};
use buddy_core::{Location, PlaceCategory, PlaceDetails, PlaceQuery, PlaceResult, RetryPolicy};

use crate::catalog;
use crate::client::PlaceSearch;
use crate::error::PlacesError;
use crate::filter::filter_by_category;
use crate::rate_limit::RequestRateLimiter;
use crate::ranker;

/// Largest radius the nearby-search endpoint accepts.
pub const PROVIDER_MAX_RADIUS_M: u32 = 50_000;

/// Fields requested from the place details endpoint.
const DETAIL_FIELDS: &str = "place_id,name,formatted_address,formatted_phone_number,\
international_phone_number,website,url,rating,user_ratings_total,price_level,\
opening_hours,business_status";

/// Place search client for the Google Places web service.
#[derive(Debug)]
pub struct GooglePlacesClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_results: usize,
    limiter: RequestRateLimiter,
    retry: RetryPolicy,
}

impl GooglePlacesClient {
    pub fn new(config: &PlacesConfig, http: &HttpConfig) -> Result<Self, PlacesError> {
        if config.api_key.trim().is_empty() {
            return Err(PlacesError::Config("API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(http.request_timeout())
            .user_agent(concat!("travel-buddy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlacesError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http: client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
            limiter: RequestRateLimiter::new(
                config.max_requests_per_second,
                config.max_requests_per_day,
                http.request_timeout(),
            ),
            retry: RetryPolicy::from_config(http),
        })
    }

    /// Resolve a location to coordinates, geocoding free text.
    async fn coordinates(&self, location: &Location) -> Result<(f64, f64), PlacesError> {
        let address = match location {
            Location::Coordinates { lat, lng } => return Ok((*lat, *lng)),
            Location::Text(address) => address,
        };

        let response: GeocodeResponse = self
            .get_json("geocode/json", vec![("address", address.clone())])
            .await?;
        check_status(&response.status, response.error_message)?;

        response
            .results
            .first()
            .map(|r| (r.geometry.location.lat, r.geometry.location.lng))
            .ok_or_else(|| PlacesError::InvalidLocation(address.clone()))
    }

    async fn nearby(
        &self,
        (lat, lng): (f64, f64),
        radius_m: u32,
        provider_type: &str,
    ) -> Result<Vec<PlaceResult>, PlacesError> {
        let response: NearbyResponse = self
            .get_json(
                "place/nearbysearch/json",
                vec![
                    ("location", format!("{},{}", lat, lng)),
                    ("radius", radius_m.to_string()),
                    ("type", provider_type.to_string()),
                ],
            )
            .await?;
        check_status(&response.status, response.error_message)?;

        Ok(response
            .results
            .into_iter()
            .filter_map(RawPlace::into_result)
            .collect())
    }

    /// Rate-limited GET returning the decoded JSON body, with bounded retry.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<T, PlacesError> {
        let url = format!("{}/{}", self.base_url, path);
        params.push(("key", self.api_key.clone()));
        let params = &params;
        let url = &url;

        self.retry
            .run(
                path,
                move || async move {
                    self.limiter.acquire().await?;
                    let response = self.http.get(url).query(params).send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(PlacesError::from_http_status(status.as_u16(), body));
                    }
                    Ok(response.json::<T>().await?)
                },
                PlacesError::is_retryable,
            )
            .await
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesClient {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, PlacesError> {
        let origin = self.coordinates(&query.location).await?;
        let radius_m = query.radius_m.min(PROVIDER_MAX_RADIUS_M);
        if radius_m < query.radius_m {
            tracing::debug!(
                requested = query.radius_m,
                used = radius_m,
                "Radius capped at provider maximum"
            );
        }

        let mut collected = Vec::new();
        let mut succeeded = 0usize;
        let mut last_error = None;

        for provider_type in catalog::profile(query.category).provider_types {
            match self.nearby(origin, radius_m, provider_type).await {
                Ok(places) => {
                    succeeded += 1;
                    collected.extend(places);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(provider_type, error = %e, "Nearby search failed, skipping type");
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let results = refine_results(collected, query.category, self.max_results);

        tracing::info!(
            category = %query.category,
            location = %query.location,
            radius_m,
            results = results.len(),
            "Place search complete"
        );
        for (i, place) in results.iter().take(5).enumerate() {
            tracing::debug!(
                rank = i + 1,
                name = %place.name,
                score = ranker::quality_score(place),
                "Top place"
            );
        }

        Ok(results)
    }

    async fn details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        if place_id.trim().is_empty() {
            return Err(PlacesError::InvalidRequest("place id is empty".to_string()));
        }
        let response: DetailsResponse = self
            .get_json(
                "place/details/json",
                vec![
                    ("place_id", place_id.to_string()),
                    ("fields", DETAIL_FIELDS.to_string()),
                ],
            )
            .await?;
        check_status(&response.status, response.error_message)?;

        let details = response
            .result
            .and_then(RawDetails::into_details)
            .ok_or_else(|| PlacesError::Malformed(format!("no details for place {}", place_id)))?;
        tracing::debug!(place_id, name = %details.name, "Place details fetched");
        Ok(details)
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, PlacesError> {
        let response: GeocodeResponse = self
            .get_json("geocode/json", vec![("latlng", format!("{},{}", lat, lng))])
            .await?;
        check_status(&response.status, response.error_message)?;

        Ok(response
            .results
            .into_iter()
            .find_map(|r| r.formatted_address.filter(|a| !a.trim().is_empty())))
    }
}

/// De-duplicate by place id, filter by category, rank and truncate.
pub fn refine_results(
    places: Vec<PlaceResult>,
    category: PlaceCategory,
    max_results: usize,
) -> Vec<PlaceResult> {
    let mut seen = HashSet::new();
    let unique: Vec<PlaceResult> = places
        .into_iter()
        .filter(|p| seen.insert(p.place_id.clone()))
        .collect();

    let mut kept = filter_by_category(unique, category);
    ranker::rank(&mut kept);
    kept.truncate(max_results);
    kept
}

fn check_status(status: &str, message: Option<String>) -> Result<(), PlacesError> {
    match PlacesError::from_provider_status(status, message) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
    #[serde(default)]
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<RawPlace>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: Option<String>,
    name: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    price_level: Option<u8>,
    vicinity: Option<String>,
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

impl RawPlace {
    /// Places without an id or name are dropped.
    fn into_result(self) -> Option<PlaceResult> {
        Some(PlaceResult {
            place_id: self.place_id?,
            name: self.name?,
            rating: self.rating,
            user_ratings_total: self.user_ratings_total,
            price_level: self.price_level,
            address: self.formatted_address.or(self.vicinity).unwrap_or_default(),
            types: self.types,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<RawDetails>,
}

#[derive(Debug, Deserialize)]
struct RawDetails {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    formatted_phone_number: Option<String>,
    international_phone_number: Option<String>,
    website: Option<String>,
    url: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    price_level: Option<u8>,
    opening_hours: Option<RawOpeningHours>,
    business_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOpeningHours {
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

impl RawDetails {
    fn into_details(self) -> Option<PlaceDetails> {
        let (open_now, opening_hours) = match self.opening_hours {
            Some(hours) => (hours.open_now, hours.weekday_text),
            None => (None, Vec::new()),
        };
        Some(PlaceDetails {
            place_id: self.place_id?,
            name: self.name?,
            address: self.formatted_address,
            phone: self.formatted_phone_number,
            international_phone: self.international_phone_number,
            website: self.website,
            url: self.url,
            rating: self.rating,
            user_ratings_total: self.user_ratings_total,
            price_level: self.price_level,
            open_now,
            opening_hours,
            business_status: self.business_status,
        })
    }
}
