//! Drives `GooglePlacesClient` against a local stand-in for the provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use buddy_core::config::{HttpConfig, PlacesConfig};
use buddy_core::{Location, PlaceCategory, PlaceQuery};
use buddy_places::{location_name, GooglePlacesClient, PlaceSearch, PlacesError};

#[derive(Clone, Default)]
struct Provider {
    geocode_calls: Arc<AtomicUsize>,
    nearby_calls: Arc<AtomicUsize>,
    deny_key: bool,
}

async fn geocode(
    State(p): State<Provider>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    p.geocode_calls.fetch_add(1, Ordering::SeqCst);
    if p.deny_key {
        return Json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        }));
    }
    if let Some(latlng) = params.get("latlng") {
        return match latlng.as_str() {
            "48.8584,2.2945" => Json(json!({
                "status": "OK",
                "results": [
                    {"formatted_address": "Champ de Mars, 75007 Paris, France",
                     "geometry": {"location": {"lat": 48.8584, "lng": 2.2945}}}
                ]
            })),
            _ => Json(json!({"status": "ZERO_RESULTS", "results": []})),
        };
    }
    match params.get("address").map(String::as_str) {
        Some("Eiffel Tower") => Json(json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 48.8584, "lng": 2.2945}}}]
        })),
        _ => Json(json!({"status": "ZERO_RESULTS", "results": []})),
    }
}

async fn nearby(
    State(p): State<Provider>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    p.nearby_calls.fetch_add(1, Ordering::SeqCst);
    assert_eq!(params.get("key").map(String::as_str), Some("test-key"));

    match params.get("type").map(String::as_str) {
        Some("restaurant") => Json(json!({
            "status": "OK",
            "results": [
                {"place_id": "p1", "name": "Le Jules Verne", "rating": 4.4,
                 "user_ratings_total": 3100, "price_level": 4,
                 "vicinity": "Eiffel Tower, Paris", "types": ["restaurant", "food"]},
                {"place_id": "p2", "name": "Cafe de l'Homme", "rating": 4.1,
                 "user_ratings_total": 2500, "price_level": 3,
                 "vicinity": "Place du Trocadero", "types": ["restaurant", "cafe"]}
            ]
        })),
        Some("cafe") => Json(json!({
            "status": "OK",
            "results": [
                {"place_id": "p2", "name": "Cafe de l'Homme", "rating": 4.1,
                 "user_ratings_total": 2500, "types": ["restaurant", "cafe"]},
                {"place_id": "p3", "name": "Hotel Bar Eiffel", "rating": 4.9,
                 "user_ratings_total": 90, "types": ["bar", "lodging"]}
            ]
        })),
        Some("bakery") => Json(json!({
            "status": "INVALID_REQUEST",
            "error_message": "bad type",
            "results": []
        })),
        _ => Json(json!({"status": "ZERO_RESULTS", "results": []})),
    }
}

async fn details(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert!(params
        .get("fields")
        .is_some_and(|f| f.contains("opening_hours")));
    match params.get("place_id").map(String::as_str) {
        Some("p1") => Json(json!({
            "status": "OK",
            "result": {
                "place_id": "p1",
                "name": "Le Jules Verne",
                "formatted_address": "Avenue Gustave Eiffel, 75007 Paris, France",
                "formatted_phone_number": "01 45 55 61 44",
                "international_phone_number": "+33 1 45 55 61 44",
                "website": "https://www.restaurants-toureiffel.com",
                "url": "https://maps.google.com/?cid=1",
                "rating": 4.4,
                "user_ratings_total": 3100,
                "price_level": 4,
                "opening_hours": {
                    "open_now": true,
                    "weekday_text": ["Monday: 12:00 - 1:30 PM, 7:00 - 9:00 PM"]
                },
                "business_status": "OPERATIONAL"
            }
        })),
        _ => Json(json!({"status": "NOT_FOUND"})),
    }
}

async fn start(provider: Provider) -> GooglePlacesClient {
    start_with(provider, PlacesConfig::default()).await
}

async fn start_with(provider: Provider, places: PlacesConfig) -> GooglePlacesClient {
    let app = Router::new()
        .route("/geocode/json", get(geocode))
        .route("/place/nearbysearch/json", get(nearby))
        .route("/place/details/json", get(details))
        .with_state(provider);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = PlacesConfig {
        base_url: format!("http://{}", addr),
        api_key: "test-key".to_string(),
        max_requests_per_second: 100,
        ..places
    };
    let http = HttpConfig {
        max_retries: 0,
        ..HttpConfig::default()
    };
    GooglePlacesClient::new(&config, &http).unwrap()
}

fn restaurant_query(location: Location) -> PlaceQuery {
    PlaceQuery {
        location,
        radius_m: 1000,
        category: PlaceCategory::Restaurant,
    }
}

#[tokio::test]
async fn test_text_location_search_pipeline() {
    let provider = Provider::default();
    let client = start(provider.clone()).await;

    let results = client
        .search(&restaurant_query(Location::Text("Eiffel Tower".to_string())))
        .await
        .unwrap();

    // p2 de-duplicated, p3 filtered as a hotel bar, bakery failure skipped.
    let ids: Vec<_> = results.iter().map(|p| p.place_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.nearby_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_coordinates_skip_geocoding() {
    let provider = Provider::default();
    let client = start(provider.clone()).await;

    let results = client
        .search(&restaurant_query(Location::Coordinates {
            lat: 48.8584,
            lng: 2.2945,
        }))
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_location_is_invalid() {
    let provider = Provider::default();
    let client = start(provider.clone()).await;

    let err = client
        .search(&restaurant_query(Location::Text("Atlantis".to_string())))
        .await
        .unwrap_err();

    assert!(matches!(err, PlacesError::InvalidLocation(ref l) if l == "Atlantis"));
    assert_eq!(provider.nearby_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_denied_key_is_auth_error() {
    let provider = Provider {
        deny_key: true,
        ..Provider::default()
    };
    let client = start(provider).await;

    let err = client
        .search(&restaurant_query(Location::Text("Eiffel Tower".to_string())))
        .await
        .unwrap_err();

    assert!(matches!(err, PlacesError::Auth(_)));
}

#[tokio::test]
async fn test_empty_area_returns_empty_vec() {
    let provider = Provider::default();
    let client = start(provider).await;

    let query = PlaceQuery {
        location: Location::Text("Eiffel Tower".to_string()),
        radius_m: 500,
        category: PlaceCategory::Hotel,
    };
    let results = client.search(&query).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_place_details() {
    let client = start(Provider::default()).await;

    let details = client.details("p1").await.unwrap();
    assert_eq!(details.name, "Le Jules Verne");
    assert_eq!(details.phone.as_deref(), Some("01 45 55 61 44"));
    assert_eq!(
        details.website.as_deref(),
        Some("https://www.restaurants-toureiffel.com")
    );
    assert_eq!(details.open_now, Some(true));
    assert_eq!(details.opening_hours.len(), 1);
    assert_eq!(details.business_status.as_deref(), Some("OPERATIONAL"));
}

#[tokio::test]
async fn test_unknown_place_details_not_found() {
    let client = start(Provider::default()).await;
    let err = client.details("missing").await.unwrap_err();
    assert!(matches!(err, PlacesError::NotFound(_)));

    let err = client.details("  ").await.unwrap_err();
    assert!(matches!(err, PlacesError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_reverse_geocode_and_fallback_label() {
    let provider = Provider::default();
    let client = start(provider.clone()).await;

    assert_eq!(
        client.reverse_geocode(48.8584, 2.2945).await.unwrap().as_deref(),
        Some("Champ de Mars, 75007 Paris, France")
    );
    assert_eq!(client.reverse_geocode(0.0, 0.0).await.unwrap(), None);

    assert_eq!(
        location_name(&client, 48.8584, 2.2945).await,
        "Champ de Mars, 75007 Paris, France"
    );
    assert_eq!(
        location_name(&client, 0.0, 0.0).await,
        "Current Location (0.0000, 0.0000)"
    );
    assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_daily_limit_fails_without_waiting() {
    let provider = Provider::default();
    let client = start_with(
        provider.clone(),
        PlacesConfig {
            max_requests_per_day: 1,
            ..PlacesConfig::default()
        },
    )
    .await;

    assert!(client.reverse_geocode(48.8584, 2.2945).await.is_ok());

    let started = std::time::Instant::now();
    let err = client
        .search(&restaurant_query(Location::Text("Eiffel Tower".to_string())))
        .await
        .unwrap_err();
    assert!(matches!(err, PlacesError::QuotaExceeded(_)));
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 1);
}
