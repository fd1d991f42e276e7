//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path, query or body parameters via axum extractors,
//! calls into the router or session store, and returns JSON.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use buddy_chat::{RouterResponse, SessionSummary};
use buddy_core::{PlaceDetails, SessionId, Turn};
use buddy_places::PlaceSearch;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing conversation to continue; a new id is assigned when absent.
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub radius_m: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeParams {
    pub lat: f64,
    pub lng: f64,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: SessionId,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub session_id: String,
    pub radius_m: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationNameResponse {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.store.session_count(),
    })
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<RouterResponse>, ApiError> {
    let session_id = match body.session_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => SessionId::new(id),
        _ => SessionId::random(),
    };

    let response = state
        .router
        .handle_message(&session_id, &body.message)
        .await?;

    Ok(Json(response))
}

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.store.list_sessions(),
    })
}

/// GET /sessions/{id}/history
///
/// Unknown sessions yield an empty turn list.
pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.router.config().max_history_turns);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    let session_id = SessionId::new(id);
    let turns = state.store.history(&session_id, limit);
    Ok(Json(HistoryResponse { session_id, turns }))
}

/// DELETE /sessions/{id}/history
pub async fn clear_history(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.store.clear(&SessionId::new(id));
    StatusCode::NO_CONTENT
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.remove(&SessionId::new(id.as_str())) {
        tracing::info!(session = %id, "Session removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session not found: {}", id)))
    }
}

/// GET /sessions/{id}/export
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let json = state.store.export_json(&SessionId::new(id.as_str()))?;
    let disposition = format!("attachment; filename=\"session-{}.json\"", sanitize_filename(&id));

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        json,
    ))
}

/// GET /sessions/{id}/report
pub async fn report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let markdown = state.store.report(&SessionId::new(id.as_str()))?;
    let disposition = format!(
        "attachment; filename=\"travel-buddy-report-{}.md\"",
        sanitize_filename(&id)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    ))
}

/// GET /places/{place_id}
pub async fn place_details(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<Json<PlaceDetails>, ApiError> {
    let details = state.places.details(&place_id).await?;
    Ok(Json(details))
}

/// GET /geocode/reverse?lat=..&lng=..
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Query(params): Query<ReverseGeocodeParams>,
) -> Result<Json<LocationNameResponse>, ApiError> {
    let ReverseGeocodeParams { lat, lng } = params;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::BadRequest(format!(
            "Coordinates out of range: {}, {}",
            lat, lng
        )));
    }

    let name = buddy_places::location_name(state.places.as_ref(), lat, lng).await;
    Ok(Json(LocationNameResponse { lat, lng, name }))
}

/// GET /sessions/{id}/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<PreferencesResponse> {
    let radius_m = state
        .store
        .radius_preference(&SessionId::new(id.as_str()))
        .unwrap_or(state.search.default_radius_m);
    Json(PreferencesResponse {
        session_id: id,
        radius_m,
    })
}

/// PUT /sessions/{id}/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PreferencesRequest>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let radius_m = state.search.check_radius(body.radius_m)?;

    state
        .store
        .set_radius_preference(&SessionId::new(id.as_str()), radius_m);
    tracing::debug!(session = %id, radius_m, "Radius preference updated");

    Ok(Json(PreferencesResponse {
        session_id: id,
        radius_m,
    }))
}

/// Keep only characters safe inside a quoted header filename.
fn sanitize_filename(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
