//! Scripted in-memory clients for tests and local runs without credentials.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use buddy_core::{PlaceDetails, PlaceQuery, PlaceResult};
use buddy_llm::{Completion, CompletionClient, CompletionRequest, LlmError};
use buddy_places::{PlaceSearch, PlacesError};

/// Completion client that replays queued responses in order and records
/// every request it receives.
#[derive(Debug, Default)]
pub struct MockCompletion {
    responses: Mutex<VecDeque<Result<Completion, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a structured (classification) response.
    #[must_use]
    pub fn then_structured(self, value: JsonValue) -> Self {
        self.push(Ok(Completion::structured(value)));
        self
    }

    /// Queue a plain text response.
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(Completion::text(text)));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn then_error(self, err: LlmError) -> Self {
        self.push(Err(err));
        self
    }

    pub fn push(&self, response: Result<Completion, LlmError>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(LlmError::Transport("no scripted response left".to_string())))
    }
}

/// Place search that answers every query from a queue, falling back to a
/// fixed result list, and records the queries it receives. Details and
/// addresses come from fixed tables.
#[derive(Debug, Default)]
pub struct MockPlaces {
    responses: Mutex<VecDeque<Result<Vec<PlaceResult>, PlacesError>>>,
    fallback: Vec<PlaceResult>,
    queries: Mutex<Vec<PlaceQuery>>,
    details: Vec<PlaceDetails>,
    addresses: Vec<((f64, f64), String)>,
}

impl MockPlaces {
    /// Always return `places` once the queue is empty.
    pub fn returning(places: Vec<PlaceResult>) -> Self {
        Self {
            fallback: places,
            ..Self::default()
        }
    }

    /// Queue one response ahead of the fallback.
    #[must_use]
    pub fn then(self, response: Result<Vec<PlaceResult>, PlacesError>) -> Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
        self
    }

    /// Answer detail lookups for `details.place_id`.
    #[must_use]
    pub fn with_details(mut self, details: PlaceDetails) -> Self {
        self.details.push(details);
        self
    }

    /// Answer reverse geocoding of exactly `(lat, lng)`.
    #[must_use]
    pub fn with_address(mut self, lat: f64, lng: f64, address: impl Into<String>) -> Self {
        self.addresses.push(((lat, lng), address.into()));
        self
    }

    pub fn queries(&self) -> Vec<PlaceQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PlaceSearch for MockPlaces {
    async fn search(&self, query: &PlaceQuery) -> Result<Vec<PlaceResult>, PlacesError> {
        if let Ok(mut log) = self.queries.lock() {
            log.push(query.clone());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        self.details
            .iter()
            .find(|d| d.place_id == place_id)
            .cloned()
            .ok_or_else(|| PlacesError::NotFound(place_id.to_string()))
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Option<String>, PlacesError> {
        Ok(self
            .addresses
            .iter()
            .find(|((a, b), _)| *a == lat && *b == lng)
            .map(|(_, address)| address.clone()))
    }
}
