use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Sessions and turns
// =============================================================================

/// Opaque conversation session identifier.
///
/// The UI shell chooses the value; the core never interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random session id.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
///
/// Turns are values: the session store keeps its own copy and hands out
/// clones, so a turn never changes after it has been appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Place results shown alongside an assistant reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<Vec<PlaceResult>>,
    /// The place query executed to produce this reply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<PlaceQuery>,
    /// Place query fields known when this reply was written, including
    /// ones from clarifications and failed searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<QueryHints>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            places: None,
            query: None,
            fields: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach place results. An empty list is stored as no attachment.
    pub fn with_places(mut self, places: Vec<PlaceResult>) -> Self {
        self.places = if places.is_empty() { None } else { Some(places) };
        self
    }

    pub fn with_query(mut self, query: PlaceQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Record the place query fields in effect. Empty fields are not stored.
    pub fn with_fields(mut self, fields: QueryHints) -> Self {
        self.fields = if fields.is_empty() { None } else { Some(fields) };
        self
    }
}

// =============================================================================
// Place queries
// =============================================================================

/// Where to search: explicit coordinates or a free-text place name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Coordinates { lat: f64, lng: f64 },
    Text(String),
}

impl Location {
    /// Interpret user or model supplied text as a location.
    ///
    /// `"48.8584, 2.2945"` becomes coordinates when both parts are in range;
    /// anything else is kept as trimmed free text. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some((a, b)) = trimmed.split_once(',') {
            if let (Ok(lat), Ok(lng)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
                    return Some(Location::Coordinates { lat, lng });
                }
            }
        }
        Some(Location::Text(trimmed.to_string()))
    }
}

impl Location {
    /// Label for coordinates that could not be named by reverse geocoding.
    pub fn coordinates_label(lat: f64, lng: f64) -> String {
        format!("Current Location ({:.4}, {:.4})", lat, lng)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates { lat, lng } => write!(f, "{:.4}, {:.4}", lat, lng),
            Location::Text(text) => f.write_str(text),
        }
    }
}

/// Kind of place the user is looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Restaurant,
    Hotel,
    Attraction,
    Activity,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 4] = [
        PlaceCategory::Attraction,
        PlaceCategory::Restaurant,
        PlaceCategory::Activity,
        PlaceCategory::Hotel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Hotel => "hotel",
            PlaceCategory::Attraction => "attraction",
            PlaceCategory::Activity => "activity",
        }
    }

    /// Human-readable plural label.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaceCategory::Restaurant => "Restaurants",
            PlaceCategory::Hotel => "Hotels & Resorts",
            PlaceCategory::Attraction => "Tourist Places",
            PlaceCategory::Activity => "Activities",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "restaurant" | "restaurants" | "food" | "dining" | "cafe" | "cafes" => {
                Ok(PlaceCategory::Restaurant)
            }
            "hotel" | "hotels" | "lodging" | "accommodation" | "stay" | "resort" | "resorts" => {
                Ok(PlaceCategory::Hotel)
            }
            "attraction" | "attractions" | "tourist" | "tourist_place" | "tourist_places"
            | "tourist_attraction" | "sightseeing" | "sights" => Ok(PlaceCategory::Attraction),
            "activity" | "activities" | "things_to_do" | "entertainment" => {
                Ok(PlaceCategory::Activity)
            }
            other => Err(format!("unknown place category: {}", other)),
        }
    }
}

/// Fully resolved parameters for one place search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceQuery {
    pub location: Location,
    /// Search radius in meters.
    pub radius_m: u32,
    pub category: PlaceCategory,
}

/// Partially specified query fields extracted from a single message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryHints {
    pub category: Option<PlaceCategory>,
    pub location: Option<Location>,
    pub radius_m: Option<u32>,
}

impl QueryHints {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.location.is_none() && self.radius_m.is_none()
    }

    /// Fill each missing field from `fallback`, field by field.
    #[must_use]
    pub fn or(&self, fallback: &QueryHints) -> QueryHints {
        QueryHints {
            category: self.category.or(fallback.category),
            location: self.location.clone().or_else(|| fallback.location.clone()),
            radius_m: self.radius_m.or(fallback.radius_m),
        }
    }
}

/// Classified meaning of a user message.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryIntent {
    /// Starts a fresh place search.
    NewQuery(QueryHints),
    /// Refines the previous place search; omitted fields carry forward.
    FollowUp(QueryHints),
    /// Ordinary conversation, no place search.
    GeneralChat,
}

impl QueryIntent {
    pub fn kind(&self) -> IntentKind {
        match self {
            QueryIntent::NewQuery(_) => IntentKind::NewQuery,
            QueryIntent::FollowUp(_) => IntentKind::FollowUp,
            QueryIntent::GeneralChat => IntentKind::GeneralChat,
        }
    }

    pub fn hints(&self) -> Option<&QueryHints> {
        match self {
            QueryIntent::NewQuery(h) | QueryIntent::FollowUp(h) => Some(h),
            QueryIntent::GeneralChat => None,
        }
    }
}

/// Payload-free tag of a [`QueryIntent`], used in responses and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    NewQuery,
    FollowUp,
    GeneralChat,
}

// =============================================================================
// Place results
// =============================================================================

/// A single place returned by the place-search provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    /// Provider identifier, used for de-duplication.
    pub place_id: String,
    pub name: String,
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    /// Ordinal price level, 0 (free) to 4 (very expensive).
    pub price_level: Option<u8>,
    pub address: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl PlaceResult {
    /// Render the price level as dollar signs (`$` .. `$$$$$`).
    pub fn price_symbol(&self) -> Option<String> {
        match self.price_level {
            Some(level @ 1..=5) => Some("$".repeat(level as usize)),
            _ => None,
        }
    }
}

/// Full provider record for one place, fetched on demand by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub international_phone: Option<String>,
    pub website: Option<String>,
    /// Provider map page for the place.
    pub url: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub open_now: Option<bool>,
    /// Weekly opening hours, one line per day.
    #[serde(default)]
    pub opening_hours: Vec<String>,
    /// Provider status such as `OPERATIONAL` or `CLOSED_TEMPORARILY`.
    pub business_status: Option<String>,
}

// =============================================================================
// Error kinds surfaced to the UI
// =============================================================================

/// Failure category attached to a response for the UI and for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Completion client failed while classifying the message.
    ClassificationFailure,
    /// Place search failed (unreachable, invalid location, quota).
    SearchFailure,
    /// Completion client failed while writing the reply.
    SummarizationFailure,
    /// Missing or invalid configuration.
    ConfigurationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ClassificationFailure => "classification_failure",
            ErrorKind::SearchFailure => "search_failure",
            ErrorKind::SummarizationFailure => "summarization_failure",
            ErrorKind::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
