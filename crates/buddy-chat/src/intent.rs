//! Typed intent from the completion client's structured classification.
//!
//! The classifier answers with a JSON object:
//!
//! ```json
//! {"intent": "new_query", "category": "restaurant",
//!  "location": "Eiffel Tower", "radius": "1km", "follow_up": false}
//! ```
//!
//! `radius` may be a number of meters or text with a unit.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value as JsonValue};

use buddy_core::{Location, PlaceCategory, QueryHints, QueryIntent};

use crate::error::ChatError;

static RADIUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(\d+(?:\.\d+)?)\s*(km|kms|kilomet(?:er|re)s?|m|meters?|metres?|mi|miles?)?\s*$",
    )
    .expect("Invalid radius regex")
});

const METERS_PER_MILE: f64 = 1609.344;

/// JSON schema sent with the classification request.
pub fn classification_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "intent": {
                "type": "string",
                "enum": ["new_query", "follow_up", "general_chat", "clarification"]
            },
            "category": {
                "type": ["string", "null"],
                "enum": ["restaurant", "hotel", "attraction", "activity", null]
            },
            "location": {"type": ["string", "null"]},
            "radius": {
                "type": ["number", "string", "null"],
                "description": "search radius in meters, or text with a unit such as \"2 km\""
            },
            "follow_up": {"type": "boolean"}
        },
        "required": ["intent"]
    })
}

/// Turn the classifier's JSON into a [`QueryIntent`].
///
/// Unknown categories and unreadable radii are dropped rather than failing
/// the classification; a missing object or unknown intent is an error.
pub fn parse_classification(value: &JsonValue) -> Result<QueryIntent, ChatError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ChatError::ParseError("classification is not an object".to_string()))?;

    let hints = QueryHints {
        category: text_field(obj.get("category")).and_then(|c| match PlaceCategory::from_str(&c) {
            Ok(category) => Some(category),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unrecognised category");
                None
            }
        }),
        location: text_field(obj.get("location")).and_then(|l| Location::parse(&l)),
        radius_m: obj.get("radius").and_then(parse_radius),
    };
    let follow_up = obj
        .get("follow_up")
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);

    let intent = match text_field(obj.get("intent")) {
        Some(raw) => raw.to_lowercase().replace([' ', '-'], "_"),
        None if follow_up => "follow_up".to_string(),
        None if !hints.is_empty() => "new_query".to_string(),
        None => "general_chat".to_string(),
    };

    match intent.as_str() {
        "new_query" | "place_query" | "search" if follow_up => Ok(QueryIntent::FollowUp(hints)),
        "new_query" | "place_query" | "search" => Ok(QueryIntent::NewQuery(hints)),
        "follow_up" | "followup" | "refinement" => Ok(QueryIntent::FollowUp(hints)),
        "general_chat" | "general" | "chat" | "clarification" => Ok(QueryIntent::GeneralChat),
        other => Err(ChatError::ParseError(format!("unknown intent: {}", other))),
    }
}

/// Read a radius in meters from a number or unit-bearing text.
pub fn parse_radius(value: &JsonValue) -> Option<u32> {
    let meters = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => {
            let caps = RADIUS_PATTERN.captures(s)?;
            let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps
                .get(2)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            match unit.as_str() {
                "" | "m" | "meter" | "meters" | "metre" | "metres" => amount,
                "mi" | "mile" | "miles" => amount * METERS_PER_MILE,
                _ => amount * 1000.0,
            }
        }
        _ => return None,
    };

    if !meters.is_finite() || meters <= 0.0 {
        return None;
    }
    Some(meters.round().min(f64::from(u32::MAX)) as u32)
}

/// A non-blank string field; the classifier sometimes writes `"null"`.
fn text_field(value: Option<&JsonValue>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s.to_string())
    }
}
