//! Prompt text for classification and reply generation.

use std::fmt::Write;

use buddy_core::{PlaceCategory, PlaceQuery, PlaceResult};

/// Places listed in a summary prompt.
pub const MAX_LISTED_PLACES: usize = 10;
/// Provider categories shown per place.
const MAX_LISTED_TYPES: usize = 3;

pub const CLASSIFICATION_APOLOGY: &str = "Sorry, I had trouble understanding that request. \
Could you rephrase it, for example \"restaurants near the Colosseum within 2 km\"?";

pub const REPLY_APOLOGY: &str =
    "Sorry, I couldn't put together a reply just now. Please try again in a moment.";

pub const RESULTS_APOLOGY: &str = "I found some places for you, but couldn't write up the \
recommendations just now. The results are listed below.";

const PERSONA: &str = "You are Travel Buddy, an expert travel assistant that provides detailed, \
helpful, and personalized travel recommendations. You have access to real-time data about \
places, restaurants, hotels, and activities.";

const CLASSIFIER: &str = "You classify messages sent to a travel assistant. Decide whether the \
latest user message starts a new place search (new_query), refines the previous search \
(follow_up), or is general conversation (general_chat). Extract only what the user states: the \
category (restaurant, hotel, attraction, activity), the location as written, and the search \
radius. Use null for anything not stated in the latest message. Set follow_up to true when the \
message depends on an earlier search, such as \"cheaper options\" or \"what about hotels\".";

fn category_focus(category: PlaceCategory) -> &'static str {
    match category {
        PlaceCategory::Attraction => {
            "Focus on providing information about:
- Top tourist attractions and landmarks
- Hidden gems and local favorites
- Cultural and historical sites
- Natural attractions
- Best times to visit each place
- Estimated time needed for each attraction"
        }
        PlaceCategory::Restaurant => {
            "Focus on providing information about:
- Restaurant names, cuisine types, and specialties
- Price ranges and estimated costs per person
- Popular dishes and must-try items
- Ambiance and dining experience
- Ratings and reviews summary
- Distance from the main location"
        }
        PlaceCategory::Activity => {
            "Focus on providing information about:
- Adventure activities and sports
- Cultural experiences and workshops
- Entertainment and nightlife
- Seasonal activities
- Age-appropriate recommendations
- Cost estimates and booking requirements"
        }
        PlaceCategory::Hotel => {
            "Focus on providing information about:
- Hotel names, star ratings, and types
- Price ranges per night
- Key amenities and features
- Location advantages
- Guest rating summaries
- Booking recommendations"
        }
    }
}

/// Persona system prompt, with a category focus when one applies.
pub fn system_prompt(category: Option<PlaceCategory>) -> String {
    match category {
        Some(category) => format!("{}\n\n{}", PERSONA, category_focus(category)),
        None => PERSONA.to_string(),
    }
}

pub fn classification_prompt() -> &'static str {
    CLASSIFIER
}

/// Human-readable radius: `800 m`, `1 km`, `2.5 km`.
pub fn format_radius(radius_m: u32) -> String {
    if radius_m < 1000 {
        format!("{} m", radius_m)
    } else if radius_m % 1000 == 0 {
        format!("{} km", radius_m / 1000)
    } else {
        format!("{:.1} km", f64::from(radius_m) / 1000.0)
    }
}

fn describe_query(query: &PlaceQuery) -> String {
    format!(
        "{} within {} of {}",
        query.category.display_name(),
        format_radius(query.radius_m),
        query.location
    )
}

/// Numbered listing of places for the completion client.
pub fn place_listing(places: &[PlaceResult]) -> String {
    let mut out = String::new();
    for (i, place) in places.iter().take(MAX_LISTED_PLACES).enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, place.name);
        let rating = place
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "N/A".to_string());
        match place.user_ratings_total {
            Some(n) => {
                let _ = writeln!(out, "   Rating: {} ({} reviews)", rating, n);
            }
            None => {
                let _ = writeln!(out, "   Rating: {}", rating);
            }
        }
        let address = if place.address.is_empty() {
            "N/A"
        } else {
            &place.address
        };
        let _ = writeln!(out, "   Address: {}", address);
        if let Some(price) = place.price_symbol() {
            let _ = writeln!(out, "   Price Level: {}", price);
        }
        if !place.types.is_empty() {
            let types: Vec<&str> = place
                .types
                .iter()
                .take(MAX_LISTED_TYPES)
                .map(String::as_str)
                .collect();
            let _ = writeln!(out, "   Categories: {}", types.join(", "));
        }
    }
    out
}

/// Ask for recommendations drawn from `places`.
pub fn summary_message(user_message: &str, query: &PlaceQuery, places: &[PlaceResult]) -> String {
    format!(
        "User Query: {}\n\nSearch: {}\n\nAvailable Data:{}\n\nPlease provide detailed \
         recommendations based on this data, mentioning every place listed. Format your \
         response in a clear, organized manner with specific details about each recommendation.",
        user_message,
        describe_query(query),
        place_listing(places)
    )
}

/// Ask for a helpful reply when a valid search found nothing.
pub fn empty_results_message(user_message: &str, query: &PlaceQuery) -> String {
    format!(
        "User Query: {}\n\nA search for {} returned no places. Tell the user nothing matched, \
         without inventing places, and suggest how to adjust the search, such as a larger \
         radius, a nearby area, or a different category.",
        user_message,
        describe_query(query)
    )
}

/// Fallback prose when the empty-result reply cannot be generated.
pub fn empty_results_fallback(query: &PlaceQuery) -> String {
    format!(
        "I couldn't find any {} within {} of {} right now. Try a larger radius or a nearby area.",
        query.category.display_name().to_lowercase(),
        format_radius(query.radius_m),
        query.location
    )
}

/// Ask for an apology when the place search itself failed.
pub fn search_failure_message(user_message: &str, query: &PlaceQuery, reason: &str) -> String {
    format!(
        "User Query: {}\n\nThe place search for {} failed ({}). Apologise briefly, do not \
         invent places, and suggest what the user could try instead, such as checking the \
         location name.",
        user_message,
        describe_query(query),
        reason
    )
}

/// Fallback prose when the search failed and no apology could be generated.
pub fn search_failure_fallback(query: &PlaceQuery) -> String {
    format!(
        "Sorry, I couldn't search for places near {} just now. Please check the location \
         and try again.",
        query.location
    )
}

/// Ask the user for the fields a place search still needs.
pub fn clarification_message(user_message: &str, missing: &[&str]) -> String {
    format!(
        "User Query: {}\n\nThe user seems to want travel recommendations, but the {} could not \
         be determined. Ask a short, friendly question to find out.",
        user_message,
        missing.join(" and ")
    )
}
