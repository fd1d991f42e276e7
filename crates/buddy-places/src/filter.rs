//! Category keyword filter.
//!
//! Nearby search by provider type is loose: a "park" query returns cafes
//! inside parks, a "lodging" query returns restaurants attached to hotels.
//! This filter keeps only places that plausibly belong to the requested
//! category.

use buddy_core::{PlaceCategory, PlaceResult};

use crate::catalog::{self, CategoryProfile};

/// Attractions at or above this rating are admitted without a keyword match.
pub const ATTRACTION_RATING_BYPASS: f64 = 4.0;

/// Keep the places in `places` that match `category`, preserving order.
pub fn filter_by_category(places: Vec<PlaceResult>, category: PlaceCategory) -> Vec<PlaceResult> {
    let profile = catalog::profile(category);
    places
        .into_iter()
        .filter(|place| admits(profile, category, place))
        .collect()
}

fn admits(profile: &CategoryProfile, category: PlaceCategory, place: &PlaceResult) -> bool {
    let types: Vec<String> = place.types.iter().map(|t| t.to_lowercase()).collect();
    let haystack = format!(
        "{} {} {}",
        place.name.to_lowercase(),
        types.join(" "),
        place.address.to_lowercase()
    );

    if profile.exclude_keywords.iter().any(|kw| haystack.contains(kw)) {
        return false;
    }

    if profile.include_keywords.iter().any(|kw| haystack.contains(kw)) {
        return true;
    }

    if profile
        .provider_types
        .iter()
        .any(|t| types.iter().any(|pt| pt == t))
    {
        return true;
    }

    category == PlaceCategory::Attraction
        && place.rating.unwrap_or(0.0) >= ATTRACTION_RATING_BYPASS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, types: &[&str], rating: Option<f64>) -> PlaceResult {
        PlaceResult {
            place_id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            rating,
            user_ratings_total: Some(200),
            price_level: None,
            address: "1 Main Street".to_string(),
            types: types.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_exclude_keyword_wins() {
        let places = vec![place(
            "Grand Hotel Restaurant",
            &["restaurant", "lodging"],
            Some(4.8),
        )];
        assert!(filter_by_category(places, PlaceCategory::Restaurant).is_empty());
    }

    #[test]
    fn test_include_keyword_admits() {
        let places = vec![place("Luigi's Bistro", &["point_of_interest"], Some(4.1))];
        assert_eq!(filter_by_category(places, PlaceCategory::Restaurant).len(), 1);
    }

    #[test]
    fn test_provider_type_admits() {
        let places = vec![place("Seaside Stays", &["lodging"], None)];
        assert_eq!(filter_by_category(places, PlaceCategory::Hotel).len(), 1);
    }

    #[test]
    fn test_unrelated_place_rejected() {
        let places = vec![place("Corner Pharmacy", &["pharmacy"], Some(4.9))];
        assert!(filter_by_category(places, PlaceCategory::Restaurant).is_empty());
    }

    #[test]
    fn test_highly_rated_attraction_bypass() {
        let high = place("Old Lighthouse", &["point_of_interest"], Some(4.3));
        let low = place("Old Signal Box", &["point_of_interest"], Some(3.2));
        let kept = filter_by_category(vec![high, low], PlaceCategory::Attraction);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Old Lighthouse");
    }

    #[test]
    fn test_bypass_only_for_attractions() {
        let places = vec![place("Old Lighthouse", &["point_of_interest"], Some(4.9))];
        assert!(filter_by_category(places, PlaceCategory::Activity).is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let places = vec![
            place("Alpha Cafe", &["cafe"], None),
            place("Beta Eatery", &[], None),
            place("Gamma Kitchen", &[], None),
        ];
        let names: Vec<_> = filter_by_category(places, PlaceCategory::Restaurant)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alpha Cafe", "Beta Eatery", "Gamma Kitchen"]);
    }
}
