//! Provider place types and keyword lists for each category.

use buddy_core::PlaceCategory;

/// Search and filter vocabulary for one category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryProfile {
    /// Provider place types queried, one nearby search each.
    pub provider_types: &'static [&'static str],
    /// Any of these in a place's name, types or address admits it.
    pub include_keywords: &'static [&'static str],
    /// Any of these rejects a place outright.
    pub exclude_keywords: &'static [&'static str],
}

const ATTRACTION: CategoryProfile = CategoryProfile {
    provider_types: &[
        "tourist_attraction",
        "museum",
        "park",
        "zoo",
        "amusement_park",
        "aquarium",
        "art_gallery",
        "hindu_temple",
        "natural_feature",
        "campground",
    ],
    include_keywords: &[
        "tourist", "attraction", "museum", "park", "temple", "church", "monument", "heritage",
        "scenic", "viewpoint", "fort", "palace",
    ],
    exclude_keywords: &[
        "restaurant",
        "hotel",
        "lodge",
        "food",
        "cafe",
        "bar",
        "gym",
        "hospital",
        "bank",
        "university",
        "travel_agency",
    ],
};

const RESTAURANT: CategoryProfile = CategoryProfile {
    provider_types: &["restaurant", "meal_takeaway", "cafe", "bakery", "bar", "food"],
    include_keywords: &[
        "restaurant", "cafe", "food", "dining", "kitchen", "bistro", "eatery", "cuisine",
    ],
    exclude_keywords: &[
        "hotel",
        "lodge",
        "hospital",
        "gym",
        "temple",
        "museum",
        "university",
        "travel_agency",
    ],
};

const ACTIVITY: CategoryProfile = CategoryProfile {
    provider_types: &[
        "spa",
        "bowling_alley",
        "movie_theater",
        "night_club",
        "stadium",
        "tourist_attraction",
        "amusement_park",
        "park",
        "zoo",
        "aquarium",
        "casino",
    ],
    include_keywords: &[
        "activity",
        "adventure",
        "sports",
        "recreation",
        "entertainment",
        "club",
        "center",
        "studio",
    ],
    exclude_keywords: &[
        "hotel",
        "restaurant",
        "spa",
        "food",
        "lodge",
        "hospital",
        "bank",
        "university",
        "hindu_temple",
        "church",
        "mosque",
        "travel_agency",
    ],
};

const HOTEL: CategoryProfile = CategoryProfile {
    provider_types: &["lodging", "campground", "rv_park"],
    include_keywords: &[
        "hotel",
        "resort",
        "lodge",
        "accommodation",
        "stay",
        "inn",
        "guest house",
    ],
    exclude_keywords: &[
        "restaurant",
        "cafe",
        "food",
        "hospital",
        "gym",
        "temple",
        "museum",
        "university",
        "travel_agency",
    ],
};

/// Vocabulary for `category`.
pub fn profile(category: PlaceCategory) -> &'static CategoryProfile {
    match category {
        PlaceCategory::Attraction => &ATTRACTION,
        PlaceCategory::Restaurant => &RESTAURANT,
        PlaceCategory::Activity => &ACTIVITY,
        PlaceCategory::Hotel => &HOTEL,
    }
}
