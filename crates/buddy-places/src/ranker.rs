//! Quality ranking for place results.
//!
//! The score blends rating with a capped, logarithmic popularity bonus and
//! discounts places with few reviews:
//!
//! ```text
//! score = (rating * 2 + min(log10(reviews + 1) * 2, 5)) * credibility
//! credibility = 0.5 (< 50 reviews) | 0.75 (< 100 reviews) | 1.0
//! ```

use std::cmp::Ordering;

use buddy_core::PlaceResult;

const MAX_POPULARITY_BONUS: f64 = 5.0;

/// Quality score for one place.
pub fn quality_score(place: &PlaceResult) -> f64 {
    let rating = place.rating.unwrap_or(0.0);
    let reviews = place.user_ratings_total.unwrap_or(0);

    let popularity = if reviews > 0 {
        ((f64::from(reviews) + 1.0).log10() * 2.0).min(MAX_POPULARITY_BONUS)
    } else {
        0.0
    };

    let credibility = match reviews {
        0..=49 => 0.5,
        50..=99 => 0.75,
        _ => 1.0,
    };

    (rating * 2.0 + popularity) * credibility
}

/// Sort best first: score, then rating, then review count.
pub fn rank(places: &mut [PlaceResult]) {
    places.sort_by(|a, b| {
        let by_score = quality_score(b)
            .partial_cmp(&quality_score(a))
            .unwrap_or(Ordering::Equal);
        by_score
            .then_with(|| {
                b.rating
                    .unwrap_or(0.0)
                    .partial_cmp(&a.rating.unwrap_or(0.0))
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| {
                b.user_ratings_total
                    .unwrap_or(0)
                    .cmp(&a.user_ratings_total.unwrap_or(0))
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(name: &str, rating: Option<f64>, reviews: Option<u32>) -> PlaceResult {
        PlaceResult {
            place_id: name.to_string(),
            name: name.to_string(),
            rating,
            user_ratings_total: reviews,
            price_level: None,
            address: String::new(),
            types: vec![],
        }
    }

    #[test]
    fn test_score_well_reviewed() {
        // 4.5 * 2 + min(log10(1001) * 2, 5) = 9 + 5 (capped)
        let score = quality_score(&place("a", Some(4.5), Some(1000)));
        assert!((score - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_credibility_discount() {
        // 60 reviews: (8 + log10(61) * 2) * 0.75
        let expected = (8.0 + 61f64.log10() * 2.0) * 0.75;
        let score = quality_score(&place("b", Some(4.0), Some(60)));
        assert!((score - expected).abs() < 1e-9);

        // 10 reviews: halved
        let expected = (10.0 + 11f64.log10() * 2.0) * 0.5;
        let score = quality_score(&place("c", Some(5.0), Some(10)));
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_missing_fields() {
        assert_eq!(quality_score(&place("d", None, None)), 0.0);
    }

    #[test]
    fn test_few_reviews_rank_below_established() {
        let mut places = vec![
            place("perfect-but-new", Some(5.0), Some(3)),
            place("solid", Some(4.3), Some(2500)),
        ];
        rank(&mut places);
        assert_eq!(places[0].name, "solid");
    }

    #[test]
    fn test_ties_broken_by_rating_then_reviews() {
        // Popularity is capped, so these score the same.
        let mut places = vec![
            place("fewer", Some(4.0), Some(200_000)),
            place("more", Some(4.0), Some(300_000)),
        ];
        rank(&mut places);
        assert_eq!(places[0].name, "more");
    }

    #[test]
    fn test_rank_descending() {
        let mut places = vec![
            place("low", Some(3.0), Some(500)),
            place("high", Some(4.8), Some(500)),
            place("mid", Some(4.0), Some(500)),
        ];
        rank(&mut places);
        let names: Vec<_> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }
}
