use std::collections::HashMap;

use swapyard_types::models::{GeoPoint, Item};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Upper boundaries of the price bands. Five bands total: anything at or
/// above the last boundary falls in the open-ended top band.
pub const PRICE_BAND_BOUNDS: [f64; 4] = [500.0, 2000.0, 5000.0, 10_000.0];

/// Relative importance of each score component. Fractions need not sum
/// to 1; the scorer renormalizes whatever is active.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub damage: f64,
    pub rating: f64,
    pub price: f64,
    pub distance: f64,
}

/// How the price component is computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceMode {
    /// Relative difference against the larger of the two prices.
    Diff,
    /// Distance between price-band indices.
    Interval,
    /// Linear falloff within an absolute tolerance.
    Tolerance(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    pub price_mode: PriceMode,
}

/// Rate how desirable `candidate` is to an evaluator giving up `own`.
/// Always in [0, 1].
///
/// The distance component only participates when both the evaluator and
/// the candidate's owner have known locations; otherwise its weight is
/// dropped and the remaining weights renormalize among themselves. If all
/// active weights are zero the score is zero.
pub fn compatibility(
    evaluator_location: Option<GeoPoint>,
    candidate: &Item,
    own: &Item,
    locations: &HashMap<String, GeoPoint>,
    weights: Weights,
    opts: ScoreOptions,
) -> f64 {
    let damage = candidate
        .condition
        .map_or(0.0, |c| (c / 100.0).clamp(0.0, 1.0));
    let rating = (candidate.rating / 5.0).clamp(0.0, 1.0);
    let price = price_score(opts.price_mode, candidate.price, own.price);

    let mut w = weights;
    let distance = match (evaluator_location, locations.get(&candidate.owner)) {
        (Some(a), Some(b)) => distance_score(haversine_km(a, *b)),
        _ => {
            w.distance = 0.0;
            0.0
        }
    };

    let sum = w.damage + w.rating + w.price + w.distance;
    let denom = if sum == 0.0 { 1.0 } else { sum };

    let combined =
        (w.damage * damage + w.rating * rating + w.price * price + w.distance * distance) / denom;
    combined.clamp(0.0, 1.0)
}

fn price_score(mode: PriceMode, candidate: f64, own: f64) -> f64 {
    match mode {
        PriceMode::Diff => {
            let larger = candidate.max(own);
            if larger <= 0.0 {
                0.0
            } else {
                1.0 - (candidate - own).abs() / larger
            }
        }
        PriceMode::Interval => {
            let delta = band_index(candidate).abs_diff(band_index(own));
            1.0 - delta as f64 / PRICE_BAND_BOUNDS.len() as f64
        }
        PriceMode::Tolerance(tolerance) => {
            if tolerance > 0.0 {
                (1.0 - (candidate - own).abs() / tolerance).max(0.0)
            } else if candidate == own {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Index of the band a price falls in: 0..=PRICE_BAND_BOUNDS.len().
pub fn band_index(price: f64) -> usize {
    PRICE_BAND_BOUNDS
        .iter()
        .position(|bound| price < *bound)
        .unwrap_or(PRICE_BAND_BOUNDS.len())
}

/// Great-circle distance between two points (haversine).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

fn distance_score(km: f64) -> f64 {
    (-km / 10.0).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    const DIFF: ScoreOptions = ScoreOptions {
        price_mode: PriceMode::Diff,
    };

    fn item(owner: &str, price: f64, condition: Option<f64>, rating: f64) -> Item {
        Item {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            title: "thing".to_string(),
            tags: vec![],
            condition,
            price,
            category: None,
            price_band: None,
            rating,
            created_at: Utc::now(),
        }
    }

    fn no_locations() -> HashMap<String, GeoPoint> {
        HashMap::new()
    }

    fn price_only() -> Weights {
        Weights {
            damage: 0.0,
            rating: 0.0,
            price: 1.0,
            distance: 0.0,
        }
    }

    #[test]
    fn score_is_always_in_unit_interval() {
        let locations = no_locations();
        let own = item("a", 100.0, Some(50.0), 2.5);
        let weights = Weights {
            damage: 10.0,
            rating: 30.0,
            price: 60.0,
            distance: 25.0,
        };
        for price in [0.0, 1.0, 100.0, 100_000.0] {
            for condition in [None, Some(0.0), Some(100.0)] {
                for rating in [0.0, 2.5, 5.0] {
                    let candidate = item("b", price, condition, rating);
                    let score =
                        compatibility(None, &candidate, &own, &locations, weights, DIFF);
                    assert!((0.0..=1.0).contains(&score), "score {score} out of range");
                }
            }
        }
    }

    #[test]
    fn two_sided_example_matches_hand_computation() {
        // A gives up a 100-priced 80%-condition item, B a 120-priced 60% one.
        let locations = no_locations();
        let weights = Weights {
            damage: 50.0,
            rating: 0.0,
            price: 50.0,
            distance: 0.0,
        };
        let item_a = item("a", 100.0, Some(80.0), 2.5);
        let item_b = item("b", 120.0, Some(60.0), 2.5);

        let price = 1.0 - (120.0 - 100.0) / 120.0;
        let a_side = compatibility(None, &item_b, &item_a, &locations, weights, DIFF);
        let b_side = compatibility(None, &item_a, &item_b, &locations, weights, DIFF);

        assert!((a_side - (price + 0.6) / 2.0).abs() < 1e-9);
        assert!((b_side - (price + 0.8) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_weights_yield_zero_not_a_fault() {
        let weights = Weights {
            damage: 0.0,
            rating: 0.0,
            price: 0.0,
            distance: 0.0,
        };
        let own = item("a", 100.0, Some(80.0), 5.0);
        let candidate = item("b", 100.0, Some(80.0), 5.0);
        let score = compatibility(None, &candidate, &own, &no_locations(), weights, DIFF);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn missing_condition_counts_as_zero_damage_score() {
        let weights = Weights {
            damage: 1.0,
            rating: 0.0,
            price: 0.0,
            distance: 0.0,
        };
        let own = item("a", 100.0, Some(80.0), 2.5);
        let candidate = item("b", 100.0, None, 2.5);
        let score = compatibility(None, &candidate, &own, &no_locations(), weights, DIFF);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn rating_is_scaled_out_of_five() {
        let weights = Weights {
            damage: 0.0,
            rating: 1.0,
            price: 0.0,
            distance: 0.0,
        };
        let own = item("a", 100.0, None, 2.5);
        let candidate = item("b", 100.0, None, 4.0);
        let score = compatibility(None, &candidate, &own, &no_locations(), weights, DIFF);
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn diff_mode_scores_zero_when_both_items_are_free() {
        let own = item("a", 0.0, None, 2.5);
        let candidate = item("b", 0.0, None, 2.5);
        let score = compatibility(None, &candidate, &own, &no_locations(), price_only(), DIFF);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn interval_mode_scores_band_distance() {
        assert_eq!(band_index(0.0), 0);
        assert_eq!(band_index(499.99), 0);
        assert_eq!(band_index(500.0), 1);
        assert_eq!(band_index(9_999.0), 3);
        assert_eq!(band_index(10_000.0), 4);

        // 100 vs 2500: bands 0 and 2, delta 2 of a max 4.
        let own = item("a", 100.0, None, 2.5);
        let candidate = item("b", 2_500.0, None, 2.5);
        let opts = ScoreOptions {
            price_mode: PriceMode::Interval,
        };
        let score = compatibility(None, &candidate, &own, &no_locations(), price_only(), opts);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn tolerance_mode_decays_linearly_and_handles_zero() {
        let own = item("a", 100.0, None, 2.5);
        let candidate = item("b", 120.0, None, 2.5);

        let at = |tolerance: f64| {
            let opts = ScoreOptions {
                price_mode: PriceMode::Tolerance(tolerance),
            };
            compatibility(None, &candidate, &own, &no_locations(), price_only(), opts)
        };

        assert!((at(50.0) - 0.6).abs() < 1e-9);
        assert_eq!(at(10.0), 0.0);
        assert_eq!(at(0.0), 0.0);

        let equal = item("b", 100.0, None, 2.5);
        let opts = ScoreOptions {
            price_mode: PriceMode::Tolerance(0.0),
        };
        let score = compatibility(None, &equal, &own, &no_locations(), price_only(), opts);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn missing_location_drops_the_distance_weight() {
        // Equal prices with price and distance equally weighted. The
        // candidate's owner has no known location, so distance must
        // renormalize away instead of dragging the score to 0.5.
        let weights = Weights {
            damage: 0.0,
            rating: 0.0,
            price: 1.0,
            distance: 1.0,
        };
        let own = item("a", 100.0, None, 2.5);
        let candidate = item("b", 100.0, None, 2.5);
        let here = GeoPoint { lat: 0.0, lng: 0.0 };
        let score = compatibility(Some(here), &candidate, &own, &no_locations(), weights, DIFF);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn colocated_owners_score_full_distance() {
        let weights = Weights {
            damage: 0.0,
            rating: 0.0,
            price: 0.0,
            distance: 1.0,
        };
        let spot = GeoPoint {
            lat: 52.52,
            lng: 13.405,
        };
        let mut locations = HashMap::new();
        locations.insert("b".to_string(), spot);

        let own = item("a", 100.0, None, 2.5);
        let candidate = item("b", 100.0, None, 2.5);
        let score = compatibility(Some(spot), &candidate, &own, &locations, weights, DIFF);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_longitude_at_equator() {
        let km = haversine_km(
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 0.0, lng: 1.0 },
        );
        assert!((km - 111.19).abs() < 0.1, "got {km}");
    }

    #[test]
    fn distance_decay_is_exponential() {
        assert!((distance_score(0.0) - 1.0).abs() < 1e-12);
        assert!((distance_score(10.0) - (-1.0f64).exp()).abs() < 1e-12);
    }
}
