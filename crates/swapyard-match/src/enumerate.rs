use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use swapyard_types::models::{GeoPoint, Item, MatchRecord, User};

use crate::classify::CategoryClassifier;
use crate::score::{self, PriceMode, ScoreOptions, Weights};

#[derive(Debug, Clone, Copy)]
pub struct EnumerateOptions {
    pub use_category: bool,
    pub price_mode: PriceMode,
}

/// Enumerate and rank all admissible swaps for `requester`.
///
/// Unknown requesters yield an empty list by policy, not an error.
/// O(U·I²) over the catalog snapshot; fine for moderate sizes. Ties in
/// `match_score` keep enumeration order (stable sort).
pub fn enumerate_swaps(
    requester: &str,
    users: &[User],
    items: &[Item],
    weights: Weights,
    opts: EnumerateOptions,
    classifier: &dyn CategoryClassifier,
) -> Vec<MatchRecord> {
    let Some(requester_user) = users.iter().find(|u| u.identity == requester) else {
        return Vec::new();
    };

    let locations: HashMap<String, GeoPoint> = users
        .iter()
        .filter_map(|u| u.location.map(|loc| (u.identity.clone(), loc)))
        .collect();

    let own_items: Vec<&Item> = items.iter().filter(|i| i.owner == requester).collect();

    let score_opts = ScoreOptions {
        price_mode: opts.price_mode,
    };
    let mut out = Vec::new();

    for other in users.iter().filter(|u| u.identity != requester) {
        for candidate in items.iter().filter(|i| i.owner == other.identity) {
            for &own in &own_items {
                if own.owner == candidate.owner {
                    continue;
                }

                if opts.use_category {
                    let own_category = resolved_category(own, classifier);
                    let candidate_category = resolved_category(candidate, classifier);
                    if own_category != candidate_category {
                        continue;
                    }
                }

                // Hard cutoff on the raw delta, independent of the scored
                // falloff inside tolerance mode.
                if let PriceMode::Tolerance(tolerance) = opts.price_mode {
                    if (candidate.price - own.price).abs() > tolerance {
                        continue;
                    }
                }

                let score_from = score::compatibility(
                    requester_user.location,
                    candidate,
                    own,
                    &locations,
                    weights,
                    score_opts,
                );
                let score_to = score::compatibility(
                    other.location,
                    own,
                    candidate,
                    &locations,
                    weights,
                    score_opts,
                );
                let match_score = (score_from + score_to) / 2.0;

                out.push(MatchRecord {
                    own_item: own.clone(),
                    candidate_item: candidate.clone(),
                    score_from: round3(score_from),
                    score_to: round3(score_to),
                    match_score: round3(match_score),
                });
            }
        }
    }

    out.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
    });

    debug!(requester, candidates = out.len(), "enumerated swap candidates");
    out
}

fn resolved_category(item: &Item, classifier: &dyn CategoryClassifier) -> String {
    match &item.category {
        Some(category) if !category.is_empty() => category.clone(),
        _ => classifier.classify(&format!("{} {}", item.title, item.tags.join(" "))),
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    /// Deterministic stand-in for the keyword classifier.
    struct TitleClassifier;

    impl CategoryClassifier for TitleClassifier {
        fn classify(&self, text: &str) -> String {
            if text.contains("phone") {
                "electronics".to_string()
            } else {
                "other".to_string()
            }
        }
    }

    const WEIGHTS: Weights = Weights {
        damage: 50.0,
        rating: 0.0,
        price: 50.0,
        distance: 0.0,
    };

    fn diff_opts() -> EnumerateOptions {
        EnumerateOptions {
            use_category: false,
            price_mode: PriceMode::Diff,
        }
    }

    fn user(identity: &str) -> User {
        User {
            identity: identity.to_string(),
            display_name: None,
            location: None,
            updated_at: Utc::now(),
        }
    }

    fn item(owner: &str, price: f64, condition: Option<f64>) -> Item {
        Item {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            title: "thing".to_string(),
            tags: vec![],
            condition,
            price,
            category: None,
            price_band: None,
            rating: 2.5,
            created_at: Utc::now(),
        }
    }

    fn with_category(mut item: Item, category: &str) -> Item {
        item.category = Some(category.to_string());
        item
    }

    fn with_title(mut item: Item, title: &str) -> Item {
        item.title = title.to_string();
        item
    }

    #[test]
    fn unknown_requester_yields_empty_list() {
        let users = vec![user("a")];
        let items = vec![item("a", 100.0, None)];
        let out = enumerate_swaps("ghost", &users, &items, WEIGHTS, diff_opts(), &TitleClassifier);
        assert!(out.is_empty());
    }

    #[test]
    fn two_sided_scores_round_to_three_decimals() {
        let users = vec![user("a"), user("b")];
        let items = vec![item("a", 100.0, Some(80.0)), item("b", 120.0, Some(60.0))];
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, diff_opts(), &TitleClassifier);

        assert_eq!(out.len(), 1);
        let record = &out[0];
        // price component 1 - 20/120; damage 0.6 one way, 0.8 the other.
        assert_eq!(record.score_from, 0.717);
        assert_eq!(record.score_to, 0.817);
        assert_eq!(record.match_score, 0.767);
    }

    #[test]
    fn results_are_sorted_descending_by_match_score() {
        let users = vec![user("a"), user("b")];
        let items = vec![
            item("a", 100.0, Some(80.0)),
            item("b", 100.0, Some(10.0)),
            item("b", 100.0, Some(100.0)),
        ];
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, diff_opts(), &TitleClassifier);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].candidate_item.condition, Some(100.0));
        for pair in out.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
        }
    }

    #[test]
    fn paired_items_never_share_an_owner() {
        let users = vec![user("a"), user("b"), user("c")];
        let items = vec![
            item("a", 100.0, Some(50.0)),
            item("a", 200.0, Some(50.0)),
            item("b", 150.0, Some(50.0)),
            item("c", 80.0, Some(50.0)),
        ];
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, diff_opts(), &TitleClassifier);

        assert_eq!(out.len(), 4);
        for record in &out {
            assert_eq!(record.own_item.owner, "a");
            assert_ne!(record.candidate_item.owner, "a");
        }
    }

    #[test]
    fn category_filter_skips_mismatched_pairs() {
        let users = vec![user("a"), user("b")];
        let items = vec![
            with_category(item("a", 100.0, Some(50.0)), "electronics"),
            with_category(item("b", 100.0, Some(50.0)), "furniture"),
        ];

        let mut opts = diff_opts();
        opts.use_category = true;
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, opts, &TitleClassifier);
        assert!(out.is_empty());

        let out = enumerate_swaps("a", &users, &items, WEIGHTS, diff_opts(), &TitleClassifier);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn category_filter_falls_back_to_the_classifier() {
        let users = vec![user("a"), user("b")];
        let items = vec![
            with_category(item("a", 100.0, Some(50.0)), "electronics"),
            with_title(item("b", 100.0, Some(50.0)), "old phone"),
            with_title(item("b", 100.0, Some(50.0)), "worn couch"),
        ];

        let mut opts = diff_opts();
        opts.use_category = true;
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, opts, &TitleClassifier);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].candidate_item.title, "old phone");
    }

    #[test]
    fn tolerance_mode_prefilters_on_raw_price_delta() {
        let users = vec![user("a"), user("b")];
        let items = vec![item("a", 100.0, Some(50.0)), item("b", 200.0, Some(50.0))];

        let tight = EnumerateOptions {
            use_category: false,
            price_mode: PriceMode::Tolerance(50.0),
        };
        assert!(enumerate_swaps("a", &users, &items, WEIGHTS, tight, &TitleClassifier).is_empty());

        let loose = EnumerateOptions {
            use_category: false,
            price_mode: PriceMode::Tolerance(150.0),
        };
        let out = enumerate_swaps("a", &users, &items, WEIGHTS, loose, &TitleClassifier);
        assert_eq!(out.len(), 1);
        // Within the cutoff the score still uses the linear falloff:
        // price component 1 - 100/150 on both sides, damage 0.5.
        let expected: f64 = (50.0 * 0.5 + 50.0 * (1.0 - 100.0 / 150.0)) / 100.0;
        assert_eq!(out[0].match_score, (expected * 1000.0).round() / 1000.0);
    }
}
