use crate::score::{PRICE_BAND_BOUNDS, band_index};

/// Fallback label when no keyword matches.
pub const OTHER_CATEGORY: &str = "other";

/// Maps free text (title plus tags) to a coarse category label. Injected
/// into the enumerator so tests can substitute a deterministic stub.
pub trait CategoryClassifier: Send + Sync {
    fn classify(&self, text: &str) -> String;
}

/// Keyword-table classifier. The first category with a matching keyword
/// wins; substring matching is deliberately coarse.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(&'static str, &'static [&'static str])>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            rules: vec![
                (
                    "electronics",
                    &[
                        "phone",
                        "laptop",
                        "tablet",
                        "tv",
                        "television",
                        "camera",
                        "headphone",
                        "speaker",
                        "console",
                        "monitor",
                        "keyboard",
                        "charger",
                    ],
                ),
                (
                    "furniture",
                    &[
                        "sofa", "couch", "table", "chair", "desk", "shelf", "wardrobe",
                        "dresser", "bed",
                    ],
                ),
                (
                    "clothing",
                    &[
                        "jacket", "shirt", "dress", "jeans", "shoe", "sneaker", "coat",
                        "sweater", "hat",
                    ],
                ),
                ("books", &["book", "novel", "comic", "magazine", "textbook"]),
                (
                    "sports",
                    &[
                        "bike",
                        "bicycle",
                        "skate",
                        "ball",
                        "racket",
                        "dumbbell",
                        "ski",
                        "tent",
                        "surfboard",
                    ],
                ),
                ("toys", &["lego", "doll", "puzzle", "toy", "board game"]),
                (
                    "tools",
                    &["drill", "hammer", "saw", "wrench", "screwdriver", "ladder"],
                ),
                (
                    "music",
                    &["guitar", "piano", "violin", "drum", "amplifier", "vinyl"],
                ),
            ],
        }
    }
}

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> String {
        let haystack = text.to_lowercase();
        for (category, keywords) in &self.rules {
            if keywords.iter().any(|kw| haystack.contains(kw)) {
                return (*category).to_string();
            }
        }
        OTHER_CATEGORY.to_string()
    }
}

/// Bucket label for a price, using the same boundaries as the interval
/// price mode.
pub fn price_band_label(price: f64) -> String {
    let idx = band_index(price);
    if idx == PRICE_BAND_BOUNDS.len() {
        format!("{}+", PRICE_BAND_BOUNDS[idx - 1] as u64)
    } else {
        let lower = if idx == 0 {
            0
        } else {
            PRICE_BAND_BOUNDS[idx - 1] as u64
        };
        format!("{}-{}", lower, PRICE_BAND_BOUNDS[idx] as u64)
    }
}
