pub mod classify;
pub mod enumerate;
pub mod score;

pub use classify::{CategoryClassifier, KeywordClassifier, price_band_label};
pub use enumerate::{EnumerateOptions, enumerate_swaps};
pub use score::{PriceMode, ScoreOptions, Weights, compatibility};
