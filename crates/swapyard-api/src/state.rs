use std::sync::Arc;

use swapyard_db::Database;
use swapyard_match::KeywordClassifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub classifier: KeywordClassifier,
}
