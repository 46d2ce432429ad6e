use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use swapyard_api::state::{AppState, AppStateInner};
use swapyard_api::{chats, invites, items, matches, users};
use swapyard_db::Database;
use swapyard_match::{CategoryClassifier, KeywordClassifier, price_band_label};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swapyard=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("SWAPYARD_DB_PATH").unwrap_or_else(|_| "swapyard.db".into());
    let host = std::env::var("SWAPYARD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SWAPYARD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Database::open(&PathBuf::from(&db_path))?;

    let classifier = KeywordClassifier::default();
    backfill_classification(&db, &classifier)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, classifier });

    // Routes
    let app = Router::new()
        .route("/users", post(users::register))
        .route("/users/{identity}/matches", get(matches::recommend))
        .route("/users/{identity}/invites", get(invites::list))
        .route("/users/{identity}/chats", get(chats::list))
        .route("/items", post(items::upload))
        .route("/items/search", get(items::search))
        .route("/invites", post(invites::create))
        .route("/invites/{id}/accept", post(invites::accept))
        .route("/invites/{id}/reject", post(invites::reject))
        .route("/chats/{id}/messages", get(chats::history).post(chats::post_message))
        .route("/chats/{id}/done", post(chats::confirm_done))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Swapyard server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Items written before classification existed may lack a category or
/// price band; label them once at boot.
fn backfill_classification(db: &Database, classifier: &KeywordClassifier) -> anyhow::Result<()> {
    let missing = db.items_missing_classification()?;
    if missing.is_empty() {
        return Ok(());
    }

    let count = missing.len();
    for row in missing {
        let category = match row.category.as_deref() {
            Some(category) if !category.is_empty() => category.to_string(),
            _ => {
                let tags: Vec<String> = serde_json::from_str(&row.tags).unwrap_or_default();
                classifier.classify(&format!("{} {}", row.title, tags.join(" ")))
            }
        };
        let band = price_band_label(row.price);
        db.set_item_classification(&row.id, &category, &band)?;
    }

    info!("Backfilled classification for {} items", count);
    Ok(())
}
