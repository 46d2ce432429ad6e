use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use swapyard_match::{CategoryClassifier, price_band_label};
use swapyard_types::api::{SearchQuery, UploadItemRequest};
use swapyard_types::models::Item;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required"));
    }
    if req.price < 0.0 {
        return Err(ApiError::Validation("price must be non-negative"));
    }
    if let Some(condition) = req.condition {
        if !(0.0..=100.0).contains(&condition) {
            return Err(ApiError::Validation("condition must be within 0-100"));
        }
    }

    // Items can only be listed by a registered owner.
    if state.db.get_user(&req.owner)?.is_none() {
        return Err(ApiError::Validation("unknown owner identity"));
    }

    let category = match req.category.as_deref() {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => state
            .classifier
            .classify(&format!("{} {}", req.title, req.tags.join(" "))),
    };
    let price_band = price_band_label(req.price);

    let id = Uuid::new_v4();
    let tags_json = serde_json::to_string(&req.tags).map_err(anyhow::Error::from)?;

    let row = state.db.create_item(
        &id.to_string(),
        &req.owner,
        &req.title,
        &tags_json,
        req.condition,
        req.price,
        Some(&category),
        Some(&price_band),
    )?;

    Ok((StatusCode::CREATED, Json(row.into_model())))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.search_items(&query.q, query.exclude.as_deref())?;
    let items: Vec<Item> = rows.into_iter().map(|row| row.into_model()).collect();
    Ok(Json(items))
}
