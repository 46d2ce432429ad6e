use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use tracing::error;

use swapyard_match::{EnumerateOptions, PriceMode, Weights, enumerate_swaps};
use swapyard_types::api::{MatchQuery, PriceModeParam};
use swapyard_types::models::{Item, User};

use crate::error::ApiError;
use crate::state::AppState;

/// Ranked swap recommendations for one requester. An identity absent from
/// the directory yields an empty list by policy, not an error.
pub async fn recommend(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    Query(query): Query<MatchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let price_mode = match query.price_mode {
        PriceModeParam::Diff => PriceMode::Diff,
        PriceModeParam::Interval => PriceMode::Interval,
        PriceModeParam::Tolerance => {
            let tolerance = query
                .tolerance
                .ok_or(ApiError::Validation("tolerance is required for price_mode=tolerance"))?;
            if tolerance < 0.0 {
                return Err(ApiError::Validation("tolerance must be non-negative"));
            }
            PriceMode::Tolerance(tolerance)
        }
    };

    let weights = Weights {
        damage: query.damage,
        rating: query.rating,
        price: query.price,
        distance: query.distance,
    };
    let opts = EnumerateOptions {
        use_category: query.use_category,
        price_mode,
    };

    // Snapshot reads plus the O(U·I²) enumeration run off the async runtime.
    let snapshot_state = state.clone();
    let records = tokio::task::spawn_blocking(move || {
        let users: Vec<User> = snapshot_state
            .db
            .list_users()?
            .into_iter()
            .map(|row| row.into_model())
            .collect();
        let items: Vec<Item> = snapshot_state
            .db
            .list_items()?
            .into_iter()
            .map(|row| row.into_model())
            .collect();

        Ok::<_, ApiError>(enumerate_swaps(
            &identity,
            &users,
            &items,
            weights,
            opts,
            &snapshot_state.classifier,
        ))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    Ok(Json(records))
}
