use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use swapyard_types::api::RegisterUserRequest;

use crate::error::ApiError;
use crate::state::AppState;

/// Upsert by identity: registration and profile update are the same call.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.identity.trim().is_empty() {
        return Err(ApiError::Validation("identity is required"));
    }

    let row = state.db.upsert_user(
        &req.identity,
        req.display_name.as_deref(),
        req.location.map(|loc| loc.lat),
        req.location.map(|loc| loc.lng),
    )?;

    Ok(Json(row.into_model()))
}
