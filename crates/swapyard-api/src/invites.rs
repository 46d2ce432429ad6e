use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use swapyard_db::models::{InviteRow, parse_timestamp, parse_uuid};
use swapyard_types::api::{
    AcceptInviteResponse, CreateInviteRequest, InviteListResponse, InviteResponse,
};
use swapyard_types::models::InviteStatus;

use crate::error::ApiError;
use crate::state::AppState;

/// Idempotent against the pending (from, to, fromItem, toItem) tuple:
/// a repeat call returns the existing invite with 200 instead of 201.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.from.trim().is_empty() || req.to.trim().is_empty() {
        return Err(ApiError::Validation("from and to identities are required"));
    }
    if state.db.get_item(&req.from_item.to_string())?.is_none()
        || state.db.get_item(&req.to_item.to_string())?.is_none()
    {
        return Err(ApiError::NotFound);
    }

    let id = Uuid::new_v4();
    let (row, created) = state.db.create_invite(
        &id.to_string(),
        &req.from,
        &req.to,
        &req.from_item.to_string(),
        &req.to_item.to_string(),
    )?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(invite_response(row))))
}

pub async fn list(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let received = state
        .db
        .invites_received(&identity)?
        .into_iter()
        .map(invite_response)
        .collect();
    let sent = state
        .db
        .invites_sent(&identity)?
        .into_iter()
        .map(invite_response)
        .collect();

    Ok(Json(InviteListResponse { received, sent }))
}

pub async fn accept(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = state
        .db
        .accept_invite(&id.to_string(), &Uuid::new_v4().to_string())?;

    Ok(Json(AcceptInviteResponse {
        chat_id: parse_uuid(&chat_id),
    }))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.reject_invite(&id.to_string())?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

fn invite_response(row: InviteRow) -> InviteResponse {
    InviteResponse {
        id: parse_uuid(&row.id),
        from: row.from_identity,
        to: row.to_identity,
        from_item: parse_uuid(&row.from_item),
        to_item: parse_uuid(&row.to_item),
        status: InviteStatus::from(row.status.as_str()),
        created_at: parse_timestamp(&row.created_at),
    }
}
