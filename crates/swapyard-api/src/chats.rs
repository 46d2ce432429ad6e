use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use swapyard_db::models::{MessageRow, parse_timestamp, parse_uuid};
use swapyard_types::api::{
    ChatHistoryResponse, ChatSummary, ConfirmDoneRequest, ConfirmDoneResponse, PostMessageRequest,
};
use swapyard_types::models::Message;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.chats_for(&identity)?;

    let summaries: Vec<ChatSummary> = rows
        .into_iter()
        .map(|(chat, last)| ChatSummary {
            id: parse_uuid(&chat.id),
            members: [chat.member_a, chat.member_b],
            from_item: parse_uuid(&chat.from_item),
            to_item: parse_uuid(&chat.to_item),
            closed: chat.closed,
            last_message: last.map(message_model),
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (chat, confirmations, messages) = state.db.read_chat(&id.to_string())?;

    Ok(Json(ChatHistoryResponse {
        closed: chat.closed,
        confirmations,
        messages: messages.into_iter().map(message_model).collect(),
    }))
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.sender.trim().is_empty() {
        return Err(ApiError::Validation("sender is required"));
    }
    if req.body.trim().is_empty() {
        return Err(ApiError::Validation("message body is required"));
    }

    let row = state.db.post_message(
        &id.to_string(),
        &Uuid::new_v4().to_string(),
        &req.sender,
        &req.body,
    )?;

    Ok((StatusCode::CREATED, Json(message_model(row))))
}

pub async fn confirm_done(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ConfirmDoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.identity.trim().is_empty() {
        return Err(ApiError::Validation("identity is required"));
    }

    let outcome = state.db.confirm_done(&id.to_string(), &req.identity)?;

    Ok(Json(ConfirmDoneResponse {
        closed: outcome.closed,
        confirmations: outcome.confirmations,
        closed_at: outcome.closed_at.as_deref().map(parse_timestamp),
    }))
}

fn message_model(row: MessageRow) -> Message {
    Message {
        sender: row.sender,
        body: row.body,
        created_at: parse_timestamp(&row.created_at),
    }
}
