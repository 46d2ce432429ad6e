use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{GeoPoint, InviteStatus, Message};

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub identity: String,
    pub display_name: Option<String>,
    pub location: Option<GeoPoint>,
}

// -- Items --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadItemRequest {
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub condition: Option<f64>,
    pub price: f64,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub exclude: Option<String>,
}

// -- Matches --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceModeParam {
    #[default]
    Diff,
    Interval,
    Tolerance,
}

/// Weight fractions need not sum to 1; the scorer renormalizes.
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    #[serde(default = "default_weight")]
    pub price: f64,
    #[serde(default = "default_weight")]
    pub distance: f64,
    #[serde(default = "default_weight")]
    pub rating: f64,
    #[serde(default = "default_weight")]
    pub damage: f64,
    #[serde(default)]
    pub price_mode: PriceModeParam,
    pub tolerance: Option<f64>,
    #[serde(default)]
    pub use_category: bool,
}

fn default_weight() -> f64 {
    25.0
}

// -- Invites --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInviteRequest {
    pub from: String,
    pub to: String,
    pub from_item: Uuid,
    pub to_item: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub from_item: Uuid,
    pub to_item: Uuid,
    pub status: InviteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InviteListResponse {
    pub received: Vec<InviteResponse>,
    pub sent: Vec<InviteResponse>,
}

#[derive(Debug, Serialize)]
pub struct AcceptInviteResponse {
    pub chat_id: Uuid,
}

// -- Chats --

#[derive(Debug, Serialize)]
pub struct ChatSummary {
    pub id: Uuid,
    pub members: [String; 2],
    pub from_item: Uuid,
    pub to_item: Uuid,
    pub closed: bool,
    pub last_message: Option<Message>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub closed: bool,
    pub confirmations: Vec<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessageRequest {
    pub sender: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmDoneRequest {
    pub identity: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmDoneResponse {
    pub closed: bool,
    pub confirmations: Vec<String>,
    pub closed_at: Option<DateTime<Utc>>,
}
