use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geographic point supplied by the client at registration.
/// Locations are never computed server-side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub identity: String,
    pub display_name: Option<String>,
    pub location: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub owner: String,
    pub title: String,
    pub tags: Vec<String>,
    /// Condition percentage in [0, 100]; absent until assessed.
    pub condition: Option<f64>,
    pub price: f64,
    pub category: Option<String>,
    pub price_band: Option<String>,
    /// Rating out of 5. Unrated items sit at the neutral 2.5.
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

/// Invite status is monotonic: pending moves to accepted or rejected,
/// both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
}

impl From<&str> for InviteStatus {
    fn from(s: &str) -> Self {
        match s {
            "accepted" => InviteStatus::Accepted,
            "rejected" => InviteStatus::Rejected,
            _ => InviteStatus::Pending,
        }
    }
}

/// A chat message. Ordering is append order, not declared-timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// One ranked swap candidate: each side's compatibility score for what it
/// would receive, and their average.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub own_item: Item,
    pub candidate_item: Item,
    pub score_from: f64,
    pub score_to: f64,
    pub match_score: f64,
}
