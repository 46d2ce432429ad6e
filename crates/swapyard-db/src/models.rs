//! Database row types — these map directly to SQLite rows.
//! Distinct from the swapyard-types API models to keep the DB layer
//! independent; `into_model` bridges the two.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use swapyard_types::models::{GeoPoint, Item, User};

pub struct UserRow {
    pub identity: String,
    pub display_name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub updated_at: String,
}

impl UserRow {
    pub fn into_model(self) -> User {
        let location = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };
        User {
            identity: self.identity,
            display_name: self.display_name,
            location,
            updated_at: parse_timestamp(&self.updated_at),
        }
    }
}

pub struct ItemRow {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub tags: String,
    pub condition: Option<f64>,
    pub price: f64,
    pub category: Option<String>,
    pub price_band: Option<String>,
    pub rating: f64,
    pub created_at: String,
}

impl ItemRow {
    pub fn into_model(self) -> Item {
        let tags = serde_json::from_str(&self.tags).unwrap_or_else(|e| {
            warn!("Corrupt tags on item '{}': {}", self.id, e);
            Vec::new()
        });
        Item {
            id: parse_uuid(&self.id),
            owner: self.owner,
            title: self.title,
            tags,
            condition: self.condition,
            price: self.price,
            category: self.category,
            price_band: self.price_band,
            rating: self.rating,
            created_at: parse_timestamp(&self.created_at),
        }
    }
}

pub struct InviteRow {
    pub id: String,
    pub from_identity: String,
    pub to_identity: String,
    pub from_item: String,
    pub to_item: String,
    pub status: String,
    pub created_at: String,
}

pub struct ChatRow {
    pub id: String,
    pub member_a: String,
    pub member_b: String,
    pub from_item: String,
    pub to_item: String,
    pub closed: bool,
    pub closed_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub body: String,
    pub created_at: String,
}

/// Outcome of a confirm-done call: the (possibly just-transitioned) closed
/// flag and the confirmation set after the union.
#[derive(Debug)]
pub struct ConfirmOutcome {
    pub closed: bool,
    pub confirmations: Vec<String>,
    pub closed_at: Option<String>,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert, warning on anything unparseable.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn parse_uuid(raw: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        Uuid::default()
    })
}
