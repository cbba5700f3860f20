use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_score: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_score: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub score: Option<i32>,
    pub rank: Option<i32>,
    pub registered_at: DateTime<Utc>,
}

/// Registration joined with event and team, for the admin registrations table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationInfo {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_id: Uuid,
    pub score: Option<i32>,
    pub rank: Option<i32>,
    pub registered_at: DateTime<Utc>,
    pub event_name: String,
    pub event_category: String,
    pub event_slug: String,
    pub team_name: String,
    pub team_slug: String,
}

/// Result of `register_for_event`. Re-registering is an idempotent soft
/// success, so "already registered" travels on the success path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRegistrationOutcome {
    pub already_registered: bool,
    pub event_name: String,
}
