use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A request to join a team, resolved by the team leader.
/// `pending -> {accepted, rejected}`; terminal once resolved.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Pending request joined with the requester's profile, for the leader's view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user's own request joined with the target team, for the requester's view.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinRequestInfo {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub team_slug: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
