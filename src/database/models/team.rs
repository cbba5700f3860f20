use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::join_request::JoinRequestInfo;

/// Minimum members a team needs before it can register for HackAway.
pub const MIN_TEAM_SIZE: i64 = 2;
/// Hard cap on team size, enforced at join-request acceptance.
pub const MAX_TEAM_SIZE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Leader,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub leader_id: Uuid,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Membership row joined with the member's profile, as shown on the team page.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberInfo {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_image: Option<String>,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// The caller's team with everything the team page needs. Pending join
/// requests are only populated for the leader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTeamView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub is_leader: bool,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub members: Vec<TeamMemberInfo>,
    pub pending_requests: Vec<JoinRequestInfo>,
}

/// Public team preview, looked up by slug before requesting to join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPreview {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub members: Vec<TeamMemberInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamInput {
    pub team_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamInput {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreInput {
    pub score: i32,
}

/// Admin view: team plus its members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamWithMembers {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMemberInfo>,
}
