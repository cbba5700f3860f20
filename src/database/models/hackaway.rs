use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::team::TeamMemberInfo;

/// The twelve HackAway challenge tracks. Settings rows in the database are
/// sparse overrides on top of these.
pub const DEFAULT_PROBLEM_STATEMENTS: [(i32, &str); 12] = [
    (1, "The Reviewer Who Never Sleeps"),
    (2, "Seeing the World with One Sensor"),
    (3, "Finding the Way, One Step at a Time"),
    (4, "Glove-Controlled Drift Racer: Master Every Move!"),
    (5, "TrekBot - A Simple Quadruped Walking Robot"),
    (6, "ChordMate - Never Play the Wrong Chord Again!"),
    (7, "Drip-Sync: No More Guesswork!"),
    (8, "Automated Railway Track Fault Detector"),
    (9, "Agentic AI for Intelligent Personal Financial Decision-Making"),
    (10, "RescueNet - Every Minute Knows Where to Go"),
    (11, "Salil's Inbox - Signal, Not Noise"),
    (12, "Multi-Modal Severity Quantifier"),
];

pub const DEFAULT_MAX_PARTICIPANTS: i32 = 10;

pub const MIN_PROBLEM_STATEMENT: i32 = 1;
pub const MAX_PROBLEM_STATEMENT: i32 = 12;

pub fn default_title(problem_statement_no: i32) -> Option<&'static str> {
    DEFAULT_PROBLEM_STATEMENTS
        .iter()
        .find(|(no, _)| *no == problem_statement_no)
        .map(|(_, title)| *title)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatementSetting {
    pub id: i32,
    pub title: String,
    pub max_participants: i32,
    pub is_active: bool,
}

impl ProblemStatementSetting {
    pub fn default_for(problem_statement_no: i32) -> Option<Self> {
        default_title(problem_statement_no).map(|title| ProblemStatementSetting {
            id: problem_statement_no,
            title: title.to_string(),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            is_active: true,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HackawayRegistration {
    pub id: Uuid,
    pub team_id: Uuid,
    pub problem_statement_no: i32,
    pub rank: Option<i32>,
    pub qualified: bool,
    pub presentation_link: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Registration joined with the team, for the admin HackAway table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HackawayRegistrationInfo {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub team_slug: String,
    pub problem_statement_no: i32,
    pub rank: Option<i32>,
    pub qualified: bool,
    pub registered_at: DateTime<Utc>,
}

/// Per-problem-statement occupancy. `is_full` reflects `count >= max`
/// however that state arose, including after an admin lowered the max.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatementStat {
    pub problem_statement_no: i32,
    pub title: String,
    pub count: i64,
    pub max: i32,
    pub is_full: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackawayRegisterInput {
    pub problem_statement_no: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemStatementInput {
    pub max_participants: Option<i32>,
    pub is_active: Option<bool>,
}

/// Result of `register_for_hackaway`; like event registration, a repeat
/// attempt reports the existing assignment as a soft success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackawayRegistrationOutcome {
    pub already_registered: bool,
    pub team_name: String,
    pub problem_statement_no: i32,
    pub members: Vec<TeamMemberInfo>,
}

/// Whether the caller's team holds a HackAway slot, for the registration page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackawayRegistrationStatus {
    pub is_registered: bool,
    pub no_team: bool,
    pub team_name: Option<String>,
    pub problem_statement_no: Option<i32>,
}
