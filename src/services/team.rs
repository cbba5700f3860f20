use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    JoinRequest, MAX_TEAM_SIZE, MIN_TEAM_SIZE, RequestStatus, Team, TeamPreview, TeamRole,
    UserJoinRequestInfo, UserTeamView,
};
use crate::database::repositories::{
    JoinRequestRepository, TeamRepository, join_request as join_request_repo, team as team_repo,
};
use crate::error::{AppError, violates_constraint};

const SLUG_SUFFIX_LEN: usize = 6;
const SLUG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// Bounded retry for slug collisions; each attempt draws a fresh suffix.
const SLUG_ATTEMPTS: u32 = 3;

/// Maintains the one-team-per-user invariant across team creation, the
/// join-request workflow, member removal, leaving and deletion. All
/// cross-request coordination goes through the database: the
/// `team_members_user_id_key` index arbitrates membership, and the accept
/// flow locks the team row so the size bound holds at commit time.
#[derive(Clone)]
pub struct TeamService {
    pool: PgPool,
    teams: TeamRepository,
    join_requests: JoinRequestRepository,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            teams: TeamRepository::new(pool.clone()),
            join_requests: JoinRequestRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a team with the caller as leader. Returns the new team, whose
    /// slug is the shareable join code.
    pub async fn create_team(&self, user_id: Uuid, team_name: &str) -> Result<Team, AppError> {
        let team_name = team_name.trim();
        if team_name.is_empty() {
            return Err(AppError::InvalidInput("Team name is required".to_string()));
        }

        // Early, friendly check; the unique index below is the arbiter.
        if self.teams.find_membership(user_id).await?.is_some() {
            return Err(AppError::AlreadyInTeam);
        }

        for _ in 0..SLUG_ATTEMPTS {
            let slug = generate_slug(team_name);
            let mut tx = self.pool.begin().await?;

            let team = match team_repo::insert_team(&mut tx, team_name, &slug, user_id).await {
                Ok(team) => team,
                Err(e) if violates_constraint(&e, "teams_slug_key") => {
                    // Suffix collision; roll back and redraw.
                    tx.rollback().await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match team_repo::insert_member(&mut tx, team.id, user_id, TeamRole::Leader).await {
                Ok(_) => {
                    tx.commit().await?;
                    log::info!("User {} created team {} ({})", user_id, team.name, team.slug);
                    return Ok(team);
                }
                Err(e) if violates_constraint(&e, "team_members_user_id_key") => {
                    // Lost the race to a concurrent create/accept.
                    return Err(AppError::AlreadyInTeam);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::TransientStoreConflict)
    }

    /// File a join request against the team with the given slug.
    pub async fn request_join(
        &self,
        user_id: Uuid,
        slug: &str,
    ) -> Result<(JoinRequest, Team), AppError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(AppError::InvalidInput("Team code is required".to_string()));
        }

        let team = self
            .teams
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found with this code".to_string()))?;

        if self.teams.find_membership(user_id).await?.is_some() {
            return Err(AppError::AlreadyInTeam);
        }

        let request = self
            .join_requests
            .insert(team.id, user_id)
            .await
            .map_err(|e| {
                if violates_constraint(&e, "join_requests_pending_key") {
                    AppError::DuplicateRequest
                } else {
                    e.into()
                }
            })?;

        Ok((request, team))
    }

    /// Accept a pending join request. One atomic unit: the team row is
    /// locked first, so the size check, the status transition and the
    /// membership insert all commit against the same state. The requester's
    /// competing pending requests to other teams are rejected in the same
    /// transaction; once they are in a team those can no longer be granted.
    pub async fn accept_join_request(
        &self,
        leader_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), AppError> {
        let request = self
            .join_requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;

        let mut tx = self.pool.begin().await?;

        let team = team_repo::lock_team(&mut tx, request.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.leader_id != leader_id {
            return Err(AppError::Unauthorized(
                "Only the team leader can respond to join requests".to_string(),
            ));
        }

        if team_repo::member_count(&mut tx, team.id).await? >= MAX_TEAM_SIZE {
            return Err(AppError::TeamFull);
        }

        if !join_request_repo::resolve(&mut tx, request.id, RequestStatus::Accepted).await? {
            return Err(AppError::InvalidInput(
                "This join request has already been resolved".to_string(),
            ));
        }

        match team_repo::insert_member(&mut tx, team.id, request.user_id, TeamRole::Member).await {
            Ok(_) => {}
            Err(e) if violates_constraint(&e, "team_members_user_id_key") => {
                // The requester joined another team since filing; the
                // rollback keeps this request pending.
                return Err(AppError::AlreadyInTeam);
            }
            Err(e) => return Err(e.into()),
        }

        join_request_repo::reject_other_pending(&mut tx, request.user_id, request.id).await?;

        tx.commit().await?;
        log::info!(
            "User {} joined team {} via request {}",
            request.user_id,
            team.slug,
            request.id
        );
        Ok(())
    }

    /// Reject a pending join request. No membership side effect.
    pub async fn reject_join_request(
        &self,
        leader_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), AppError> {
        let request = self
            .join_requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;

        let team = self
            .teams
            .find_by_id(request.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.leader_id != leader_id {
            return Err(AppError::Unauthorized(
                "Only the team leader can respond to join requests".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        if !join_request_repo::resolve(&mut tx, request.id, RequestStatus::Rejected).await? {
            return Err(AppError::InvalidInput(
                "This join request has already been resolved".to_string(),
            ));
        }
        tx.commit().await?;

        Ok(())
    }

    /// Leader removes a non-leader member.
    pub async fn remove_member(&self, leader_id: Uuid, member_id: Uuid) -> Result<(), AppError> {
        let membership = self
            .teams
            .find_membership(leader_id)
            .await?
            .ok_or(AppError::NotInTeam)?;

        let team = self
            .teams
            .find_by_id(membership.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.leader_id != leader_id {
            return Err(AppError::Unauthorized(
                "Only the team leader can remove members".to_string(),
            ));
        }

        if member_id == leader_id {
            return Err(AppError::InvalidInput(
                "The leader cannot be removed; delete the team instead".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        if !team_repo::delete_member(&mut tx, team.id, member_id).await? {
            return Err(AppError::NotFound(
                "This user is not a member of your team".to_string(),
            ));
        }
        tx.commit().await?;

        Ok(())
    }

    /// A member leaves their team. Leaders must delete the team instead,
    /// so a team never exists without its leader.
    pub async fn leave_team(&self, user_id: Uuid) -> Result<(), AppError> {
        let membership = self
            .teams
            .find_membership(user_id)
            .await?
            .ok_or(AppError::NotInTeam)?;

        if membership.role == TeamRole::Leader {
            return Err(AppError::InvalidInput(
                "Team leaders cannot leave their team; delete the team instead".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        if !team_repo::delete_member(&mut tx, membership.team_id, user_id).await? {
            return Err(AppError::NotInTeam);
        }
        tx.commit().await?;

        Ok(())
    }

    /// Leader deletes the team. One transaction cascades join requests,
    /// memberships and the team row; a failure anywhere leaves all three.
    pub async fn delete_team(&self, leader_id: Uuid, team_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let team = team_repo::lock_team(&mut tx, team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        if team.leader_id != leader_id {
            return Err(AppError::Unauthorized(
                "Only the team leader can delete the team".to_string(),
            ));
        }

        join_request_repo::delete_for_team(&mut tx, team.id).await?;
        team_repo::delete_members_for_team(&mut tx, team.id).await?;
        team_repo::delete_team(&mut tx, team.id).await?;

        tx.commit().await?;
        log::info!("Team {} deleted by leader {}", team.slug, leader_id);
        Ok(())
    }

    /// The caller's team with members; pending join requests included for
    /// the leader.
    pub async fn get_user_team(&self, user_id: Uuid) -> Result<Option<UserTeamView>, AppError> {
        let Some(membership) = self.teams.find_membership(user_id).await? else {
            return Ok(None);
        };

        let Some(team) = self.teams.find_by_id(membership.team_id).await? else {
            return Ok(None);
        };

        let members = self.teams.members_with_users(team.id).await?;
        let is_leader = team.leader_id == user_id;
        let pending_requests = if is_leader {
            self.join_requests.pending_for_team(team.id).await?
        } else {
            Vec::new()
        };

        Ok(Some(UserTeamView {
            id: team.id,
            name: team.name,
            slug: team.slug,
            score: team.score,
            created_at: team.created_at,
            is_leader,
            min_team_size: MIN_TEAM_SIZE,
            max_team_size: MAX_TEAM_SIZE,
            members,
            pending_requests,
        }))
    }

    /// Public preview of a team by its join code.
    pub async fn get_team_by_slug(&self, slug: &str) -> Result<Option<TeamPreview>, AppError> {
        let Some(team) = self.teams.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let members = self.teams.members_with_users(team.id).await?;

        Ok(Some(TeamPreview {
            id: team.id,
            name: team.name,
            slug: team.slug,
            created_at: team.created_at,
            members,
        }))
    }

    pub async fn list_user_join_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserJoinRequestInfo>, AppError> {
        Ok(self.join_requests.for_user(user_id).await?)
    }
}

/// Shareable join code: slugified team name plus a random suffix. The
/// `teams_slug_key` constraint backstops suffix collisions at insert time.
pub fn generate_slug(name: &str) -> String {
    let mut base = String::with_capacity(name.len());
    let mut prev_dash = true; // swallow leading separators
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c);
            prev_dash = false;
        } else if !prev_dash {
            base.push('-');
            prev_dash = true;
        }
    }
    while base.ends_with('-') {
        base.pop();
    }
    if base.is_empty() {
        base.push_str("team");
    }

    let mut rng = rand::rng();
    let suffix: String = (0..SLUG_SUFFIX_LEN)
        .map(|_| SLUG_CHARSET[rng.random_range(0..SLUG_CHARSET.len())] as char)
        .collect();

    format!("{}-{}", base, suffix)
}
