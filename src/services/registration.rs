use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{
    EventRegistrationOutcome, HackawayRegistrationInfo, HackawayRegistrationOutcome,
    HackawayRegistrationStatus, MAX_PROBLEM_STATEMENT, MAX_TEAM_SIZE, MIN_PROBLEM_STATEMENT,
    MIN_TEAM_SIZE, ProblemStatementSetting, ProblemStatementStat, UpdateProblemStatementInput,
};
use crate::database::repositories::{
    EventRepository, HackawayRepository, TeamRepository, hackaway as hackaway_repo,
    team as team_repo,
};
use crate::error::{AppError, is_unique_violation};

const MIN_MAX_PARTICIPANTS: i32 = 1;
const MAX_MAX_PARTICIPANTS: i32 = 100;

/// Registers teams for events and HackAway problem statements. The
/// HackAway path is the capacity-gated one: count and insert run in a
/// single transaction holding the problem statement's settings row lock,
/// so the configured max holds at every commit no matter how many
/// requests race for the last slot.
#[derive(Clone)]
pub struct RegistrationService {
    pool: PgPool,
    teams: TeamRepository,
    events: EventRepository,
    hackaway: HackawayRepository,
}

impl RegistrationService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            teams: TeamRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            hackaway: HackawayRepository::new(pool.clone()),
            pool,
        }
    }

    /// Register the caller's team for an event. Re-registering (or losing
    /// a duplicate race) reports the existing registration as a soft
    /// success; there is no capacity limit on generic events.
    pub async fn register_for_event(
        &self,
        user_id: Uuid,
        event_slug: &str,
    ) -> Result<EventRegistrationOutcome, AppError> {
        let membership = self
            .teams
            .find_membership(user_id)
            .await?
            .ok_or(AppError::NotInTeam)?;

        let event = self
            .events
            .find_by_slug(event_slug)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if self
            .events
            .find_registration(event.id, membership.team_id)
            .await?
            .is_some()
        {
            return Ok(EventRegistrationOutcome {
                already_registered: true,
                event_name: event.name,
            });
        }

        match self
            .events
            .insert_registration(event.id, membership.team_id)
            .await
        {
            Ok(_) => Ok(EventRegistrationOutcome {
                already_registered: false,
                event_name: event.name,
            }),
            // A concurrent duplicate landed first; same end state.
            Err(e) if is_unique_violation(&e) => Ok(EventRegistrationOutcome {
                already_registered: true,
                event_name: event.name,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Register the caller's team for one HackAway problem statement.
    pub async fn register_for_hackaway(
        &self,
        user_id: Uuid,
        problem_statement_no: i32,
    ) -> Result<HackawayRegistrationOutcome, AppError> {
        let defaults = ProblemStatementSetting::default_for(problem_statement_no).ok_or_else(
            || AppError::InvalidInput("Invalid problem statement selected".to_string()),
        )?;

        let membership = self
            .teams
            .find_membership(user_id)
            .await?
            .ok_or(AppError::NotInTeam)?;

        let team = self
            .teams
            .find_by_id(membership.team_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        let members = self.teams.members_with_users(team.id).await?;

        if let Some(existing) = self.hackaway.find_by_team(team.id).await? {
            return Ok(HackawayRegistrationOutcome {
                already_registered: true,
                team_name: team.name,
                problem_statement_no: existing.problem_statement_no,
                members,
            });
        }

        // The capacity gate. Everything from the settings-row lock to the
        // insert commits or rolls back as one unit.
        let mut tx = self.pool.begin().await?;

        hackaway_repo::ensure_setting(&mut tx, &defaults).await?;
        let setting = hackaway_repo::lock_setting(&mut tx, problem_statement_no).await?;

        if !setting.is_active {
            return Err(AppError::ProblemStatementInactive);
        }

        let team_size = team_repo::member_count(&mut tx, team.id).await?;
        if team_size < MIN_TEAM_SIZE {
            return Err(AppError::TeamTooSmall);
        }
        if team_size > MAX_TEAM_SIZE {
            return Err(AppError::TeamTooLarge);
        }

        let registered =
            hackaway_repo::count_for_statement(&mut tx, problem_statement_no).await?;
        if registered >= setting.max_participants as i64 {
            return Err(AppError::ProblemStatementFull);
        }

        match hackaway_repo::insert_registration(&mut tx, team.id, problem_statement_no).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                // Another member registered the team concurrently.
                drop(tx);
                let existing = self.hackaway.find_by_team(team.id).await?;
                return Ok(HackawayRegistrationOutcome {
                    already_registered: true,
                    team_name: team.name,
                    problem_statement_no: existing
                        .map(|r| r.problem_statement_no)
                        .unwrap_or(problem_statement_no),
                    members,
                });
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        log::info!(
            "Team {} registered for problem statement {}",
            team.slug,
            problem_statement_no
        );

        Ok(HackawayRegistrationOutcome {
            already_registered: false,
            team_name: team.name,
            problem_statement_no,
            members,
        })
    }

    /// Admin adjustment of a problem statement's capacity or availability.
    /// Lowering the max below the live registration count is allowed; the
    /// overshoot shows up as full and nothing is evicted.
    pub async fn update_problem_statement(
        &self,
        problem_statement_no: i32,
        input: &UpdateProblemStatementInput,
    ) -> Result<ProblemStatementSetting, AppError> {
        let defaults = ProblemStatementSetting::default_for(problem_statement_no).ok_or_else(
            || AppError::InvalidInput("Invalid problem statement selected".to_string()),
        )?;

        let current = self
            .persisted_setting(problem_statement_no)
            .await?
            .unwrap_or(defaults);

        let max_participants = input.max_participants.unwrap_or(current.max_participants);
        if !(MIN_MAX_PARTICIPANTS..=MAX_MAX_PARTICIPANTS).contains(&max_participants) {
            return Err(AppError::InvalidInput(format!(
                "Max participants must be between {} and {}",
                MIN_MAX_PARTICIPANTS, MAX_MAX_PARTICIPANTS
            )));
        }

        let setting = ProblemStatementSetting {
            id: problem_statement_no,
            title: current.title,
            max_participants,
            is_active: input.is_active.unwrap_or(current.is_active),
        };

        Ok(self.hackaway.upsert_setting(&setting).await?)
    }

    /// All twelve problem statements: compiled-in defaults overlaid with
    /// whatever sparse overrides the admin has persisted.
    pub async fn problem_statement_settings(
        &self,
    ) -> Result<Vec<ProblemStatementSetting>, AppError> {
        let overrides = self.hackaway.setting_overrides().await?;

        Ok((MIN_PROBLEM_STATEMENT..=MAX_PROBLEM_STATEMENT)
            .filter_map(|no| {
                overrides
                    .iter()
                    .find(|s| s.id == no)
                    .cloned()
                    .or_else(|| ProblemStatementSetting::default_for(no))
            })
            .collect())
    }

    /// Occupancy per problem statement for the selection page and the
    /// admin dashboard.
    pub async fn hackaway_stats(&self) -> Result<Vec<ProblemStatementStat>, AppError> {
        let settings = self.problem_statement_settings().await?;
        let counts = self.hackaway.registration_counts().await?;

        Ok(settings
            .into_iter()
            .map(|setting| {
                let count = counts
                    .iter()
                    .find(|(no, _)| *no == setting.id)
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                ProblemStatementStat {
                    problem_statement_no: setting.id,
                    title: setting.title,
                    count,
                    max: setting.max_participants,
                    is_full: count >= setting.max_participants as i64,
                    is_active: setting.is_active,
                }
            })
            .collect())
    }

    /// Whether the caller's team already holds a HackAway slot.
    pub async fn check_registration(
        &self,
        user_id: Uuid,
    ) -> Result<HackawayRegistrationStatus, AppError> {
        let Some(membership) = self.teams.find_membership(user_id).await? else {
            return Ok(HackawayRegistrationStatus {
                is_registered: false,
                no_team: true,
                team_name: None,
                problem_statement_no: None,
            });
        };

        let team = self.teams.find_by_id(membership.team_id).await?;
        let registration = self.hackaway.find_by_team(membership.team_id).await?;

        Ok(HackawayRegistrationStatus {
            is_registered: registration.is_some(),
            no_team: false,
            team_name: team.map(|t| t.name),
            problem_statement_no: registration.map(|r| r.problem_statement_no),
        })
    }

    /// Slugs of events the caller's team is registered for.
    pub async fn user_event_registrations(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let Some(membership) = self.teams.find_membership(user_id).await? else {
            return Ok(Vec::new());
        };

        Ok(self
            .events
            .registered_slugs_for_team(membership.team_id)
            .await?)
    }

    pub async fn list_hackaway_registrations(
        &self,
    ) -> Result<Vec<HackawayRegistrationInfo>, AppError> {
        Ok(self.hackaway.list_registrations().await?)
    }

    async fn persisted_setting(
        &self,
        problem_statement_no: i32,
    ) -> Result<Option<ProblemStatementSetting>, AppError> {
        Ok(self
            .hackaway
            .setting_overrides()
            .await?
            .into_iter()
            .find(|s| s.id == problem_statement_no))
    }
}
