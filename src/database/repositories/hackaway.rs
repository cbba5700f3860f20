use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{HackawayRegistration, HackawayRegistrationInfo, ProblemStatementSetting},
    utils::sql,
};

#[derive(Clone)]
pub struct HackawayRepository {
    pool: PgPool,
}

impl HackawayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_team(
        &self,
        team_id: Uuid,
    ) -> Result<Option<HackawayRegistration>, sqlx::Error> {
        let registration = sqlx::query_as::<_, HackawayRegistration>(&sql(r#"
            SELECT
                id, team_id, problem_statement_no, rank, qualified,
                presentation_link, registered_at
            FROM
                hackaway_registrations
            WHERE
                team_id = ?
        "#))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Persisted overrides only; merging with the compiled-in defaults is
    /// the service's job.
    pub async fn setting_overrides(&self) -> Result<Vec<ProblemStatementSetting>, sqlx::Error> {
        let settings = sqlx::query_as::<_, ProblemStatementSetting>(&sql(r#"
            SELECT
                id, title, max_participants, is_active
            FROM
                problem_statement_settings
            ORDER BY
                id
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(settings)
    }

    pub async fn upsert_setting(
        &self,
        setting: &ProblemStatementSetting,
    ) -> Result<ProblemStatementSetting, sqlx::Error> {
        let setting = sqlx::query_as::<_, ProblemStatementSetting>(&sql(r#"
            INSERT INTO
                problem_statement_settings (id, title, max_participants, is_active)
            VALUES
                (?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE
            SET
                max_participants = EXCLUDED.max_participants,
                is_active = EXCLUDED.is_active
            RETURNING
                id, title, max_participants, is_active
        "#))
        .bind(setting.id)
        .bind(&setting.title)
        .bind(setting.max_participants)
        .bind(setting.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(setting)
    }

    pub async fn registration_counts(&self) -> Result<Vec<(i32, i64)>, sqlx::Error> {
        let counts: Vec<(i32, i64)> = sqlx::query_as(&sql(r#"
            SELECT
                problem_statement_no,
                COUNT(*)
            FROM
                hackaway_registrations
            GROUP BY
                problem_statement_no
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn list_registrations(&self) -> Result<Vec<HackawayRegistrationInfo>, sqlx::Error> {
        let registrations = sqlx::query_as::<_, HackawayRegistrationInfo>(&sql(r#"
            SELECT
                hr.id,
                hr.team_id,
                t.name AS team_name,
                t.slug AS team_slug,
                hr.problem_statement_no,
                hr.rank,
                hr.qualified,
                hr.registered_at
            FROM
                hackaway_registrations hr
                INNER JOIN teams t ON hr.team_id = t.id
            ORDER BY
                hr.problem_statement_no, hr.registered_at
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }
}

// The capacity gate. These three run inside one transaction: materialize
// the settings row if it is still a compiled-in default, lock it, then
// count and insert under that lock. The lock serializes all registrations
// for one problem statement, so the count made here still holds when the
// insert commits.

pub async fn ensure_setting(
    tx: &mut Transaction<'_, Postgres>,
    defaults: &ProblemStatementSetting,
) -> Result<(), sqlx::Error> {
    sqlx::query(&sql(r#"
        INSERT INTO
            problem_statement_settings (id, title, max_participants, is_active)
        VALUES
            (?, ?, ?, ?)
        ON CONFLICT (id) DO NOTHING
    "#))
    .bind(defaults.id)
    .bind(&defaults.title)
    .bind(defaults.max_participants)
    .bind(defaults.is_active)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn lock_setting(
    tx: &mut Transaction<'_, Postgres>,
    problem_statement_no: i32,
) -> Result<ProblemStatementSetting, sqlx::Error> {
    let setting = sqlx::query_as::<_, ProblemStatementSetting>(&sql(r#"
        SELECT
            id, title, max_participants, is_active
        FROM
            problem_statement_settings
        WHERE
            id = ?
        FOR UPDATE
    "#))
    .bind(problem_statement_no)
    .fetch_one(&mut **tx)
    .await?;

    Ok(setting)
}

pub async fn count_for_statement(
    tx: &mut Transaction<'_, Postgres>,
    problem_statement_no: i32,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&sql(
        "SELECT COUNT(*) FROM hackaway_registrations WHERE problem_statement_no = ?",
    ))
    .bind(problem_statement_no)
    .fetch_one(&mut **tx)
    .await?;

    Ok(count)
}

pub async fn insert_registration(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    problem_statement_no: i32,
) -> Result<HackawayRegistration, sqlx::Error> {
    let registration = sqlx::query_as::<_, HackawayRegistration>(&sql(r#"
        INSERT INTO
            hackaway_registrations (team_id, problem_statement_no, registered_at)
        VALUES
            (?, ?, ?)
        RETURNING
            id, team_id, problem_statement_no, rank, qualified,
            presentation_link, registered_at
    "#))
    .bind(team_id)
    .bind(problem_statement_no)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(registration)
}
