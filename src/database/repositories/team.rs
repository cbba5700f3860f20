use std::collections::HashMap;

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{Team, TeamMember, TeamMemberInfo, TeamRole, TeamWithMembers},
    utils::sql,
};

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&sql(r#"
            SELECT
                id, name, slug, leader_id, score, created_at
            FROM
                teams
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Team>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&sql(r#"
            SELECT
                id, name, slug, leader_id, score, created_at
            FROM
                teams
            WHERE
                slug = ?
        "#))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// The caller's membership row, if any. At most one exists per user;
    /// the `team_members_user_id_key` index is what makes that true.
    pub async fn find_membership(&self, user_id: Uuid) -> Result<Option<TeamMember>, sqlx::Error> {
        let membership = sqlx::query_as::<_, TeamMember>(&sql(r#"
            SELECT
                id, team_id, user_id, role, joined_at
            FROM
                team_members
            WHERE
                user_id = ?
        "#))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    pub async fn members_with_users(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<TeamMemberInfo>, sqlx::Error> {
        let members = sqlx::query_as::<_, TeamMemberInfo>(&sql(r#"
            SELECT
                tm.user_id,
                u.name AS user_name,
                u.email AS user_email,
                u.image AS user_image,
                tm.role,
                tm.joined_at
            FROM
                team_members tm
                INNER JOIN users u ON tm.user_id = u.id
            WHERE
                tm.team_id = ?
            ORDER BY
                tm.joined_at
        "#))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    pub async fn member_count(&self, team_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar(&sql("SELECT COUNT(*) FROM team_members WHERE team_id = ?"))
                .bind(team_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn update_score(
        &self,
        team_id: Uuid,
        score: i32,
    ) -> Result<Option<Team>, sqlx::Error> {
        let team = sqlx::query_as::<_, Team>(&sql(r#"
            UPDATE
                teams
            SET
                score = ?
            WHERE
                id = ?
            RETURNING
                id, name, slug, leader_id, score, created_at
        "#))
        .bind(score)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    pub async fn list_all_with_members(&self) -> Result<Vec<TeamWithMembers>, sqlx::Error> {
        let teams = sqlx::query_as::<_, Team>(&sql(r#"
            SELECT
                id, name, slug, leader_id, score, created_at
            FROM
                teams
            ORDER BY
                created_at DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        // One pass for all memberships instead of a query per team.
        #[derive(sqlx::FromRow)]
        struct MemberRow {
            team_id: Uuid,
            #[sqlx(flatten)]
            member: TeamMemberInfo,
        }

        let rows = sqlx::query_as::<_, MemberRow>(&sql(r#"
            SELECT
                tm.team_id,
                tm.user_id,
                u.name AS user_name,
                u.email AS user_email,
                u.image AS user_image,
                tm.role,
                tm.joined_at
            FROM
                team_members tm
                INNER JOIN users u ON tm.user_id = u.id
            ORDER BY
                tm.joined_at
        "#))
        .fetch_all(&self.pool)
        .await?;

        let mut by_team: HashMap<Uuid, Vec<TeamMemberInfo>> = HashMap::new();
        for row in rows {
            by_team.entry(row.team_id).or_default().push(row.member);
        }

        Ok(teams
            .into_iter()
            .map(|team| {
                let members = by_team.remove(&team.id).unwrap_or_default();
                TeamWithMembers { team, members }
            })
            .collect())
    }
}

// Transaction-scoped writes. The membership flows span several of these
// inside one transaction; callers own commit/rollback.

pub async fn insert_team(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    slug: &str,
    leader_id: Uuid,
) -> Result<Team, sqlx::Error> {
    let team = sqlx::query_as::<_, Team>(&sql(r#"
        INSERT INTO
            teams (name, slug, leader_id, created_at)
        VALUES
            (?, ?, ?, ?)
        RETURNING
            id, name, slug, leader_id, score, created_at
    "#))
    .bind(name)
    .bind(slug)
    .bind(leader_id)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(team)
}

pub async fn insert_member(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<TeamMember, sqlx::Error> {
    let member = sqlx::query_as::<_, TeamMember>(&sql(r#"
        INSERT INTO
            team_members (team_id, user_id, role, joined_at)
        VALUES
            (?, ?, ?, ?)
        RETURNING
            id, team_id, user_id, role, joined_at
    "#))
    .bind(team_id)
    .bind(user_id)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    Ok(member)
}

/// Lock the team row for the rest of the transaction. Serializes the
/// size-bounded accept flow per team.
pub async fn lock_team(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<Option<Team>, sqlx::Error> {
    let team = sqlx::query_as::<_, Team>(&sql(r#"
        SELECT
            id, name, slug, leader_id, score, created_at
        FROM
            teams
        WHERE
            id = ?
        FOR UPDATE
    "#))
    .bind(team_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(team)
}

pub async fn member_count(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar(&sql("SELECT COUNT(*) FROM team_members WHERE team_id = ?"))
            .bind(team_id)
            .fetch_one(&mut **tx)
            .await?;

    Ok(count)
}

/// Delete a single non-leader membership; returns whether a row went away.
pub async fn delete_member(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(r#"
        DELETE FROM team_members
        WHERE
            team_id = ?
            AND user_id = ?
            AND role = 'member'
    "#))
    .bind(team_id)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_members_for_team(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&sql("DELETE FROM team_members WHERE team_id = ?"))
        .bind(team_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_team(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql("DELETE FROM teams WHERE id = ?"))
        .bind(team_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}
