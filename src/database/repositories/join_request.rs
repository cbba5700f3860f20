use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::{
    models::{JoinRequest, JoinRequestInfo, RequestStatus, UserJoinRequestInfo},
    utils::sql,
};

#[derive(Clone)]
pub struct JoinRequestRepository {
    pool: PgPool,
}

impl JoinRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending request. The partial unique index
    /// `join_requests_pending_key` rejects a second open request for the
    /// same (team, user); callers translate that violation.
    pub async fn insert(&self, team_id: Uuid, user_id: Uuid) -> Result<JoinRequest, sqlx::Error> {
        let request = sqlx::query_as::<_, JoinRequest>(&sql(r#"
            INSERT INTO
                join_requests (team_id, user_id, status, created_at)
            VALUES
                (?, ?, 'pending', ?)
            RETURNING
                id, team_id, user_id, status, created_at
        "#))
        .bind(team_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<JoinRequest>, sqlx::Error> {
        let request = sqlx::query_as::<_, JoinRequest>(&sql(r#"
            SELECT
                id, team_id, user_id, status, created_at
            FROM
                join_requests
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Pending requests against a team, with requester profiles, for the
    /// leader's approval list.
    pub async fn pending_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<JoinRequestInfo>, sqlx::Error> {
        let requests = sqlx::query_as::<_, JoinRequestInfo>(&sql(r#"
            SELECT
                jr.id,
                jr.user_id,
                u.name AS user_name,
                u.email AS user_email,
                u.image AS user_image,
                jr.created_at
            FROM
                join_requests jr
                INNER JOIN users u ON jr.user_id = u.id
            WHERE
                jr.team_id = ?
                AND jr.status = 'pending'
            ORDER BY
                jr.created_at
        "#))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// All requests a user has filed, newest first, with team details.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<UserJoinRequestInfo>, sqlx::Error> {
        let requests = sqlx::query_as::<_, UserJoinRequestInfo>(&sql(r#"
            SELECT
                jr.id,
                jr.team_id,
                t.name AS team_name,
                t.slug AS team_slug,
                jr.status,
                jr.created_at
            FROM
                join_requests jr
                INNER JOIN teams t ON jr.team_id = t.id
            WHERE
                jr.user_id = ?
            ORDER BY
                jr.created_at DESC
        "#))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}

// Transaction-scoped transitions. Every resolution is guarded by
// `status = 'pending'` so a request never leaves its terminal state.

pub async fn resolve(
    tx: &mut Transaction<'_, Postgres>,
    request_id: Uuid,
    status: RequestStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(&sql(r#"
        UPDATE
            join_requests
        SET
            status = ?
        WHERE
            id = ?
            AND status = 'pending'
    "#))
    .bind(status)
    .bind(request_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Reject every other pending request the user holds. Run in the accept
/// transaction: once a user is in a team, their competing requests are
/// no longer acceptable.
pub async fn reject_other_pending(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    except_request_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&sql(r#"
        UPDATE
            join_requests
        SET
            status = 'rejected'
        WHERE
            user_id = ?
            AND status = 'pending'
            AND id != ?
    "#))
    .bind(user_id)
    .bind(except_request_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_for_team(
    tx: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&sql("DELETE FROM join_requests WHERE team_id = ?"))
        .bind(team_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}
