use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{BranchCount, DashboardStats, GrowthPoint, HourlyCount, LeaderboardEntry},
    utils::sql,
};

// Full-table-scan aggregates for the dashboards. Nothing here is
// correctness-critical; callers cache the results.
#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let total_teams: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.pool)
            .await?;

        let total_members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members")
            .fetch_one(&self.pool)
            .await?;

        let pending_requests: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM join_requests WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;

        let total_events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        let total_registrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event_registrations")
            .fetch_one(&self.pool)
            .await?;

        let seven_days_ago = Utc::now() - Duration::days(7);

        let recent_users: i64 =
            sqlx::query_scalar(&sql("SELECT COUNT(*) FROM users WHERE created_at >= ?"))
                .bind(seven_days_ago)
                .fetch_one(&self.pool)
                .await?;

        let recent_teams: i64 =
            sqlx::query_scalar(&sql("SELECT COUNT(*) FROM teams WHERE created_at >= ?"))
                .bind(seven_days_ago)
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardStats {
            total_users,
            total_teams,
            total_members,
            pending_requests,
            total_events,
            total_registrations,
            recent_users,
            recent_teams,
        })
    }

    /// Daily sign-up counts over the last 30 days.
    pub async fn user_growth(&self) -> Result<Vec<GrowthPoint>, sqlx::Error> {
        let points = sqlx::query_as::<_, GrowthPoint>(&sql(r#"
            SELECT
                to_char(created_at, 'YYYY-MM-DD') AS date,
                COUNT(*) AS count
            FROM
                users
            WHERE
                created_at >= ?
            GROUP BY
                1
            ORDER BY
                1
        "#))
        .bind(Utc::now() - Duration::days(30))
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }

    pub async fn branch_distribution(&self) -> Result<Vec<BranchCount>, sqlx::Error> {
        let branches = sqlx::query_as::<_, BranchCount>(&sql(r#"
            SELECT
                branch,
                COUNT(*) AS count
            FROM
                users
            WHERE
                branch IS NOT NULL
            GROUP BY
                branch
            ORDER BY
                count DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }

    /// Sign-ups per hour of day over the last 7 days.
    pub async fn hourly_activity(&self) -> Result<Vec<HourlyCount>, sqlx::Error> {
        let hours = sqlx::query_as::<_, HourlyCount>(&sql(r#"
            SELECT
                EXTRACT(HOUR FROM created_at)::INT AS hour,
                COUNT(*) AS count
            FROM
                users
            WHERE
                created_at >= ?
            GROUP BY
                1
            ORDER BY
                1
        "#))
        .bind(Utc::now() - Duration::days(7))
        .fetch_all(&self.pool)
        .await?;

        Ok(hours)
    }

    pub async fn monthly_users(&self) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar(&sql("SELECT COUNT(*) FROM users WHERE created_at >= ?"))
                .bind(Utc::now() - Duration::days(30))
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
        let rows: Vec<(Uuid, String, String, i32, i64)> = sqlx::query_as(&sql(r#"
            SELECT
                t.id,
                t.name,
                t.slug,
                t.score,
                COUNT(tm.id) AS members
            FROM
                teams t
                LEFT JOIN team_members tm ON tm.team_id = t.id
            GROUP BY
                t.id, t.name, t.slug, t.score
            ORDER BY
                t.score DESC, t.created_at
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(
                |(i, (team_id, team_name, slug, points, members))| LeaderboardEntry {
                    rank: i as i64 + 1,
                    team_id,
                    team_name,
                    slug,
                    points,
                    members,
                },
            )
            .collect())
    }
}
