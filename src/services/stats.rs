use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::database::models::{AnalyticsData, DashboardStats, LeaderboardEntry};
use crate::database::repositories::StatsRepository;
use crate::error::AppError;

const DASHBOARD_TTL: Duration = Duration::from_secs(3600);
const LEADERBOARD_TTL: Duration = Duration::from_secs(300);

/// Read-side aggregates behind a time-bounded cache. These tolerate
/// staleness on the order of the TTLs; concurrent misses may scan twice,
/// which is fine.
#[derive(Clone)]
pub struct StatsService {
    stats: StatsRepository,
    dashboard: Cache<(), DashboardStats>,
    analytics: Cache<(), AnalyticsData>,
    leaderboard: Cache<(), Vec<LeaderboardEntry>>,
}

impl StatsService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            stats: StatsRepository::new(pool),
            dashboard: Cache::builder()
                .max_capacity(1)
                .time_to_live(DASHBOARD_TTL)
                .build(),
            analytics: Cache::builder()
                .max_capacity(1)
                .time_to_live(DASHBOARD_TTL)
                .build(),
            leaderboard: Cache::builder()
                .max_capacity(1)
                .time_to_live(LEADERBOARD_TTL)
                .build(),
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        if let Some(cached) = self.dashboard.get(&()).await {
            return Ok(cached);
        }

        let stats = self.stats.dashboard_stats().await?;
        self.dashboard.insert((), stats.clone()).await;
        Ok(stats)
    }

    pub async fn analytics(&self) -> Result<AnalyticsData, AppError> {
        if let Some(cached) = self.analytics.get(&()).await {
            return Ok(cached);
        }

        let data = AnalyticsData {
            user_growth: self.stats.user_growth().await?,
            branch_distribution: self.stats.branch_distribution().await?,
            hourly_activity: self.stats.hourly_activity().await?,
            monthly_users: self.stats.monthly_users().await?,
        };
        self.analytics.insert((), data.clone()).await;
        Ok(data)
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        if let Some(cached) = self.leaderboard.get(&()).await {
            return Ok(cached);
        }

        let entries = self.stats.leaderboard().await?;
        self.leaderboard.insert((), entries.clone()).await;
        Ok(entries)
    }
}
