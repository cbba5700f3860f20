use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{Event, EventInput, EventRegistration, EventRegistrationInfo},
    utils::sql,
};

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &EventInput) -> Result<Event, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&sql(r#"
            INSERT INTO
                events (
                    name,
                    slug,
                    description,
                    category,
                    start_time,
                    end_time,
                    max_score,
                    is_active,
                    created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id, name, slug, description, category, start_time, end_time,
                max_score, is_active, created_at
        "#))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.max_score)
        .bind(input.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn update(&self, id: Uuid, input: &EventInput) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&sql(r#"
            UPDATE
                events
            SET
                name = ?,
                slug = ?,
                description = ?,
                category = ?,
                start_time = ?,
                end_time = ?,
                max_score = ?,
                is_active = ?
            WHERE
                id = ?
            RETURNING
                id, name, slug, description, category, start_time, end_time,
                max_score, is_active, created_at
        "#))
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.max_score)
        .bind(input.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Registrations reference the event; drop them with it.
        sqlx::query(&sql("DELETE FROM event_registrations WHERE event_id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(&sql("DELETE FROM events WHERE id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Event>, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&sql(r#"
            SELECT
                id, name, slug, description, category, start_time, end_time,
                max_score, is_active, created_at
            FROM
                events
            WHERE
                slug = ?
        "#))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn list_active(&self) -> Result<Vec<Event>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(&sql(r#"
            SELECT
                id, name, slug, description, category, start_time, end_time,
                max_score, is_active, created_at
            FROM
                events
            WHERE
                is_active = TRUE
            ORDER BY
                start_time
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn list_all(&self) -> Result<Vec<Event>, sqlx::Error> {
        let events = sqlx::query_as::<_, Event>(&sql(r#"
            SELECT
                id, name, slug, description, category, start_time, end_time,
                max_score, is_active, created_at
            FROM
                events
            ORDER BY
                created_at DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn find_registration(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<EventRegistration>, sqlx::Error> {
        let registration = sqlx::query_as::<_, EventRegistration>(&sql(r#"
            SELECT
                id, event_id, team_id, score, rank, registered_at
            FROM
                event_registrations
            WHERE
                event_id = ?
                AND team_id = ?
        "#))
        .bind(event_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Plain insert; the `event_registrations_event_team_key` constraint is
    /// what makes registration idempotent under racing duplicates.
    pub async fn insert_registration(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> Result<EventRegistration, sqlx::Error> {
        let registration = sqlx::query_as::<_, EventRegistration>(&sql(r#"
            INSERT INTO
                event_registrations (event_id, team_id, registered_at)
            VALUES
                (?, ?, ?)
            RETURNING
                id, event_id, team_id, score, rank, registered_at
        "#))
        .bind(event_id)
        .bind(team_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Slugs of events the team is registered for, for the events page.
    pub async fn registered_slugs_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        let slugs: Vec<String> = sqlx::query_scalar(&sql(r#"
            SELECT
                e.slug
            FROM
                event_registrations er
                INNER JOIN events e ON er.event_id = e.id
            WHERE
                er.team_id = ?
        "#))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }

    pub async fn list_registrations(&self) -> Result<Vec<EventRegistrationInfo>, sqlx::Error> {
        let registrations = sqlx::query_as::<_, EventRegistrationInfo>(&sql(r#"
            SELECT
                er.id,
                er.event_id,
                er.team_id,
                er.score,
                er.rank,
                er.registered_at,
                e.name AS event_name,
                e.category AS event_category,
                e.slug AS event_slug,
                t.name AS team_name,
                t.slug AS team_slug
            FROM
                event_registrations er
                INNER JOIN events e ON er.event_id = e.id
                INNER JOIN teams t ON er.team_id = t.id
            ORDER BY
                er.registered_at DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }
}
