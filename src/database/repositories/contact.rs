use chrono::Utc;
use sqlx::PgPool;

use crate::database::{
    models::{ContactInput, ContactMessage},
    utils::sql,
};

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, input: &ContactInput) -> Result<ContactMessage, sqlx::Error> {
        let message = sqlx::query_as::<_, ContactMessage>(&sql(r#"
            INSERT INTO
                contact_messages (name, email, subject, message, created_at)
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING
                id, name, email, subject, message, created_at
        "#))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.subject)
        .bind(&input.message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn list_all(&self) -> Result<Vec<ContactMessage>, sqlx::Error> {
        let messages = sqlx::query_as::<_, ContactMessage>(&sql(r#"
            SELECT
                id, name, email, subject, message, created_at
            FROM
                contact_messages
            ORDER BY
                created_at DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
