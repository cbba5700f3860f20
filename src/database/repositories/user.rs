use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{UpdateProfileInput, User, UserRole},
    utils::sql,
};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user row from a verified session. The identity
    /// provider owns authentication; this is the "first sign-in creates the
    /// user" hook, and later sessions keep name/image current.
    pub async fn upsert_from_session(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&sql(r#"
            INSERT INTO
                users (id, name, email, image, created_at, updated_at)
            VALUES
                (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE
            SET
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                updated_at = EXCLUDED.updated_at
            RETURNING
                id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
        "#))
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(image)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&sql(r#"
            SELECT
                id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
            FROM
                users
            WHERE
                id = ?
        "#))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        input: &UpdateProfileInput,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&sql(r#"
            UPDATE
                users
            SET
                roll_no = ?,
                branch = ?,
                phone_no = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
        "#))
        .bind(&input.roll_no)
        .bind(&input.branch)
        .bind(&input.phone_no)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&sql(r#"
            UPDATE
                users
            SET
                role = ?,
                updated_at = ?
            WHERE
                id = ?
            RETURNING
                id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
        "#))
        .bind(role)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&sql(r#"
            SELECT
                id, name, email, image, role, roll_no, branch, phone_no, created_at, updated_at
            FROM
                users
            ORDER BY
                created_at DESC
        "#))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
