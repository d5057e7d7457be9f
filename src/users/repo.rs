use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::UserRow;
use crate::health::services::Pingable;

/// Data access for the `users` table. Driver errors come back unchanged apart
/// from context, so callers can still spot `sqlx::Error::RowNotFound`.
#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// All users; an empty table is reported as `RowNotFound`.
    async fn list(&self) -> anyhow::Result<Vec<UserRow>>;
    async fn get(&self, id: i32) -> anyhow::Result<UserRow>;
    async fn create(&self, name: &str, email: &str, password: &str) -> anyhow::Result<UserRow>;
    async fn update(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserRow>;
    async fn delete(&self, id: i32) -> anyhow::Result<UserRow>;
}

#[derive(Clone)]
pub struct PgUsersRepo {
    db: PgPool,
}

impl PgUsersRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

// Each call checks out its own connection; the guard returns it to the pool
// on every exit path.
#[async_trait]
impl UsersRepo for PgUsersRepo {
    async fn list(&self) -> anyhow::Result<Vec<UserRow>> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let users = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("list users")?;

        if users.is_empty() {
            return Err(anyhow::Error::new(sqlx::Error::RowNotFound).context("no users found"));
        }
        Ok(users)
    }

    async fn get(&self, id: i32) -> anyhow::Result<UserRow> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("get user {id}"))?;
        Ok(user)
    }

    async fn create(&self, name: &str, email: &str, password: &str) -> anyhow::Result<UserRow> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .fetch_one(&mut *conn)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn update(
        &self,
        id: i32,
        name: &str,
        email: &str,
        password: &str,
    ) -> anyhow::Result<UserRow> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = $1, email = $2, password = $3
            WHERE id = $4
            RETURNING id, name, email
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password)
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("update user {id}"))?;
        Ok(user)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<UserRow> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, name, email
            "#,
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("delete user {id}"))?;
        Ok(user)
    }
}

#[async_trait]
impl Pingable for PgUsersRepo {
    fn name(&self) -> &str {
        "Users"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.db)
            .await
            .context("ping users database")?;
        Ok(())
    }
}
