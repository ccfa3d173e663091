use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::user::User;
use crate::storage::connection::DbConnection;
use crate::storage::traits::UserStorage;

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, role, children, created_at, updated_at";

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn user_from_row(row: &SqliteRow) -> Result<User> {
        let children: String = row.try_get("children")?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            phone: row.try_get("phone")?,
            role: row.try_get("role")?,
            children: serde_json::from_str(&children).context("Corrupt child list on user")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn store_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, role, children, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.role)
        .bind(serde_json::to_string(&user.children)?)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::user_from_row).transpose()
    }

    async fn push_child(&self, user_id: &str, child_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET children = json_insert(children, '$[#]', ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(child_id)
        .bind(chrono::Utc::now())
        .bind(user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn pull_child(&self, user_id: &str, child_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET children = (
                    SELECT json_group_array(value)
                    FROM (SELECT value FROM json_each(users.children) WHERE value != ? ORDER BY key)
                ),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(child_id)
        .bind(chrono::Utc::now())
        .bind(user_id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
