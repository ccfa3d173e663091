use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::child::Child;
use crate::storage::connection::DbConnection;
use crate::storage::traits::ChildStorage;

const CHILD_COLUMNS: &str = "id, parent_id, name, age, interests, created_at, updated_at";

/// Repository for child profiles
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub(crate) fn child_from_row(row: &SqliteRow) -> Result<Child> {
        let interests: String = row.try_get("interests")?;
        let age: i64 = row.try_get("age")?;
        Ok(Child {
            id: row.try_get("id")?,
            parent_id: row.try_get("parent_id")?,
            name: row.try_get("name")?,
            age: u8::try_from(age).context("Child age out of range")?,
            interests: serde_json::from_str(&interests).context("Corrupt interests on child")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ChildStorage for ChildRepository {
    async fn store_child(&self, child: &Child) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (id, parent_id, name, age, interests, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.parent_id)
        .bind(&child.name)
        .bind(child.age as i64)
        .bind(serde_json::to_string(&child.interests)?)
        .bind(child.created_at)
        .bind(child.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(&format!("SELECT {} FROM children WHERE id = ?", CHILD_COLUMNS))
            .bind(child_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::child_from_row).transpose()
    }

    async fn get_child_for_parent(&self, child_id: &str, parent_id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM children WHERE id = ? AND parent_id = ?",
            CHILD_COLUMNS
        ))
        .bind(child_id)
        .bind(parent_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::child_from_row).transpose()
    }

    async fn list_children_for_parent(&self, parent_id: &str) -> Result<Vec<Child>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM children WHERE parent_id = ? ORDER BY rowid",
            CHILD_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::child_from_row).collect()
    }

    async fn update_child(&self, child: &Child) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE children
            SET name = ?, age = ?, interests = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&child.name)
        .bind(child.age as i64)
        .bind(serde_json::to_string(&child.interests)?)
        .bind(child.updated_at)
        .bind(&child.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_child_for_parent(&self, child_id: &str, parent_id: &str) -> Result<Option<Child>> {
        let row = sqlx::query(&format!(
            "DELETE FROM children WHERE id = ? AND parent_id = ? RETURNING {}",
            CHILD_COLUMNS
        ))
        .bind(child_id)
        .bind(parent_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::child_from_row).transpose()
    }
}
