use anyhow::Result;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

/// DbConnection owns the SQLite pool shared by all repositories
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePoolOptions::new().max_connections(8).connect(url).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a private in-memory database for a test.
    ///
    /// A single connection that is never recycled, so the database lives as
    /// long as the pool.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                phone TEXT,
                role TEXT NOT NULL DEFAULT 'parent',
                children TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                interests TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_children_parent ON children(parent_id);")
            .execute(pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS clubs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                longitude REAL NOT NULL DEFAULT 0,
                latitude REAL NOT NULL DEFAULT 0,
                address TEXT NOT NULL,
                schedule TEXT NOT NULL DEFAULT '[]',
                age_min INTEGER NOT NULL,
                age_max INTEGER NOT NULL,
                price REAL NOT NULL,
                contact TEXT NOT NULL DEFAULT '{}',
                interests TEXT NOT NULL DEFAULT '[]',
                images TEXT NOT NULL DEFAULT '[]',
                reviews TEXT NOT NULL DEFAULT '[]',
                total_ratings INTEGER NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                rating REAL NOT NULL DEFAULT 0,
                created_by TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name_folded TEXT NOT NULL DEFAULT '',
                text_folded TEXT NOT NULL DEFAULT ''
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_clubs_age ON clubs(age_min, age_max);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_clubs_rating ON clubs(rating DESC);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_clubs_location ON clubs(latitude, longitude);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_clubs_created_at ON clubs(created_at DESC);")
            .execute(pool)
            .await?;

        // No foreign keys: deleting a child leaves its enrollments behind
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS enrollments (
                id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                club_id TEXT NOT NULL,
                parent_id TEXT NOT NULL,
                schedule_day TEXT NOT NULL,
                schedule_time TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'confirmed', 'cancelled')),
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrollments_parent ON enrollments(parent_id);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrollments_club_status ON enrollments(club_id, status);")
            .execute(pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrollments_child ON enrollments(child_id);")
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_is_created() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .expect("Failed to list tables");
        let tables: Vec<String> = rows.iter().map(|row| row.get("name")).collect();

        for table in ["children", "clubs", "enrollments", "users"] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_status_check_constraint() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");

        let result = sqlx::query(
            r#"
            INSERT INTO enrollments (id, child_id, club_id, parent_id, schedule_day, schedule_time, status, created_at)
            VALUES ('e1', 'c1', 'k1', 'p1', 'Mon', '10:00', 'archived', '2025-01-01T00:00:00Z')
            "#,
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err(), "unknown status must be rejected by the store");
    }
}
