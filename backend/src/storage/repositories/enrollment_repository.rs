use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use crate::domain::models::enrollment::{
    AgeCount, ChildProjection, ClubEnrollmentStats, ClubProjection, Enrollment, EnrollmentListEntry,
    EnrollmentSlot, EnrollmentStatus, SlotCount, StatusCount,
};
use crate::storage::connection::DbConnection;
use crate::storage::traits::EnrollmentStorage;

const ENROLLMENT_COLUMNS: &str = "id, child_id, club_id, parent_id, schedule_day, schedule_time, status, created_at";

/// Number of (day, time) slots reported as popular
const POPULAR_SLOT_LIMIT: i64 = 5;

/// Repository for the enrollment ledger
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: DbConnection,
}

impl EnrollmentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn enrollment_from_row(row: &SqliteRow) -> Result<Enrollment> {
        let status: String = row.try_get("status")?;
        Ok(Enrollment {
            id: row.try_get("id")?,
            child_id: row.try_get("child_id")?,
            club_id: row.try_get("club_id")?,
            parent_id: row.try_get("parent_id")?,
            slot: EnrollmentSlot {
                day: row.try_get("schedule_day")?,
                time: row.try_get("schedule_time")?,
            },
            status: EnrollmentStatus::parse(&status).map_err(|e| anyhow!(e))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn list_entry_from_row(row: &SqliteRow) -> Result<EnrollmentListEntry> {
        let enrollment = Self::enrollment_from_row(row)?;

        let child_name: Option<String> = row.try_get("child_name")?;
        let child_age: Option<i64> = row.try_get("child_age")?;
        let child = match (child_name, child_age) {
            (Some(name), Some(age)) => Some(ChildProjection {
                id: enrollment.child_id.clone(),
                name,
                age: u8::try_from(age).context("Child age out of range")?,
            }),
            _ => None,
        };

        let club_name: Option<String> = row.try_get("club_name")?;
        let club = match club_name {
            Some(name) => {
                let schedule: String = row.try_get("club_schedule")?;
                Some(ClubProjection {
                    id: enrollment.club_id.clone(),
                    name,
                    category: row.try_get("club_category")?,
                    schedule: serde_json::from_str(&schedule).context("Corrupt schedule on club")?,
                    price: row.try_get("club_price")?,
                })
            }
            None => None,
        };

        Ok(EnrollmentListEntry { enrollment, child, club })
    }
}

#[async_trait]
impl EnrollmentStorage for EnrollmentRepository {
    async fn store_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, child_id, club_id, parent_id, schedule_day, schedule_time, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&enrollment.id)
        .bind(&enrollment.child_id)
        .bind(&enrollment.club_id)
        .bind(&enrollment.parent_id)
        .bind(&enrollment.slot.day)
        .bind(&enrollment.slot.time)
        .bind(enrollment.status.as_str())
        .bind(enrollment.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_enrollment_for_parent(&self, enrollment_id: &str, parent_id: &str) -> Result<Option<Enrollment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM enrollments WHERE id = ? AND parent_id = ?",
            ENROLLMENT_COLUMNS
        ))
        .bind(enrollment_id)
        .bind(parent_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::enrollment_from_row).transpose()
    }

    async fn list_enrollments_for_parent(&self, parent_id: &str) -> Result<Vec<EnrollmentListEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.child_id, e.club_id, e.parent_id, e.schedule_day, e.schedule_time,
                   e.status, e.created_at,
                   ch.name AS child_name, ch.age AS child_age,
                   cl.name AS club_name, cl.category AS club_category,
                   cl.schedule AS club_schedule, cl.price AS club_price
            FROM enrollments e
            LEFT JOIN children ch ON ch.id = e.child_id
            LEFT JOIN clubs cl ON cl.id = e.club_id
            WHERE e.parent_id = ?
            ORDER BY e.created_at DESC, e.rowid DESC
            "#,
        )
        .bind(parent_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::list_entry_from_row).collect()
    }

    async fn transition_status(
        &self,
        enrollment_id: &str,
        parent_id: Option<&str>,
        from: &[EnrollmentStatus],
        to: EnrollmentStatus,
    ) -> Result<Option<Enrollment>> {
        if from.is_empty() {
            return Ok(None);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE enrollments SET status = ");
        query.push_bind(to.as_str());
        query.push(" WHERE id = ");
        query.push_bind(enrollment_id);
        if let Some(parent_id) = parent_id {
            query.push(" AND parent_id = ");
            query.push_bind(parent_id);
        }
        query.push(" AND status IN (");
        let mut statuses = query.separated(", ");
        for status in from {
            statuses.push_bind(status.as_str());
        }
        statuses.push_unseparated(")");
        query.push(" RETURNING ");
        query.push(ENROLLMENT_COLUMNS);

        let row = query.build().fetch_optional(self.db.pool()).await?;
        row.as_ref().map(Self::enrollment_from_row).transpose()
    }

    async fn find_confirmed_for_children(&self, club_id: &str, child_ids: &[String]) -> Result<Option<Enrollment>> {
        if child_ids.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM enrollments
            WHERE club_id = ?
              AND status = 'confirmed'
              AND child_id IN (SELECT value FROM json_each(?))
            LIMIT 1
            "#,
            ENROLLMENT_COLUMNS
        ))
        .bind(club_id)
        .bind(serde_json::to_string(child_ids)?)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::enrollment_from_row).transpose()
    }

    async fn count_active_for_club(&self, club_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM enrollments WHERE club_id = ? AND status IN ('pending', 'confirmed')",
        )
        .bind(club_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count)
    }

    async fn delete_for_club(&self, club_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM enrollments WHERE club_id = ?")
            .bind(club_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn club_stats(&self, club_id: &str) -> Result<ClubEnrollmentStats> {
        let status_rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS count
            FROM enrollments
            WHERE club_id = ?
            GROUP BY status
            ORDER BY count DESC, status
            "#,
        )
        .bind(club_id)
        .fetch_all(self.db.pool())
        .await?;

        if status_rows.is_empty() {
            return Ok(ClubEnrollmentStats::default());
        }

        let statuses = status_rows
            .iter()
            .map(|row| -> Result<StatusCount> {
                let status: String = row.try_get("status")?;
                Ok(StatusCount {
                    status: EnrollmentStatus::parse(&status).map_err(|e| anyhow!(e))?,
                    count: row.try_get("count")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let total: i64 = statuses.iter().map(|s| s.count).sum();

        let age_distribution = sqlx::query(
            r#"
            SELECT ch.age AS age, COUNT(*) AS count
            FROM enrollments e
            JOIN children ch ON ch.id = e.child_id
            WHERE e.club_id = ?
            GROUP BY ch.age
            ORDER BY ch.age
            "#,
        )
        .bind(club_id)
        .fetch_all(self.db.pool())
        .await?
        .iter()
        .map(|row| -> Result<AgeCount> {
            Ok(AgeCount {
                age: row.try_get("age")?,
                count: row.try_get("count")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let popular_slots = sqlx::query(
            r#"
            SELECT schedule_day, schedule_time, COUNT(*) AS count
            FROM enrollments
            WHERE club_id = ?
            GROUP BY schedule_day, schedule_time
            ORDER BY count DESC, schedule_day, schedule_time
            LIMIT ?
            "#,
        )
        .bind(club_id)
        .bind(POPULAR_SLOT_LIMIT)
        .fetch_all(self.db.pool())
        .await?
        .iter()
        .map(|row| -> Result<SlotCount> {
            Ok(SlotCount {
                day: row.try_get("schedule_day")?,
                time: row.try_get("schedule_time")?,
                count: row.try_get("count")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(ClubEnrollmentStats {
            statuses,
            total,
            age_distribution,
            popular_slots,
        })
    }
}
