use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::club::{AgeRange, Club, ClubImage, GeoPoint, RatingCounters, Review};
use crate::storage::connection::DbConnection;
use crate::storage::traits::ClubStorage;

pub(crate) const CLUB_COLUMNS: &str = "id, name, description, category, longitude, latitude, address, \
     schedule, age_min, age_max, price, contact, interests, images, reviews, total_ratings, \
     review_count, rating, created_by, created_at, updated_at";

/// Unicode lowercase; SQLite's own `LIKE` and `lower()` only fold ASCII
pub(crate) fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Name, description and category folded into one searchable column
fn folded_text(club: &Club) -> String {
    fold_case(&format!("{}\n{}\n{}", club.name, club.description, club.category))
}

/// Repository for the club catalog.
///
/// Document-like attributes (schedule, contact, interests, images, reviews)
/// live in JSON columns and are edited in place with SQLite's JSON functions.
#[derive(Clone)]
pub struct ClubRepository {
    db: DbConnection,
}

impl ClubRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub(crate) fn club_from_row(row: &SqliteRow) -> Result<Club> {
        let schedule: String = row.try_get("schedule")?;
        let contact: String = row.try_get("contact")?;
        let interests: String = row.try_get("interests")?;
        let images: String = row.try_get("images")?;
        let reviews: String = row.try_get("reviews")?;
        let age_min: i64 = row.try_get("age_min")?;
        let age_max: i64 = row.try_get("age_max")?;

        Ok(Club {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            location: GeoPoint {
                longitude: row.try_get("longitude")?,
                latitude: row.try_get("latitude")?,
            },
            address: row.try_get("address")?,
            schedule: serde_json::from_str(&schedule).context("Corrupt schedule on club")?,
            age_range: AgeRange {
                min: u8::try_from(age_min).context("Club minimum age out of range")?,
                max: u8::try_from(age_max).context("Club maximum age out of range")?,
            },
            price: row.try_get("price")?,
            contact: serde_json::from_str(&contact).context("Corrupt contact on club")?,
            interests: serde_json::from_str(&interests).context("Corrupt interests on club")?,
            images: serde_json::from_str(&images).context("Corrupt images on club")?,
            reviews: serde_json::from_str(&reviews).context("Corrupt reviews on club")?,
            total_ratings: row.try_get("total_ratings")?,
            review_count: row.try_get("review_count")?,
            rating: row.try_get("rating")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ClubStorage for ClubRepository {
    async fn store_club(&self, club: &Club) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clubs (
                id, name, description, category, longitude, latitude, address, schedule,
                age_min, age_max, price, contact, interests, images, reviews,
                total_ratings, review_count, rating, created_by, created_at, updated_at,
                name_folded, text_folded
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&club.id)
        .bind(&club.name)
        .bind(&club.description)
        .bind(&club.category)
        .bind(club.location.longitude)
        .bind(club.location.latitude)
        .bind(&club.address)
        .bind(serde_json::to_string(&club.schedule)?)
        .bind(club.age_range.min as i64)
        .bind(club.age_range.max as i64)
        .bind(club.price)
        .bind(serde_json::to_string(&club.contact)?)
        .bind(serde_json::to_string(&club.interests)?)
        .bind(serde_json::to_string(&club.images)?)
        .bind(serde_json::to_string(&club.reviews)?)
        .bind(club.total_ratings)
        .bind(club.review_count)
        .bind(club.rating)
        .bind(&club.created_by)
        .bind(club.created_at)
        .bind(club.updated_at)
        .bind(fold_case(&club.name))
        .bind(folded_text(club))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_club(&self, club_id: &str) -> Result<Option<Club>> {
        let row = sqlx::query(&format!("SELECT {} FROM clubs WHERE id = ?", CLUB_COLUMNS))
            .bind(club_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::club_from_row).transpose()
    }

    async fn list_clubs(&self, offset: u32, limit: u32) -> Result<Vec<Club>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM clubs ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            CLUB_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::club_from_row).collect()
    }

    async fn count_clubs(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clubs")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn update_club(&self, club: &Club) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE clubs
            SET name = ?, description = ?, category = ?, longitude = ?, latitude = ?,
                address = ?, schedule = ?, age_min = ?, age_max = ?, price = ?,
                contact = ?, interests = ?, updated_at = ?, name_folded = ?, text_folded = ?
            WHERE id = ?
            "#,
        )
        .bind(&club.name)
        .bind(&club.description)
        .bind(&club.category)
        .bind(club.location.longitude)
        .bind(club.location.latitude)
        .bind(&club.address)
        .bind(serde_json::to_string(&club.schedule)?)
        .bind(club.age_range.min as i64)
        .bind(club.age_range.max as i64)
        .bind(club.price)
        .bind(serde_json::to_string(&club.contact)?)
        .bind(serde_json::to_string(&club.interests)?)
        .bind(club.updated_at)
        .bind(fold_case(&club.name))
        .bind(folded_text(club))
        .bind(&club.id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_club(&self, club_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clubs WHERE id = ?")
            .bind(club_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn replace_images(&self, club_id: &str, images: &[ClubImage]) -> Result<bool> {
        let result = sqlx::query("UPDATE clubs SET images = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(images)?)
            .bind(chrono::Utc::now())
            .bind(club_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_review(&self, club_id: &str, review: &Review) -> Result<Option<RatingCounters>> {
        let row = sqlx::query(
            r#"
            UPDATE clubs
            SET reviews = json_insert(reviews, '$[#]', json(?)),
                total_ratings = total_ratings + ?,
                review_count = review_count + 1,
                updated_at = ?
            WHERE id = ?
            RETURNING total_ratings, review_count
            "#,
        )
        .bind(serde_json::to_string(review)?)
        .bind(review.rating as i64)
        .bind(chrono::Utc::now())
        .bind(club_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(|row| -> Result<RatingCounters> {
            Ok(RatingCounters {
                total_ratings: row.try_get("total_ratings")?,
                review_count: row.try_get("review_count")?,
            })
        })
        .transpose()
    }

    async fn set_rating(&self, club_id: &str, rating: f64) -> Result<()> {
        sqlx::query("UPDATE clubs SET rating = ? WHERE id = ?")
            .bind(rating)
            .bind(club_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn find_by_interests_and_age(&self, interests: &[String], age: u8, limit: u32) -> Result<Vec<Club>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM clubs
            WHERE age_min <= ? AND age_max >= ?
              AND EXISTS (
                  SELECT 1 FROM json_each(clubs.interests) ci
                  WHERE ci.value IN (SELECT value FROM json_each(?))
              )
            ORDER BY rowid
            LIMIT ?
            "#,
            CLUB_COLUMNS
        ))
        .bind(age as i64)
        .bind(age as i64)
        .bind(serde_json::to_string(interests)?)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::club_from_row).collect()
    }

    async fn find_top_rated_for_age(&self, age: u8, limit: u32) -> Result<Vec<Club>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM clubs
            WHERE age_min <= ? AND age_max >= ?
            ORDER BY rating DESC, rowid
            LIMIT ?
            "#,
            CLUB_COLUMNS
        ))
        .bind(age as i64)
        .bind(age as i64)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::club_from_row).collect()
    }
}
