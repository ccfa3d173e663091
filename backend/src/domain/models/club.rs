//! backend/src/domain/models/club.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub day: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
}

/// Inclusive range of ages a club accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

impl AgeRange {
    pub fn contains(&self, age: u8) -> bool {
        self.min <= age && age <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubImage {
    pub id: String,
    pub url: String,
    pub filename: String,
}

/// A review embedded in its club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: &str, rating: u8, comment: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Running review counters of a club, as left by the latest increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingCounters {
    pub total_ratings: i64,
    pub review_count: i64,
}

impl RatingCounters {
    pub fn average(&self) -> f64 {
        Club::average_rating(self.total_ratings, self.review_count)
    }
}

/// Domain model of a bookable club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: GeoPoint,
    pub address: String,
    pub schedule: Vec<ScheduleSlot>,
    pub age_range: AgeRange,
    pub price: f64,
    pub contact: Contact,
    pub interests: Vec<String>,
    pub images: Vec<ClubImage>,
    pub reviews: Vec<Review>,
    pub total_ratings: i64,
    pub review_count: i64,
    pub rating: f64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Club {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Mean rating, 0 for a club without reviews.
    pub fn average_rating(total_ratings: i64, review_count: i64) -> f64 {
        if review_count <= 0 {
            0.0
        } else {
            total_ratings as f64 / review_count as f64
        }
    }
}

/// Short projection used by autocomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct ClubSuggestion {
    pub id: String,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClubSortField {
    Rating,
    Price,
    Name,
    CreatedAt,
    ReviewCount,
}

impl ClubSortField {
    /// Parse a client supplied sort key. Unknown keys are rejected.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "rating" => Some(Self::Rating),
            "price" => Some(Self::Price),
            "name" => Some(Self::Name),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "reviewCount" | "review_count" => Some(Self::ReviewCount),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClubSort {
    pub field: ClubSortField,
    pub descending: bool,
}

impl Default for ClubSort {
    fn default() -> Self {
        Self {
            field: ClubSortField::Rating,
            descending: true,
        }
    }
}

/// Circle around a point, radius in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub max_distance_m: f64,
}

/// Filters accepted by club search. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubSearchFilter {
    pub text: Option<String>,
    pub category: Option<String>,
    pub age: Option<u8>,
    pub interests: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub near: Option<GeoRadius>,
    pub sort: ClubSort,
}
