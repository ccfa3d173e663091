//! # Storage Traits
//!
//! Storage abstractions consumed by the domain layer. Every method is a
//! single query against the database; conditional updates and counter
//! increments are atomic in the store, not in this process.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::child::Child;
use crate::domain::models::club::{
    Club, ClubImage, ClubSearchFilter, ClubSuggestion, RatingCounters, Review,
};
use crate::domain::models::enrollment::{
    ClubEnrollmentStats, Enrollment, EnrollmentListEntry, EnrollmentStatus,
};
use crate::domain::models::user::User;

/// User directory
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Store a new user. Fails if the email is already registered.
    async fn store_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Append a child id to the user's child list
    async fn push_child(&self, user_id: &str, child_id: &str) -> Result<()>;

    /// Remove every occurrence of a child id from the user's child list
    async fn pull_child(&self, user_id: &str, child_id: &str) -> Result<()>;
}

/// Child registry
#[async_trait]
pub trait ChildStorage: Send + Sync {
    async fn store_child(&self, child: &Child) -> Result<()>;

    async fn get_child(&self, child_id: &str) -> Result<Option<Child>>;

    /// Get a child only if it belongs to `parent_id`
    async fn get_child_for_parent(&self, child_id: &str, parent_id: &str) -> Result<Option<Child>>;

    async fn list_children_for_parent(&self, parent_id: &str) -> Result<Vec<Child>>;

    /// Returns false when no child with that id exists
    async fn update_child(&self, child: &Child) -> Result<bool>;

    /// Delete a child owned by `parent_id`, returning the deleted record
    async fn delete_child_for_parent(&self, child_id: &str, parent_id: &str) -> Result<Option<Child>>;
}

/// Club catalog
#[async_trait]
pub trait ClubStorage: Send + Sync {
    async fn store_club(&self, club: &Club) -> Result<()>;

    async fn get_club(&self, club_id: &str) -> Result<Option<Club>>;

    /// Newest first
    async fn list_clubs(&self, offset: u32, limit: u32) -> Result<Vec<Club>>;

    async fn count_clubs(&self) -> Result<i64>;

    /// Overwrite the editable fields of a club. Returns false when it does not exist.
    async fn update_club(&self, club: &Club) -> Result<bool>;

    async fn delete_club(&self, club_id: &str) -> Result<bool>;

    async fn replace_images(&self, club_id: &str, images: &[ClubImage]) -> Result<bool>;

    /// Append a review and increment the rating counters in one atomic
    /// statement. Returns the counters after the increment, or `None` when
    /// the club does not exist.
    async fn append_review(&self, club_id: &str, review: &Review) -> Result<Option<RatingCounters>>;

    async fn set_rating(&self, club_id: &str, rating: f64) -> Result<()>;

    /// Clubs sharing at least one interest with `interests` whose age range
    /// contains `age`, in catalog order
    async fn find_by_interests_and_age(&self, interests: &[String], age: u8, limit: u32) -> Result<Vec<Club>>;

    /// Clubs whose age range contains `age`, highest rating first
    async fn find_top_rated_for_age(&self, age: u8, limit: u32) -> Result<Vec<Club>>;
}

/// Enrollment ledger
#[async_trait]
pub trait EnrollmentStorage: Send + Sync {
    async fn store_enrollment(&self, enrollment: &Enrollment) -> Result<()>;

    async fn get_enrollment_for_parent(&self, enrollment_id: &str, parent_id: &str) -> Result<Option<Enrollment>>;

    /// Enrollments of a parent joined with child and club projections
    async fn list_enrollments_for_parent(&self, parent_id: &str) -> Result<Vec<EnrollmentListEntry>>;

    /// Move an enrollment to `to` if it is currently in one of `from` (and
    /// owned by `parent_id`, when given). The check and the write are a
    /// single conditional update. Returns the updated record, or `None` when
    /// nothing matched.
    async fn transition_status(
        &self,
        enrollment_id: &str,
        parent_id: Option<&str>,
        from: &[EnrollmentStatus],
        to: EnrollmentStatus,
    ) -> Result<Option<Enrollment>>;

    /// Any confirmed enrollment in `club_id` for one of `child_ids`
    async fn find_confirmed_for_children(&self, club_id: &str, child_ids: &[String]) -> Result<Option<Enrollment>>;

    /// Number of pending or confirmed enrollments of a club
    async fn count_active_for_club(&self, club_id: &str) -> Result<i64>;

    async fn delete_for_club(&self, club_id: &str) -> Result<u64>;

    async fn club_stats(&self, club_id: &str) -> Result<ClubEnrollmentStats>;
}

/// Geospatial and text search over the club catalog.
///
/// Implementations translate the filter into the storage engine's own query
/// language; no matching happens in this process.
#[async_trait]
pub trait ClubSearchIndex: Send + Sync {
    async fn search(&self, filter: &ClubSearchFilter) -> Result<Vec<Club>>;

    /// Case-insensitive substring match on the club name
    async fn autocomplete(&self, text: &str, limit: u32) -> Result<Vec<ClubSuggestion>>;
}
