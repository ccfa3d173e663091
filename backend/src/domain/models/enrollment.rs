//! backend/src/domain/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::child::Child;
use super::club::{Club, ScheduleSlot};

/// Lifecycle state of an enrollment.
///
/// `Pending` is the initial state. `Pending` may move to `Confirmed` or
/// `Cancelled`, `Confirmed` may move to `Cancelled`, and `Cancelled` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Confirmed => "confirmed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from the stored representation
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(EnrollmentStatus::Pending),
            "confirmed" => Ok(EnrollmentStatus::Confirmed),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            _ => Err(format!("Invalid enrollment status: {}", s)),
        }
    }

    /// States from which `target` can be entered.
    pub fn sources_of(target: EnrollmentStatus) -> &'static [EnrollmentStatus] {
        match target {
            EnrollmentStatus::Pending => &[],
            EnrollmentStatus::Confirmed => &[EnrollmentStatus::Pending],
            EnrollmentStatus::Cancelled => &[EnrollmentStatus::Pending, EnrollmentStatus::Confirmed],
        }
    }

    pub fn can_transition_to(&self, target: EnrollmentStatus) -> bool {
        Self::sources_of(target).contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSlot {
    pub day: String,
    pub time: String,
}

/// A parent's request to place a child into a club slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub child_id: String,
    pub club_id: String,
    /// Owner of the child at creation time
    pub parent_id: String,
    pub slot: EnrollmentSlot,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new_pending(child_id: &str, club_id: &str, parent_id: &str, slot: EnrollmentSlot) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            child_id: child_id.to_string(),
            club_id: club_id.to_string(),
            parent_id: parent_id.to_string(),
            slot,
            status: EnrollmentStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChildProjection {
    pub id: String,
    pub name: String,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClubProjection {
    pub id: String,
    pub name: String,
    pub category: String,
    pub schedule: Vec<ScheduleSlot>,
    pub price: f64,
}

/// Row of a parent's enrollment list.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentListEntry {
    pub enrollment: Enrollment,
    pub child: Option<ChildProjection>,
    pub club: Option<ClubProjection>,
}

/// One enrollment with its full child and club.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentDetails {
    pub enrollment: Enrollment,
    pub child: Option<Child>,
    pub club: Option<Club>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: EnrollmentStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeCount {
    pub age: i64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotCount {
    pub day: String,
    pub time: String,
    pub count: i64,
}

/// Aggregated enrollment statistics of one club.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClubEnrollmentStats {
    pub statuses: Vec<StatusCount>,
    pub total: i64,
    pub age_distribution: Vec<AgeCount>,
    pub popular_slots: Vec<SlotCount>,
}
