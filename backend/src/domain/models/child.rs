//! backend/src/domain/models/child.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Oldest age a child profile may carry.
pub const MAX_CHILD_AGE: u8 = 18;

/// Domain model representing a child profile owned by a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Child {
    pub id: String,
    /// Owning parent; never changes after creation
    pub parent_id: String,
    pub name: String,
    pub age: u8,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Child {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_valid_age(age: i64) -> bool {
        age > 0 && age <= MAX_CHILD_AGE as i64
    }
}
