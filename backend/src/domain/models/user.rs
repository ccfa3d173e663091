//! backend/src/domain/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to every account created through registration.
pub const DEFAULT_ROLE: &str = "parent";

/// Domain model of a registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    /// Ids of owned children, in insertion order
    pub children: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn owns_child(&self, child_id: &str) -> bool {
        self.children.iter().any(|id| id == child_id)
    }
}
