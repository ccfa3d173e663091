use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::commands::child::{CreateChildCommand, UpdateChildCommand};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::child::Child;
use crate::storage::traits::{ChildStorage, UserStorage};

const CHILD_NOT_FOUND: &str = "Child not found";
const INVALID_AGE: &str = "Age must be a positive number no greater than 18";

/// Service for managing the child profiles of a parent
#[derive(Clone)]
pub struct ChildService {
    children: Arc<dyn ChildStorage>,
    users: Arc<dyn UserStorage>,
}

impl ChildService {
    pub fn new(children: Arc<dyn ChildStorage>, users: Arc<dyn UserStorage>) -> Self {
        Self { children, users }
    }

    /// Create a child and append it to the parent's child list
    pub async fn create_child(&self, parent_id: &str, command: CreateChildCommand) -> DomainResult<Child> {
        info!("Creating child: name={}, age={}, parent={}", command.name, command.age, parent_id);

        if !Child::is_valid_age(command.age as i64) {
            return Err(DomainError::validation(INVALID_AGE));
        }

        let now = Utc::now();
        let child = Child {
            id: Child::generate_id(),
            parent_id: parent_id.to_string(),
            name: command.name.trim().to_string(),
            age: command.age,
            interests: command.interests,
            created_at: now,
            updated_at: now,
        };

        self.children.store_child(&child).await?;
        self.users.push_child(parent_id, &child.id).await?;

        info!("Created child: {} with ID: {}", child.name, child.id);
        Ok(child)
    }

    pub async fn list_children(&self, parent_id: &str) -> DomainResult<Vec<Child>> {
        let children = self.children.list_children_for_parent(parent_id).await?;
        info!("Found {} children for parent {}", children.len(), parent_id);
        Ok(children)
    }

    pub async fn get_child(&self, parent_id: &str, child_id: &str) -> DomainResult<Child> {
        self.children
            .get_child_for_parent(child_id, parent_id)
            .await?
            .ok_or_else(|| {
                warn!("Child not found: {} (parent {})", child_id, parent_id);
                DomainError::not_found(CHILD_NOT_FOUND)
            })
    }

    pub async fn update_child(
        &self,
        parent_id: &str,
        child_id: &str,
        command: UpdateChildCommand,
    ) -> DomainResult<Child> {
        info!("Updating child: {}", child_id);

        if let Some(age) = command.age {
            if !Child::is_valid_age(age as i64) {
                return Err(DomainError::validation(INVALID_AGE));
            }
        }

        let mut child = self.get_child(parent_id, child_id).await?;

        if let Some(name) = command.name {
            child.name = name.trim().to_string();
        }
        if let Some(age) = command.age {
            child.age = age;
        }
        if let Some(interests) = command.interests {
            child.interests = interests;
        }
        child.updated_at = Utc::now();

        if !self.children.update_child(&child).await? {
            return Err(DomainError::not_found(CHILD_NOT_FOUND));
        }

        info!("Updated child: {} with ID: {}", child.name, child.id);
        Ok(child)
    }

    /// Delete a child and pull it from the parent's child list.
    ///
    /// Enrollments of the child are left in place.
    pub async fn delete_child(&self, parent_id: &str, child_id: &str) -> DomainResult<()> {
        info!("Deleting child: {}", child_id);

        let child = self
            .children
            .delete_child_for_parent(child_id, parent_id)
            .await?
            .ok_or_else(|| DomainError::not_found(CHILD_NOT_FOUND))?;
        self.users.pull_child(parent_id, &child.id).await?;

        info!("Deleted child: {} with ID: {}", child.name, child.id);
        Ok(())
    }
}
