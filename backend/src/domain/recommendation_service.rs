use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::club::Club;
use crate::storage::traits::{ChildStorage, ClubStorage};

/// Interest matches fetched before assembling
pub const PRIMARY_LIMIT: u32 = 20;
/// Below this many interest matches the popularity fallback kicks in
pub const FALLBACK_THRESHOLD: usize = 5;
pub const FALLBACK_LIMIT: u32 = 5;
/// Longest recommendation list returned
pub const MAX_RECOMMENDATIONS: usize = 10;

#[derive(Clone)]
pub struct RecommendationService {
    children: Arc<dyn ChildStorage>,
    clubs: Arc<dyn ClubStorage>,
}

impl RecommendationService {
    pub fn new(children: Arc<dyn ChildStorage>, clubs: Arc<dyn ClubStorage>) -> Self {
        Self { children, clubs }
    }

    /// Clubs for a child: interest and age matches first, topped up with the
    /// best rated age matches when there are few of them.
    ///
    /// Any authenticated caller may ask for any child.
    pub async fn recommend(&self, child_id: &str) -> DomainResult<Vec<Club>> {
        let child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Child not found"))?;

        let primary = if child.interests.is_empty() {
            Vec::new()
        } else {
            self.clubs
                .find_by_interests_and_age(&child.interests, child.age, PRIMARY_LIMIT)
                .await?
        };

        let fallback = if primary.len() < FALLBACK_THRESHOLD {
            self.clubs.find_top_rated_for_age(child.age, FALLBACK_LIMIT).await?
        } else {
            Vec::new()
        };

        info!(
            "Recommendations for child {}: {} interest matches, {} fallback",
            child_id,
            primary.len(),
            fallback.len()
        );
        Ok(assemble(primary, fallback))
    }
}

/// Concatenate, keep the first occurrence of each club and cap the length
fn assemble(primary: Vec<Club>, fallback: Vec<Club>) -> Vec<Club> {
    let mut seen = HashSet::new();
    primary
        .into_iter()
        .chain(fallback)
        .filter(|club| seen.insert(club.id.clone()))
        .take(MAX_RECOMMENDATIONS)
        .collect()
}
