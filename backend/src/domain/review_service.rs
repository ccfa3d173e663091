use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::commands::review::AddReviewCommand;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::club::Review;
use crate::domain::models::user::User;
use crate::storage::traits::{ClubStorage, EnrollmentStorage};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Accepts reviews from parents whose child attends the club and keeps the
/// club's average rating current.
#[derive(Clone)]
pub struct ReviewService {
    clubs: Arc<dyn ClubStorage>,
    enrollments: Arc<dyn EnrollmentStorage>,
}

impl ReviewService {
    pub fn new(clubs: Arc<dyn ClubStorage>, enrollments: Arc<dyn EnrollmentStorage>) -> Self {
        Self { clubs, enrollments }
    }

    /// Append a review and recompute the club rating.
    ///
    /// The append and the counter increment are one atomic write; the rating
    /// itself is a second write, so concurrent reviews can briefly leave a
    /// stale average that the next review corrects.
    pub async fn add_review(&self, user: &User, command: AddReviewCommand) -> DomainResult<Review> {
        info!("Adding review to club {} by user {}", command.club_id, user.id);

        if !(MIN_RATING..=MAX_RATING).contains(&command.rating) {
            return Err(DomainError::validation("Rating must be between 1 and 5"));
        }

        let attended = self
            .enrollments
            .find_confirmed_for_children(&command.club_id, &user.children)
            .await?;
        if attended.is_none() {
            warn!("User {} has no confirmed enrollment in club {}", user.id, command.club_id);
            return Err(DomainError::Forbidden(
                "You can only review clubs your child attends".to_string(),
            ));
        }

        let review = Review::new(&user.id, command.rating, command.comment);
        let counters = self
            .clubs
            .append_review(&command.club_id, &review)
            .await?
            .ok_or_else(|| DomainError::not_found("Club not found"))?;

        let rating = counters.average();
        self.clubs.set_rating(&command.club_id, rating).await?;

        info!(
            "Club {} rated {:.2} over {} reviews",
            command.club_id, rating, counters.review_count
        );
        Ok(review)
    }
}
