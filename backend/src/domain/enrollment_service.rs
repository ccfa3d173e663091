//! Enrollment ledger.
//!
//! Every status change is one conditional update in the store; this service
//! never reads a status and then writes it. Notifications are dispatched only
//! after the change is stored.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::commands::enrollment::CreateEnrollmentCommand;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::enrollment::{Enrollment, EnrollmentDetails, EnrollmentListEntry, EnrollmentStatus};
use crate::domain::models::user::User;
use crate::domain::notification_service::NotificationService;
use crate::storage::traits::{ChildStorage, ClubStorage, EnrollmentStorage};

#[derive(Clone)]
pub struct EnrollmentService {
    enrollments: Arc<dyn EnrollmentStorage>,
    children: Arc<dyn ChildStorage>,
    clubs: Arc<dyn ClubStorage>,
    notifications: NotificationService,
}

impl EnrollmentService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentStorage>,
        children: Arc<dyn ChildStorage>,
        clubs: Arc<dyn ClubStorage>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            enrollments,
            children,
            clubs,
            notifications,
        }
    }

    /// Enroll one of the parent's children into a club as `pending`
    pub async fn create_enrollment(&self, parent: &User, command: CreateEnrollmentCommand) -> DomainResult<Enrollment> {
        info!(
            "Enrolling child {} into club {} (parent {})",
            command.child_id, command.club_id, parent.id
        );

        let child = self
            .children
            .get_child_for_parent(&command.child_id, &parent.id)
            .await?
            .ok_or_else(|| {
                warn!("Child {} not found for parent {}", command.child_id, parent.id);
                DomainError::not_found("Child not found or does not belong to you")
            })?;

        let club = self
            .clubs
            .get_club(&command.club_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Club not found"))?;

        let enrollment = Enrollment::new_pending(&child.id, &club.id, &parent.id, command.slot);
        self.enrollments.store_enrollment(&enrollment).await?;
        info!("Created enrollment {} ({})", enrollment.id, enrollment.status.as_str());

        self.notifications
            .enrollment_created(&parent.email, &child.name, &club.name);

        Ok(enrollment)
    }

    pub async fn list_enrollments(&self, parent_id: &str) -> DomainResult<Vec<EnrollmentListEntry>> {
        let entries = self.enrollments.list_enrollments_for_parent(parent_id).await?;
        info!("Found {} enrollments for parent {}", entries.len(), parent_id);
        Ok(entries)
    }

    /// One enrollment of the parent with its full child and club
    pub async fn get_enrollment(&self, parent_id: &str, enrollment_id: &str) -> DomainResult<EnrollmentDetails> {
        let enrollment = self
            .enrollments
            .get_enrollment_for_parent(enrollment_id, parent_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Enrollment not found"))?;

        let child = self.children.get_child(&enrollment.child_id).await?;
        let club = self.clubs.get_club(&enrollment.club_id).await?;

        Ok(EnrollmentDetails { enrollment, child, club })
    }

    /// `pending -> confirmed`. Any caller may confirm any enrollment.
    pub async fn confirm_enrollment(&self, enrollment_id: &str) -> DomainResult<Enrollment> {
        info!("Confirming enrollment {}", enrollment_id);
        let target = EnrollmentStatus::Confirmed;

        self.enrollments
            .transition_status(enrollment_id, None, EnrollmentStatus::sources_of(target), target)
            .await?
            .ok_or_else(|| {
                warn!("Enrollment {} is missing or not pending", enrollment_id);
                DomainError::Conflict("Enrollment not found or already confirmed".to_string())
            })
    }

    /// Cancel one of the parent's enrollments that is not already cancelled
    pub async fn cancel_enrollment(&self, parent: &User, enrollment_id: &str) -> DomainResult<Enrollment> {
        info!("Cancelling enrollment {} (parent {})", enrollment_id, parent.id);
        let target = EnrollmentStatus::Cancelled;

        let enrollment = self
            .enrollments
            .transition_status(
                enrollment_id,
                Some(&parent.id),
                EnrollmentStatus::sources_of(target),
                target,
            )
            .await?
            .ok_or_else(|| DomainError::not_found("Enrollment not found or already cancelled"))?;

        let child = self.children.get_child(&enrollment.child_id).await?;
        let club = self.clubs.get_club(&enrollment.club_id).await?;
        match (child, club) {
            (Some(child), Some(club)) => {
                self.notifications
                    .enrollment_cancelled(&parent.email, &child.name, &club.name)
                    .await?
            }
            _ => warn!(
                "Skipping cancellation email for {}: child or club no longer exists",
                enrollment.id
            ),
        }

        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::child::Child;
    use crate::domain::models::club::Club;
    use crate::domain::notification_service::{CancellationDelivery, Notifier};
    use crate::storage::{ChildRepository, ClubRepository, DbConnection, EnrollmentRepository};
    use crate::test_utils::{sample_child, sample_club, sample_user, slot, FailingNotifier, RecordingNotifier, SentMessage};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        service: EnrollmentService,
        enrollments: Arc<EnrollmentRepository>,
        children: Arc<ChildRepository>,
        parent: User,
        child: Child,
        club: Club,
    }

    async fn setup_with(notifier: Arc<dyn Notifier>, delivery: CancellationDelivery) -> Fixture {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let enrollments = Arc::new(EnrollmentRepository::new(db.clone()));
        let children = Arc::new(ChildRepository::new(db.clone()));
        let clubs = Arc::new(ClubRepository::new(db));

        let parent = sample_user("parent@example.com");
        let child = sample_child(&parent.id, 9, &["chess"]);
        let club = sample_club("Chess Masters", &["chess"], 7, 12);
        children.store_child(&child).await.unwrap();
        clubs.store_club(&club).await.unwrap();

        let service = EnrollmentService::new(
            enrollments.clone(),
            children.clone(),
            clubs,
            NotificationService::new(notifier, delivery),
        );
        Fixture {
            service,
            enrollments,
            children,
            parent,
            child,
            club,
        }
    }

    async fn setup_test() -> (Fixture, UnboundedReceiver<SentMessage>) {
        let (notifier, sent) = RecordingNotifier::new();
        let fixture = setup_with(Arc::new(notifier), CancellationDelivery::Detached).await;
        (fixture, sent)
    }

    fn command(f: &Fixture) -> CreateEnrollmentCommand {
        CreateEnrollmentCommand {
            child_id: f.child.id.clone(),
            club_id: f.club.id.clone(),
            slot: slot("Mon", "16:00"),
        }
    }

    #[tokio::test]
    async fn test_create_is_pending_and_readable_by_parent() {
        let (f, mut sent) = setup_test().await;

        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Pending);
        assert_eq!(enrollment.parent_id, f.parent.id);

        let details = f.service.get_enrollment(&f.parent.id, &enrollment.id).await.unwrap();
        assert_eq!(details.enrollment, enrollment);
        assert_eq!(details.child.map(|c| c.name), Some(f.child.name.clone()));
        assert_eq!(details.club.map(|c| c.name), Some("Chess Masters".to_string()));

        let message = RecordingNotifier::next(&mut sent).await.expect("created email not sent");
        assert_eq!(message.to, f.parent.email);
        assert!(message.body.contains("Chess Masters"));
    }

    #[tokio::test]
    async fn test_create_with_foreign_child_persists_nothing() {
        let (f, _sent) = setup_test().await;
        let stranger = sample_user("stranger@example.com");

        let result = f.service.create_enrollment(&stranger, command(&f)).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        assert!(f.service.list_enrollments(&stranger.id).await.unwrap().is_empty());
        assert!(f.service.list_enrollments(&f.parent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_missing_club() {
        let (f, _sent) = setup_test().await;
        let mut cmd = command(&f);
        cmd.club_id = "missing".to_string();

        let result = f.service.create_enrollment(&f.parent, cmd).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_enrollment() {
        let f = setup_with(Arc::new(FailingNotifier), CancellationDelivery::Detached).await;

        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();

        assert!(f.service.get_enrollment(&f.parent.id, &enrollment.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_by_other_parent_is_not_found() {
        let (f, _sent) = setup_test().await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();

        let result = f.service.get_enrollment("someone-else", &enrollment.id).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_second_confirm_conflicts() {
        let (f, _sent) = setup_test().await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();

        let confirmed = f.service.confirm_enrollment(&enrollment.id).await.unwrap();
        assert_eq!(confirmed.status, EnrollmentStatus::Confirmed);

        let again = f.service.confirm_enrollment(&enrollment.id).await;
        assert!(matches!(again, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_concurrent_confirms_have_one_winner() {
        let (f, _sent) = setup_test().await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();

        let (a, b) = tokio::join!(
            f.service.confirm_enrollment(&enrollment.id),
            f.service.confirm_enrollment(&enrollment.id)
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_from_confirmed_then_again() {
        let (f, mut sent) = setup_test().await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();
        RecordingNotifier::next(&mut sent).await.expect("created email not sent");
        f.service.confirm_enrollment(&enrollment.id).await.unwrap();

        let cancelled = f.service.cancel_enrollment(&f.parent, &enrollment.id).await.unwrap();
        assert_eq!(cancelled.status, EnrollmentStatus::Cancelled);

        let message = RecordingNotifier::next(&mut sent).await.expect("cancel email not sent");
        assert!(message.subject.contains("cancelled"));
        assert!(message.body.contains(&f.child.name));

        let again = f.service.cancel_enrollment(&f.parent, &enrollment.id).await;
        assert!(matches!(again, Err(DomainError::NotFound(_))));

        let confirm_cancelled = f.service.confirm_enrollment(&enrollment.id).await;
        assert!(matches!(confirm_cancelled, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_cancel_by_other_parent_is_not_found() {
        let (f, _sent) = setup_test().await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();
        let stranger = sample_user("stranger@example.com");

        let result = f.service.cancel_enrollment(&stranger, &enrollment.id).await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
        let stored = f.enrollments.get_enrollment_for_parent(&enrollment.id, &f.parent.id).await.unwrap();
        assert_eq!(stored.map(|e| e.status), Some(EnrollmentStatus::Pending));
    }

    #[tokio::test]
    async fn test_awaited_cancellation_email_failure_is_internal_but_committed() {
        let f = setup_with(Arc::new(FailingNotifier), CancellationDelivery::Awaited).await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();

        let result = f.service.cancel_enrollment(&f.parent, &enrollment.id).await;

        assert!(matches!(result, Err(DomainError::Internal(_))));
        let stored = f.enrollments.get_enrollment_for_parent(&enrollment.id, &f.parent.id).await.unwrap();
        assert_eq!(stored.map(|e| e.status), Some(EnrollmentStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_with_deleted_child_skips_email() {
        let f = setup_with(Arc::new(FailingNotifier), CancellationDelivery::Awaited).await;
        let enrollment = f.service.create_enrollment(&f.parent, command(&f)).await.unwrap();
        f.children.delete_child_for_parent(&f.child.id, &f.parent.id).await.unwrap();

        let cancelled = f.service.cancel_enrollment(&f.parent, &enrollment.id).await.unwrap();

        assert_eq!(cancelled.status, EnrollmentStatus::Cancelled);
    }
}
