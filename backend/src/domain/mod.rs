//! # Domain Module
//!
//! Business logic of the club marketplace.
//!
//! ## Module Organization
//!
//! - **auth_service**: registration, login and token verification
//! - **child_service**: child profiles scoped to their parent
//! - **club_service**: the club catalog, search, statistics and images
//! - **enrollment_service**: the enrollment ledger and its lifecycle
//! - **review_service**: review gate and running rating
//! - **recommendation_service**: interest matching with a popularity fallback
//! - **notification_service**: enrollment emails
//!
//! ## Business Rules
//!
//! - An enrollment starts `pending`, may be confirmed once, and may be
//!   cancelled from `pending` or `confirmed`; `cancelled` is final
//! - Only parents with a confirmed enrollment in a club may review it
//! - A club's rating is the mean of all review ratings, 0 without reviews
//! - Recommendations never exceed ten clubs and never repeat one
//!
//! Services depend on the storage traits only and report failures as
//! [`errors::DomainError`].

pub mod auth_service;
pub mod child_service;
pub mod club_service;
pub mod commands;
pub mod enrollment_service;
pub mod errors;
pub mod models;
pub mod notification_service;
pub mod recommendation_service;
pub mod review_service;

pub use auth_service::AuthService;
pub use child_service::ChildService;
pub use club_service::ClubService;
pub use enrollment_service::EnrollmentService;
pub use errors::{DomainError, DomainResult};
pub use notification_service::{
    CancellationDelivery, EmailConfig, LogNotifier, NotificationService, Notifier, SmtpNotifier,
};
pub use recommendation_service::RecommendationService;
pub use review_service::ReviewService;
