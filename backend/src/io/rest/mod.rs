//! # REST API Interface Layer
//!
//! HTTP endpoints of the club marketplace, nested under `/api`.
//!
//! ## Key Responsibilities
//!
//! - **API Endpoints**: one module per resource, each exporting a `router()`
//! - **Input Validation**: request bodies are checked by [`validation`]
//!   before any service call
//! - **Authentication**: the [`extractors::AuthUser`] extractor resolves the
//!   bearer token to a user
//! - **Error Handling**: domain errors become JSON error bodies via
//!   [`error::ApiError`]
//! - **Mapping**: [`mappers`] translate between wire DTOs and domain models
//!
//! Handlers hold no business logic.

pub mod auth_apis;
pub mod child_apis;
pub mod club_apis;
pub mod enrollment_apis;
pub mod error;
pub mod extractors;
pub mod mappers;
pub mod validation;

pub use error::{ApiError, DomainResultExt};
pub use extractors::{AppQuery, AuthUser, ValidJson};
