//! # Storage Module
//!
//! Handles all data persistence for the club marketplace.
//!
//! Repositories implement the traits in [`traits`] on top of a shared SQLite
//! pool. Indexing, geospatial and text matching, atomic counters and
//! conditional status updates are all expressed as SQL and executed by the
//! database; nothing here caches or locks.
//!
//! ## Layout
//!
//! - **connection**: pool construction and schema setup
//! - **repositories**: one repository per aggregate plus the search index
//! - **image_store**: uploaded image files on disk

pub mod connection;
pub mod image_store;
pub mod repositories;
pub mod traits;

// Re-export the main types that other modules need
pub use connection::DbConnection;
pub use image_store::{ImageStore, StoredImage};
pub use repositories::{
    ChildRepository, ClubRepository, EnrollmentRepository, SqliteClubSearchIndex, UserRepository,
};
pub use traits::{ChildStorage, ClubSearchIndex, ClubStorage, EnrollmentStorage, UserStorage};
