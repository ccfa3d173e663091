// Repository modules
pub mod child_repository;
pub mod club_repository;
pub mod club_search_repository;
pub mod enrollment_repository;
pub mod user_repository;

// Re-export repository types
pub use child_repository::ChildRepository;
pub use club_repository::ClubRepository;
pub use club_search_repository::SqliteClubSearchIndex;
pub use enrollment_repository::EnrollmentRepository;
pub use user_repository::UserRepository;
