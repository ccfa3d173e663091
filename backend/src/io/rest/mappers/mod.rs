//! Conversions between the wire DTOs of the `shared` crate and the domain
//! models and commands.

pub mod child_mapper;
pub mod club_mapper;
pub mod enrollment_mapper;
pub mod user_mapper;

pub use child_mapper::ChildMapper;
pub use club_mapper::ClubMapper;
pub use enrollment_mapper::EnrollmentMapper;
pub use user_mapper::UserMapper;
