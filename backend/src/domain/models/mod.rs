pub mod child;
pub mod club;
pub mod enrollment;
pub mod user;
