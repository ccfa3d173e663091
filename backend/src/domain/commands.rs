// backend/src/domain/commands.rs

//! Domain-level command types.
//! These structs are consumed by the services in the domain layer and are
//! **not** exposed over the public API. The REST layer maps the DTOs of the
//! `shared` crate onto them after validation.

pub mod auth {
    #[derive(Debug, Clone)]
    pub struct RegisterCommand {
        pub name: String,
        pub email: String,
        pub password: String,
        pub phone: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct LoginCommand {
        pub email: String,
        pub password: String,
    }
}

pub mod child {
    #[derive(Debug, Clone)]
    pub struct CreateChildCommand {
        pub name: String,
        pub age: u8,
        pub interests: Vec<String>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct UpdateChildCommand {
        pub name: Option<String>,
        pub age: Option<u8>,
        pub interests: Option<Vec<String>>,
    }
}

pub mod club {
    use crate::domain::models::club::{AgeRange, Club, Contact, GeoPoint, ScheduleSlot};

    #[derive(Debug, Clone)]
    pub struct CreateClubCommand {
        pub name: String,
        pub description: String,
        pub category: String,
        pub location: GeoPoint,
        pub address: String,
        pub schedule: Vec<ScheduleSlot>,
        pub age_range: AgeRange,
        pub price: f64,
        pub contact: Contact,
        pub interests: Vec<String>,
    }

    /// Partial update; `None` leaves the field untouched.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateClubCommand {
        pub name: Option<String>,
        pub description: Option<String>,
        pub category: Option<String>,
        pub location: Option<GeoPoint>,
        pub address: Option<String>,
        pub schedule: Option<Vec<ScheduleSlot>>,
        pub age_range: Option<AgeRange>,
        pub price: Option<f64>,
        pub contact: Option<Contact>,
        pub interests: Option<Vec<String>>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct ListClubsQuery {
        pub page: u32,
        pub limit: u32,
    }

    impl Default for ListClubsQuery {
        fn default() -> Self {
            Self { page: 1, limit: 10 }
        }
    }

    #[derive(Debug, Clone)]
    pub struct ClubPage {
        pub clubs: Vec<Club>,
        pub total_pages: i64,
        pub current_page: i64,
        pub total_clubs: i64,
    }

    #[derive(Debug, Clone)]
    pub struct ClubDetail {
        pub club: Club,
        pub enrolled_count: i64,
    }

    /// An uploaded file as received from the client.
    #[derive(Debug, Clone)]
    pub struct ImageUpload {
        pub original_name: String,
        pub content_type: Option<String>,
        pub bytes: Vec<u8>,
    }
}

pub mod enrollment {
    use crate::domain::models::enrollment::EnrollmentSlot;

    #[derive(Debug, Clone)]
    pub struct CreateEnrollmentCommand {
        pub child_id: String,
        pub club_id: String,
        pub slot: EnrollmentSlot,
    }
}

pub mod review {
    #[derive(Debug, Clone)]
    pub struct AddReviewCommand {
        pub club_id: String,
        pub rating: u8,
        pub comment: Option<String>,
    }
}
