//! Request body validation.
//!
//! Every request DTO that reaches a handler is validated here before it is
//! mapped to a domain command, so services only ever see well-formed input.

use shared::{
    AddReviewRequest, CreateChildRequest, CreateClubRequest, CreateEnrollmentRequest, LoginRequest,
    RegisterRequest, UpdateChildRequest, UpdateClubRequest,
};
use thiserror::Error;

use super::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_COMMENT_LEN: usize = 10;
pub const MAX_CHILD_AGE: i64 = 18;

/// All rule violations of one request, in field order.
#[derive(Debug, Default, Error, PartialEq)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::BadRequest(errors.to_string())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

fn optional_non_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, non_blank)
}

/// `local@domain.tld` without whitespace
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && tld.len() >= 2)
        }
        None => false,
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(non_blank(&self.name), "Name is required");
        errors.check(is_valid_email(&self.email), "Please include a valid email");
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "Password must be at least 6 characters",
        );
        errors.into_result()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(is_valid_email(&self.email), "Please include a valid email");
        errors.check(!self.password.is_empty(), "Password is required");
        errors.into_result()
    }
}

fn valid_child_age(age: i64) -> bool {
    (1..=MAX_CHILD_AGE).contains(&age)
}

impl Validate for CreateChildRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(non_blank(&self.name), "Child name is required");
        errors.check(valid_child_age(self.age), "Age must be between 1 and 18");
        errors.into_result()
    }
}

impl Validate for UpdateChildRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(optional_non_blank(&self.name), "Child name is required");
        errors.check(self.age.map_or(true, valid_child_age), "Age must be between 1 and 18");
        errors.into_result()
    }
}

fn valid_coordinates(coordinates: &Option<[f64; 2]>) -> bool {
    coordinates.map_or(true, |[longitude, latitude]| {
        (-180.0..=180.0).contains(&longitude) && (-90.0..=90.0).contains(&latitude)
    })
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

impl Validate for CreateClubRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(non_blank(&self.name), "Club name is required");
        errors.check(
            self.description.chars().count() >= MIN_DESCRIPTION_LEN,
            "Description must be at least 10 characters",
        );
        errors.check(non_blank(&self.category), "Category is required");
        errors.check(non_blank(&self.address), "Address is required");
        errors.check(self.age_range.min >= 0, "Minimum age must be a non-negative integer");
        errors.check(self.age_range.max >= 0, "Maximum age must be a non-negative integer");
        errors.check(
            self.age_range.min <= self.age_range.max,
            "Minimum age cannot exceed maximum age",
        );
        errors.check(valid_price(self.price), "Price must be a non-negative number");
        errors.check(valid_coordinates(&self.coordinates), "Coordinates are out of range");
        errors.into_result()
    }
}

impl Validate for UpdateClubRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(optional_non_blank(&self.name), "Club name is required");
        errors.check(
            self.description
                .as_ref()
                .map_or(true, |d| d.chars().count() >= MIN_DESCRIPTION_LEN),
            "Description must be at least 10 characters",
        );
        errors.check(optional_non_blank(&self.category), "Category is required");
        errors.check(optional_non_blank(&self.address), "Address is required");
        if let Some(range) = &self.age_range {
            errors.check(range.min >= 0, "Minimum age must be a non-negative integer");
            errors.check(range.max >= 0, "Maximum age must be a non-negative integer");
            errors.check(range.min <= range.max, "Minimum age cannot exceed maximum age");
        }
        errors.check(self.price.map_or(true, valid_price), "Price must be a non-negative number");
        errors.check(valid_coordinates(&self.coordinates), "Coordinates are out of range");
        errors.into_result()
    }
}

impl Validate for AddReviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check((1..=5).contains(&self.rating), "Rating must be between 1 and 5");
        errors.check(
            self.comment
                .as_ref()
                .map_or(true, |c| c.chars().count() >= MIN_COMMENT_LEN),
            "Comment must be at least 10 characters",
        );
        errors.into_result()
    }
}

impl Validate for CreateEnrollmentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.check(non_blank(&self.child_id), "Child ID is required");
        errors.check(non_blank(&self.club_id), "Club ID is required");
        errors.check(non_blank(&self.schedule.day), "Day is required");
        errors.check(non_blank(&self.schedule.time), "Time is required");
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AgeRange, EnrollmentSlot};

    fn club_request() -> CreateClubRequest {
        CreateClubRequest {
            name: "Chess Masters".to_string(),
            description: "Chess lessons for beginners".to_string(),
            category: "games".to_string(),
            address: "1 Main St".to_string(),
            coordinates: None,
            schedule: None,
            age_range: AgeRange { min: 7, max: 12 },
            price: 25.0,
            contact: None,
            interests: None,
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("parent@example.com"));
        assert!(is_valid_email("  parent@example.co.uk "));
        assert!(!is_valid_email("parent@example"));
        assert!(!is_valid_email("parent.example.com"));
        assert!(!is_valid_email("par ent@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn test_register_collects_every_violation() {
        let request = RegisterRequest {
            name: " ".to_string(),
            email: "nope".to_string(),
            password: "123".to_string(),
            phone: None,
        };

        let errors = request.validate().unwrap_err();

        assert_eq!(errors.0.len(), 3);
        assert_eq!(
            errors.to_string(),
            "Name is required; Please include a valid email; Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_child_age_bounds() {
        let mut request = CreateChildRequest {
            name: "Anna".to_string(),
            age: 18,
            interests: None,
        };
        assert!(request.validate().is_ok());

        request.age = 0;
        assert!(request.validate().is_err());
        request.age = 19;
        assert!(request.validate().is_err());

        let update = UpdateChildRequest {
            age: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(UpdateChildRequest::default().validate().is_ok());
    }

    #[test]
    fn test_club_request_rules() {
        assert!(club_request().validate().is_ok());

        let mut short = club_request();
        short.description = "Too short".to_string();
        assert!(short.validate().is_err());

        let mut inverted = club_request();
        inverted.age_range = AgeRange { min: 12, max: 7 };
        assert!(inverted.validate().is_err());

        let mut negative = club_request();
        negative.price = -1.0;
        assert!(negative.validate().is_err());

        let mut off_map = club_request();
        off_map.coordinates = Some([200.0, 10.0]);
        assert!(off_map.validate().is_err());
    }

    #[test]
    fn test_partial_club_update_only_checks_present_fields() {
        assert!(UpdateClubRequest::default().validate().is_ok());

        let blank_name = UpdateClubRequest {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[test]
    fn test_review_rules() {
        let ok = AddReviewRequest {
            rating: 5,
            comment: Some("Wonderful coaches".to_string()),
        };
        assert!(ok.validate().is_ok());

        let no_comment = AddReviewRequest { rating: 1, comment: None };
        assert!(no_comment.validate().is_ok());

        let out_of_range = AddReviewRequest { rating: 6, comment: None };
        assert!(out_of_range.validate().is_err());

        let terse = AddReviewRequest {
            rating: 3,
            comment: Some("ok".to_string()),
        };
        assert!(terse.validate().is_err());
    }

    #[test]
    fn test_enrollment_requires_slot() {
        let request = CreateEnrollmentRequest {
            child_id: "child-1".to_string(),
            club_id: "club-1".to_string(),
            schedule: EnrollmentSlot {
                day: "".to_string(),
                time: "16:00".to_string(),
            },
        };

        let errors = request.validate().unwrap_err();
        assert_eq!(errors.0, vec!["Day is required".to_string()]);
    }
}
