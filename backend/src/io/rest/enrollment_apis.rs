//! # REST API for Enrollments
//!
//! Parents enroll their children into clubs, follow their enrollments and
//! cancel them. Confirmation is open to any signed-in user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use shared::{CancelEnrollmentResponse, CreateEnrollmentRequest, Enrollment, EnrollmentDetail, EnrollmentListItem};
use tracing::info;

use super::error::{ApiError, DomainResultExt};
use super::extractors::{AuthUser, ValidJson};
use super::mappers::EnrollmentMapper;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route("/:id", get(get_enrollment))
        .route("/:id/confirm", put(confirm_enrollment))
        .route("/:id/cancel", put(cancel_enrollment))
}

pub async fn create_enrollment(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    ValidJson(request): ValidJson<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    info!("POST /api/enrollments - child {} club {}", request.child_id, request.club_id);

    let enrollment = state
        .enrollment_service
        .create_enrollment(&parent, EnrollmentMapper::to_create_command(request))
        .await
        .or_api("Failed to create enrollment")?;
    Ok((StatusCode::CREATED, Json(EnrollmentMapper::to_dto(enrollment))))
}

/// The signed-in parent's enrollments with child and club summaries
pub async fn list_enrollments(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
) -> Result<Json<Vec<EnrollmentListItem>>, ApiError> {
    info!("GET /api/enrollments");

    let entries = state
        .enrollment_service
        .list_enrollments(&parent.id)
        .await
        .or_api("Failed to list enrollments")?;
    Ok(Json(entries.into_iter().map(EnrollmentMapper::to_list_item_dto).collect()))
}

pub async fn get_enrollment(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    Path(enrollment_id): Path<String>,
) -> Result<Json<EnrollmentDetail>, ApiError> {
    info!("GET /api/enrollments/{}", enrollment_id);

    let details = state
        .enrollment_service
        .get_enrollment(&parent.id, &enrollment_id)
        .await
        .or_api("Failed to get enrollment")?;
    Ok(Json(EnrollmentMapper::to_detail_dto(details)))
}

pub async fn confirm_enrollment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(enrollment_id): Path<String>,
) -> Result<Json<Enrollment>, ApiError> {
    info!("PUT /api/enrollments/{}/confirm - by {}", enrollment_id, user.id);

    let enrollment = state
        .enrollment_service
        .confirm_enrollment(&enrollment_id)
        .await
        .or_api("Failed to confirm enrollment")?;
    Ok(Json(EnrollmentMapper::to_dto(enrollment)))
}

pub async fn cancel_enrollment(
    State(state): State<AppState>,
    AuthUser(parent): AuthUser,
    Path(enrollment_id): Path<String>,
) -> Result<Json<CancelEnrollmentResponse>, ApiError> {
    info!("PUT /api/enrollments/{}/cancel", enrollment_id);

    let enrollment = state
        .enrollment_service
        .cancel_enrollment(&parent, &enrollment_id)
        .await
        .or_api("Failed to cancel enrollment")?;
    Ok(Json(CancelEnrollmentResponse {
        message: "Enrollment cancelled".to_string(),
        enrollment: EnrollmentMapper::to_dto(enrollment),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EnrollmentRepository, EnrollmentStorage};
    use crate::test_utils::{empty_request, json_request, sample_club, send, RecordingNotifier, TestApp};
    use axum::http::Method;
    use shared::EnrollmentSlot;

    fn create_body(child_id: &str, club_id: &str) -> CreateEnrollmentRequest {
        CreateEnrollmentRequest {
            child_id: child_id.to_string(),
            club_id: club_id.to_string(),
            schedule: EnrollmentSlot {
                day: "Mon".to_string(),
                time: "16:00".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_enrollment_lifecycle() {
        let mut app = TestApp::new().await;
        let (parent, token) = app.parent("parent@example.com").await;
        let child = app.child_of(&parent, 9, &["chess"]).await;
        let club = app.club(sample_club("Chess Masters", &["chess"], 7, 12)).await;
        let routes = router().with_state(app.state.clone());

        let (status, created) =
            send(routes.clone(), json_request(Method::POST, "/", Some(&token), &create_body(&child.id, &club.id))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["parent"], parent.id);
        let id = created["id"].as_str().unwrap().to_string();

        let email = RecordingNotifier::next(&mut app.sent).await.expect("created email not sent");
        assert_eq!(email.to, "parent@example.com");

        let (status, list) = send(routes.clone(), empty_request(Method::GET, "/", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["child"]["name"], "Mia");
        assert_eq!(list[0]["club"]["name"], "Chess Masters");

        let (status, detail) = send(routes.clone(), empty_request(Method::GET, &format!("/{}", id), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["club"]["ageRange"]["min"], 7);
        assert_eq!(detail["child"]["interests"][0], "chess");

        let confirm_uri = format!("/{}/confirm", id);
        let (status, confirmed) = send(routes.clone(), empty_request(Method::PUT, &confirm_uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], "confirmed");

        let (status, _) = send(routes.clone(), empty_request(Method::PUT, &confirm_uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let cancel_uri = format!("/{}/cancel", id);
        let (status, cancelled) = send(routes.clone(), empty_request(Method::PUT, &cancel_uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["message"], "Enrollment cancelled");
        assert_eq!(cancelled["enrollment"]["status"], "cancelled");

        let email = RecordingNotifier::next(&mut app.sent).await.expect("cancel email not sent");
        assert!(email.body.contains("Mia"));

        let (status, _) = send(routes, empty_request(Method::PUT, &cancel_uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_foreign_child_is_not_found_and_not_stored() {
        let app = TestApp::new().await;
        let (owner, _) = app.parent("owner@example.com").await;
        let (stranger, stranger_token) = app.parent("stranger@example.com").await;
        let child = app.child_of(&owner, 9, &[]).await;
        let club = app.club(sample_club("Chess", &[], 7, 12)).await;
        let routes = router().with_state(app.state.clone());

        let (status, body) = send(
            routes,
            json_request(Method::POST, "/", Some(&stranger_token), &create_body(&child.id, &club.id)),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Child not found or does not belong to you");
        let stored = EnrollmentRepository::new(app.db.clone())
            .list_enrollments_for_parent(&stranger.id)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_missing_slot_is_bad_request() {
        let app = TestApp::new().await;
        let (_, token) = app.parent("parent@example.com").await;
        let routes = router().with_state(app.state.clone());

        let mut body = create_body("child-1", "club-1");
        body.schedule.time = " ".to_string();
        let (status, error) = send(routes, json_request(Method::POST, "/", Some(&token), &body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["message"], "Time is required");
    }

    #[tokio::test]
    async fn test_other_parents_cannot_read_or_cancel() {
        let app = TestApp::new().await;
        let (owner, owner_token) = app.parent("owner@example.com").await;
        let (_, stranger_token) = app.parent("stranger@example.com").await;
        let child = app.child_of(&owner, 9, &[]).await;
        let club = app.club(sample_club("Chess", &[], 7, 12)).await;
        let routes = router().with_state(app.state.clone());

        let (_, created) =
            send(routes.clone(), json_request(Method::POST, "/", Some(&owner_token), &create_body(&child.id, &club.id))).await;
        let id = created["id"].as_str().unwrap();

        let (status, _) = send(routes.clone(), empty_request(Method::GET, &format!("/{}", id), Some(&stranger_token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(routes.clone(), empty_request(Method::PUT, &format!("/{}/cancel", id), Some(&stranger_token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Confirmation carries no ownership check
        let (status, confirmed) =
            send(routes, empty_request(Method::PUT, &format!("/{}/confirm", id), Some(&stranger_token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], "confirmed");
    }

    #[tokio::test]
    async fn test_enrollments_require_authentication() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());

        let (status, _) = send(routes, empty_request(Method::GET, "/", None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
