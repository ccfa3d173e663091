//! # REST API for the Club Catalog
//!
//! Browsing, search, autocomplete, recommendations, statistics, reviews and
//! image management of clubs. Reads are public; anything that writes or
//! exposes enrollment data requires a signed-in user.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use shared::{
    AddReviewRequest, AutocompleteParams, Club, ClubDetailResponse, ClubImage, ClubPageResponse, ClubSearchParams,
    ClubStatsResponse, ClubSuggestion, CreateClubRequest, DeleteImageResponse, MessageResponse, PageParams, Review,
    ScheduleSlot, UpdateClubRequest,
};
use tracing::{debug, info};

use super::error::{ApiError, DomainResultExt};
use super::extractors::{AppQuery, AuthUser, ValidJson};
use super::mappers::ClubMapper;
use crate::domain::club_service::{MAX_IMAGE_BYTES, MAX_UPLOAD_FILES};
use crate::domain::commands::club::ImageUpload;
use crate::domain::commands::review::AddReviewCommand;
use crate::AppState;

/// Multipart field carrying the image files
pub const UPLOAD_FIELD: &str = "images";
/// Room for the largest accepted upload plus multipart framing
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_FILES * MAX_IMAGE_BYTES + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clubs).post(create_club))
        .route("/search", get(search_clubs))
        .route("/autocomplete", get(autocomplete))
        .route("/recommendations/:child_id", get(recommend_clubs))
        .route("/:id", get(get_club).put(update_club).delete(delete_club))
        .route("/:id/schedule", get(get_schedule))
        .route("/:id/stats", get(get_stats))
        .route("/:id/reviews", post(add_review))
        .route(
            "/:id/upload",
            post(upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/:id/images/:image_id", delete(delete_image))
}

/// One page of clubs, newest first
pub async fn list_clubs(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<ClubPageResponse>, ApiError> {
    info!("GET /api/clubs - {:?}", params);

    let page = state
        .club_service
        .list_clubs(ClubMapper::to_list_query(params))
        .await
        .or_api("Failed to list clubs")?;
    Ok(Json(ClubMapper::to_page_dto(page)))
}

pub async fn search_clubs(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ClubSearchParams>,
) -> Result<Json<Vec<Club>>, ApiError> {
    info!("GET /api/clubs/search - {:?}", params);

    let filter = ClubMapper::to_search_filter(params)?;
    let clubs = state.club_service.search(&filter).await.or_api("Search failed")?;
    Ok(Json(ClubMapper::to_list_dto(clubs)))
}

pub async fn autocomplete(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AutocompleteParams>,
) -> Result<Json<Vec<ClubSuggestion>>, ApiError> {
    info!("GET /api/clubs/autocomplete - query: {:?}", params.query);

    let query = params.query.unwrap_or_default();
    let suggestions = state
        .club_service
        .autocomplete(query.trim())
        .await
        .or_api("Autocomplete failed")?;
    Ok(Json(suggestions.into_iter().map(ClubMapper::suggestion_to_dto).collect()))
}

pub async fn recommend_clubs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(child_id): Path<String>,
) -> Result<Json<Vec<Club>>, ApiError> {
    info!("GET /api/clubs/recommendations/{} - user {}", child_id, user.id);

    let clubs = state
        .recommendation_service
        .recommend(&child_id)
        .await
        .or_api("Failed to build recommendations")?;
    Ok(Json(ClubMapper::to_list_dto(clubs)))
}

pub async fn get_club(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Result<Json<ClubDetailResponse>, ApiError> {
    info!("GET /api/clubs/{}", club_id);

    let detail = state.club_service.get_club(&club_id).await.or_api("Failed to get club")?;
    Ok(Json(ClubMapper::to_detail_dto(detail)))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
) -> Result<Json<Vec<ScheduleSlot>>, ApiError> {
    info!("GET /api/clubs/{}/schedule", club_id);

    let schedule = state
        .club_service
        .schedule(&club_id)
        .await
        .or_api("Failed to get schedule")?;
    Ok(Json(schedule.into_iter().map(ClubMapper::slot_to_dto).collect()))
}

pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(club_id): Path<String>,
) -> Result<Json<ClubStatsResponse>, ApiError> {
    info!("GET /api/clubs/{}/stats", club_id);

    let stats = state
        .club_service
        .stats(&club_id)
        .await
        .or_api("Failed to get club statistics")?;
    Ok(Json(ClubMapper::stats_to_dto(stats)))
}

pub async fn create_club(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidJson(request): ValidJson<CreateClubRequest>,
) -> Result<(StatusCode, Json<Club>), ApiError> {
    info!("POST /api/clubs - name: {}", request.name);

    let command = ClubMapper::to_create_command(request)?;
    let club = state
        .club_service
        .create_club(&user.id, command)
        .await
        .or_api("Failed to create club")?;
    Ok((StatusCode::CREATED, Json(ClubMapper::to_dto(club))))
}

pub async fn update_club(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(club_id): Path<String>,
    ValidJson(request): ValidJson<UpdateClubRequest>,
) -> Result<Json<Club>, ApiError> {
    info!("PUT /api/clubs/{}", club_id);

    let command = ClubMapper::to_update_command(request)?;
    let club = state
        .club_service
        .update_club(&club_id, command)
        .await
        .or_api("Failed to update club")?;
    Ok(Json(ClubMapper::to_dto(club)))
}

pub async fn delete_club(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(club_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    info!("DELETE /api/clubs/{}", club_id);

    state
        .club_service
        .delete_club(&club_id)
        .await
        .or_api("Failed to delete club")?;
    Ok(Json(MessageResponse::new("Club deleted")))
}

pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(club_id): Path<String>,
    ValidJson(request): ValidJson<AddReviewRequest>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    info!("POST /api/clubs/{}/reviews - rating {}", club_id, request.rating);

    let rating = u8::try_from(request.rating)
        .map_err(|_| ApiError::BadRequest("Rating must be between 1 and 5".to_string()))?;
    let command = AddReviewCommand {
        club_id,
        rating,
        comment: request.comment,
    };
    let review = state
        .review_service
        .add_review(&user, command)
        .await
        .or_api("Failed to add review")?;
    Ok((StatusCode::CREATED, Json(ClubMapper::review_to_dto(review))))
}

/// Accept up to five images in the `images` multipart field
pub async fn upload_images(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(club_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ClubImage>>), ApiError> {
    info!("POST /api/clubs/{}/upload", club_id);

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        uploads.push(ImageUpload {
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let images = state
        .club_service
        .upload_images(&club_id, uploads)
        .await
        .or_api("Failed to upload images")?;
    Ok((StatusCode::CREATED, Json(images.into_iter().map(ClubMapper::image_to_dto).collect())))
}

pub async fn delete_image(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path((club_id, image_id)): Path<(String, String)>,
) -> Result<Json<DeleteImageResponse>, ApiError> {
    info!("DELETE /api/clubs/{}/images/{}", club_id, image_id);

    let images = state
        .club_service
        .delete_image(&club_id, &image_id)
        .await
        .or_api("Failed to delete image")?;
    Ok(Json(DeleteImageResponse {
        message: "Image deleted".to_string(),
        images: images.into_iter().map(ClubMapper::image_to_dto).collect(),
    }))
}
