//! Club catalog: CRUD, listing, search, statistics and images.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::commands::club::{
    ClubDetail, ClubPage, CreateClubCommand, ImageUpload, ListClubsQuery, UpdateClubCommand,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::club::{
    AgeRange, Club, ClubImage, ClubSearchFilter, ClubSuggestion, ScheduleSlot,
};
use crate::domain::models::enrollment::ClubEnrollmentStats;
use crate::storage::image_store::ImageStore;
use crate::storage::traits::{ClubSearchIndex, ClubStorage, EnrollmentStorage};

pub const MAX_UPLOAD_FILES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const ALLOWED_IMAGE_TYPES: [&str; 3] = ["jpeg", "jpg", "png"];

const AUTOCOMPLETE_MIN_CHARS: usize = 2;
const AUTOCOMPLETE_LIMIT: u32 = 10;

const CLUB_NOT_FOUND: &str = "Club not found";

#[derive(Clone)]
pub struct ClubService {
    clubs: Arc<dyn ClubStorage>,
    enrollments: Arc<dyn EnrollmentStorage>,
    search_index: Arc<dyn ClubSearchIndex>,
    images: ImageStore,
}

impl ClubService {
    pub fn new(
        clubs: Arc<dyn ClubStorage>,
        enrollments: Arc<dyn EnrollmentStorage>,
        search_index: Arc<dyn ClubSearchIndex>,
        images: ImageStore,
    ) -> Self {
        Self {
            clubs,
            enrollments,
            search_index,
            images,
        }
    }

    /// One page of the catalog, newest first
    pub async fn list_clubs(&self, query: ListClubsQuery) -> DomainResult<ClubPage> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);
        info!("Listing clubs: page={}, limit={}", page, limit);

        let offset = (page - 1).saturating_mul(limit);
        let clubs = self.clubs.list_clubs(offset, limit).await?;
        let total = self.clubs.count_clubs().await?;
        let limit = limit as i64;

        Ok(ClubPage {
            clubs,
            total_pages: (total + limit - 1) / limit,
            current_page: page as i64,
            total_clubs: total,
        })
    }

    pub async fn get_club(&self, club_id: &str) -> DomainResult<ClubDetail> {
        let club = self.find_club(club_id).await?;
        let enrolled_count = self.enrollments.count_active_for_club(club_id).await?;
        Ok(ClubDetail { club, enrolled_count })
    }

    pub async fn create_club(&self, creator_id: &str, command: CreateClubCommand) -> DomainResult<Club> {
        info!("Creating club: {}", command.name);
        check_age_range(&command.age_range)?;

        let now = Utc::now();
        let club = Club {
            id: Club::generate_id(),
            name: command.name.trim().to_string(),
            description: command.description,
            category: command.category.trim().to_string(),
            location: command.location,
            address: command.address,
            schedule: command.schedule,
            age_range: command.age_range,
            price: command.price,
            contact: command.contact,
            interests: command.interests,
            images: Vec::new(),
            reviews: Vec::new(),
            total_ratings: 0,
            review_count: 0,
            rating: 0.0,
            created_by: Some(creator_id.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.clubs.store_club(&club).await?;

        info!("Created club: {} with ID: {}", club.name, club.id);
        Ok(club)
    }

    pub async fn update_club(&self, club_id: &str, command: UpdateClubCommand) -> DomainResult<Club> {
        info!("Updating club: {}", club_id);
        let mut club = self.find_club(club_id).await?;

        if let Some(name) = command.name {
            club.name = name.trim().to_string();
        }
        if let Some(description) = command.description {
            club.description = description;
        }
        if let Some(category) = command.category {
            club.category = category.trim().to_string();
        }
        if let Some(location) = command.location {
            club.location = location;
        }
        if let Some(address) = command.address {
            club.address = address;
        }
        if let Some(schedule) = command.schedule {
            club.schedule = schedule;
        }
        if let Some(age_range) = command.age_range {
            check_age_range(&age_range)?;
            club.age_range = age_range;
        }
        if let Some(price) = command.price {
            club.price = price;
        }
        if let Some(contact) = command.contact {
            club.contact = contact;
        }
        if let Some(interests) = command.interests {
            club.interests = interests;
        }
        club.updated_at = Utc::now();

        if !self.clubs.update_club(&club).await? {
            return Err(DomainError::not_found(CLUB_NOT_FOUND));
        }
        Ok(club)
    }

    /// Delete a club together with all of its enrollments
    pub async fn delete_club(&self, club_id: &str) -> DomainResult<()> {
        info!("Deleting club: {}", club_id);
        if !self.clubs.delete_club(club_id).await? {
            return Err(DomainError::not_found(CLUB_NOT_FOUND));
        }

        let removed = self.enrollments.delete_for_club(club_id).await?;
        info!("Deleted club {} and {} enrollments", club_id, removed);
        Ok(())
    }

    pub async fn search(&self, filter: &ClubSearchFilter) -> DomainResult<Vec<Club>> {
        info!("Searching clubs: {:?}", filter);
        let clubs = self.search_index.search(filter).await?;
        info!("Search matched {} clubs", clubs.len());
        Ok(clubs)
    }

    /// Name suggestions; queries shorter than two characters match nothing
    pub async fn autocomplete(&self, query: &str) -> DomainResult<Vec<ClubSuggestion>> {
        if query.chars().count() < AUTOCOMPLETE_MIN_CHARS {
            return Ok(Vec::new());
        }
        Ok(self.search_index.autocomplete(query, AUTOCOMPLETE_LIMIT).await?)
    }

    pub async fn schedule(&self, club_id: &str) -> DomainResult<Vec<ScheduleSlot>> {
        Ok(self.find_club(club_id).await?.schedule)
    }

    /// Enrollment statistics; a club without enrollments yields empty stats
    pub async fn stats(&self, club_id: &str) -> DomainResult<ClubEnrollmentStats> {
        Ok(self.enrollments.club_stats(club_id).await?)
    }

    /// Store uploaded images and append them to the club.
    ///
    /// Returns the club's full image list.
    pub async fn upload_images(&self, club_id: &str, uploads: Vec<ImageUpload>) -> DomainResult<Vec<ClubImage>> {
        info!("Uploading {} images for club {}", uploads.len(), club_id);

        if uploads.is_empty() {
            return Err(DomainError::validation("No images uploaded"));
        }
        if uploads.len() > MAX_UPLOAD_FILES {
            return Err(DomainError::validation(format!(
                "At most {} images can be uploaded at once",
                MAX_UPLOAD_FILES
            )));
        }
        let extensions = uploads
            .iter()
            .map(image_extension)
            .collect::<DomainResult<Vec<_>>>()?;

        let mut club = self.find_club(club_id).await?;

        let mut added = Vec::with_capacity(uploads.len());
        for (upload, extension) in uploads.iter().zip(&extensions) {
            match self.images.save(extension, &upload.bytes).await {
                Ok(stored) => added.push(ClubImage {
                    id: uuid::Uuid::new_v4().to_string(),
                    url: stored.url,
                    filename: stored.filename,
                }),
                Err(e) => {
                    self.discard(&added).await;
                    return Err(e.into());
                }
            }
        }

        club.images.extend(added.iter().cloned());
        match self.clubs.replace_images(club_id, &club.images).await {
            Ok(true) => Ok(club.images),
            Ok(false) => {
                self.discard(&added).await;
                Err(DomainError::not_found(CLUB_NOT_FOUND))
            }
            Err(e) => {
                self.discard(&added).await;
                Err(e.into())
            }
        }
    }

    /// Drop an image reference and remove its file. Returns the remaining images.
    pub async fn delete_image(&self, club_id: &str, image_id: &str) -> DomainResult<Vec<ClubImage>> {
        info!("Deleting image {} of club {}", image_id, club_id);
        let club = self.find_club(club_id).await?;

        let (removed, kept): (Vec<ClubImage>, Vec<ClubImage>) =
            club.images.into_iter().partition(|image| image.id == image_id);
        if removed.is_empty() {
            warn!("Image {} not attached to club {}", image_id, club_id);
        }

        if !self.clubs.replace_images(club_id, &kept).await? {
            return Err(DomainError::not_found(CLUB_NOT_FOUND));
        }
        self.discard(&removed).await;
        Ok(kept)
    }

    async fn find_club(&self, club_id: &str) -> DomainResult<Club> {
        self.clubs.get_club(club_id).await?.ok_or_else(|| {
            warn!("Club not found: {}", club_id);
            DomainError::not_found(CLUB_NOT_FOUND)
        })
    }

    async fn discard(&self, images: &[ClubImage]) {
        for image in images {
            self.images.remove(&image.filename).await;
        }
    }
}

fn check_age_range(range: &AgeRange) -> DomainResult<()> {
    if range.min > range.max {
        return Err(DomainError::validation("Minimum age cannot exceed maximum age"));
    }
    Ok(())
}

/// Lowercase extension of an acceptable image upload
fn image_extension(upload: &ImageUpload) -> DomainResult<String> {
    const IMAGES_ONLY: &str = "Images only (jpeg, jpg, png)";

    if upload.bytes.len() > MAX_IMAGE_BYTES {
        return Err(DomainError::validation(format!(
            "File {} exceeds the 5 MB limit",
            upload.original_name
        )));
    }

    let extension = Path::new(&upload.original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_IMAGE_TYPES.contains(&ext.as_str()))
        .ok_or_else(|| DomainError::validation(IMAGES_ONLY))?;

    let mime_ok = upload
        .content_type
        .as_deref()
        .map(|mime| ALLOWED_IMAGE_TYPES.iter().any(|kind| mime.contains(kind)))
        .unwrap_or(false);
    if !mime_ok {
        return Err(DomainError::validation(IMAGES_ONLY));
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::club::{Contact, GeoPoint};
    use crate::domain::models::enrollment::{Enrollment, EnrollmentStatus};
    use crate::storage::{ClubRepository, DbConnection, EnrollmentRepository, SqliteClubSearchIndex};
    use crate::test_utils::{sample_club, slot};
    use tempfile::TempDir;

    struct Fixture {
        service: ClubService,
        clubs: Arc<ClubRepository>,
        enrollments: Arc<EnrollmentRepository>,
        upload_dir: TempDir,
    }

    async fn setup_test() -> Fixture {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let clubs = Arc::new(ClubRepository::new(db.clone()));
        let enrollments = Arc::new(EnrollmentRepository::new(db.clone()));
        let upload_dir = TempDir::new().unwrap();
        let service = ClubService::new(
            clubs.clone(),
            enrollments.clone(),
            Arc::new(SqliteClubSearchIndex::new(db)),
            ImageStore::new(upload_dir.path()),
        );
        Fixture {
            service,
            clubs,
            enrollments,
            upload_dir,
        }
    }

    fn create_command(name: &str) -> CreateClubCommand {
        CreateClubCommand {
            name: name.to_string(),
            description: "Weekly games for young players".to_string(),
            category: "games".to_string(),
            location: GeoPoint::default(),
            address: "1 Main Street".to_string(),
            schedule: Vec::new(),
            age_range: AgeRange { min: 6, max: 12 },
            price: 25.0,
            contact: Contact::default(),
            interests: vec!["chess".to_string()],
        }
    }

    fn png(name: &str, size: usize) -> ImageUpload {
        ImageUpload {
            original_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![7; size],
        }
    }

    #[tokio::test]
    async fn test_create_club_starts_unrated() {
        let f = setup_test().await;
        let club = f.service.create_club("user-1", create_command("Chess")).await.unwrap();

        assert_eq!(club.rating, 0.0);
        assert_eq!(club.review_count, 0);
        assert_eq!(club.created_by.as_deref(), Some("user-1"));
        assert!(f.clubs.get_club(&club.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_club_rejects_inverted_age_range() {
        let f = setup_test().await;
        let mut command = create_command("Chess");
        command.age_range = AgeRange { min: 12, max: 6 };

        let result = f.service.create_club("user-1", command).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_clubs_pages() {
        let f = setup_test().await;
        for i in 0..3 {
            f.service.create_club("user-1", create_command(&format!("Club {}", i))).await.unwrap();
        }

        let page = f.service.list_clubs(ListClubsQuery { page: 2, limit: 2 }).await.unwrap();

        assert_eq!(page.clubs.len(), 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_clubs, 3);
    }

    #[tokio::test]
    async fn test_get_club_counts_active_enrollments() {
        let f = setup_test().await;
        let club = sample_club("Chess", &["chess"], 6, 12);
        f.clubs.store_club(&club).await.unwrap();

        let pending = Enrollment::new_pending("c1", &club.id, "p1", slot("Mon", "16:00"));
        let cancelled = Enrollment::new_pending("c2", &club.id, "p1", slot("Mon", "16:00"));
        f.enrollments.store_enrollment(&pending).await.unwrap();
        f.enrollments.store_enrollment(&cancelled).await.unwrap();
        f.enrollments
            .transition_status(&cancelled.id, None, &[EnrollmentStatus::Pending], EnrollmentStatus::Cancelled)
            .await
            .unwrap();

        let detail = f.service.get_club(&club.id).await.unwrap();
        assert_eq!(detail.enrolled_count, 1);

        assert!(matches!(f.service.get_club("missing").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let f = setup_test().await;
        let club = f.service.create_club("user-1", create_command("Chess")).await.unwrap();

        let updated = f
            .service
            .update_club(&club.id, UpdateClubCommand { price: Some(40.0), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(updated.price, 40.0);
        assert_eq!(updated.name, "Chess");
        let stored = f.clubs.get_club(&club.id).await.unwrap().unwrap();
        assert_eq!(stored.price, 40.0);

        let missing = f.service.update_club("missing", UpdateClubCommand::default()).await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_club_cascades_enrollments() {
        let f = setup_test().await;
        let club = sample_club("Chess", &["chess"], 6, 12);
        f.clubs.store_club(&club).await.unwrap();
        let enrollment = Enrollment::new_pending("c1", &club.id, "p1", slot("Mon", "16:00"));
        f.enrollments.store_enrollment(&enrollment).await.unwrap();

        f.service.delete_club(&club.id).await.unwrap();

        assert!(f.enrollments.get_enrollment_for_parent(&enrollment.id, "p1").await.unwrap().is_none());
        assert!(matches!(f.service.delete_club(&club.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_autocomplete_needs_two_characters() {
        let f = setup_test().await;
        f.clubs.store_club(&sample_club("Chess", &[], 6, 12)).await.unwrap();

        assert!(f.service.autocomplete("C").await.unwrap().is_empty());
        assert!(f.service.autocomplete("").await.unwrap().is_empty());
        assert_eq!(f.service.autocomplete("ch").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_schedule_of_missing_club() {
        let f = setup_test().await;
        assert!(matches!(f.service.schedule("missing").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_and_delete_images() {
        let f = setup_test().await;
        let club = sample_club("Art", &[], 6, 12);
        f.clubs.store_club(&club).await.unwrap();

        let images = f
            .service
            .upload_images(&club.id, vec![png("a.png", 10), png("B.PNG", 10)])
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        for image in &images {
            assert!(image.url.starts_with("/uploads/clubs/images-"));
            assert!(f.upload_dir.path().join("clubs").join(&image.filename).exists());
        }

        let remaining = f.service.delete_image(&club.id, &images[0].id).await.unwrap();
        assert_eq!(remaining, vec![images[1].clone()]);
        assert!(!f.upload_dir.path().join("clubs").join(&images[0].filename).exists());

        let stored = f.clubs.get_club(&club.id).await.unwrap().unwrap();
        assert_eq!(stored.images, remaining);
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_files() {
        let f = setup_test().await;
        let club = sample_club("Art", &[], 6, 12);
        f.clubs.store_club(&club).await.unwrap();

        let too_many = (0..6).map(|i| png(&format!("{}.png", i), 1)).collect();
        let gif = ImageUpload {
            original_name: "cat.gif".to_string(),
            content_type: Some("image/gif".to_string()),
            bytes: vec![1],
        };
        let disguised = ImageUpload {
            original_name: "cat.png".to_string(),
            content_type: Some("text/html".to_string()),
            bytes: vec![1],
        };

        for uploads in [too_many, vec![gif], vec![disguised], vec![png("big.png", MAX_IMAGE_BYTES + 1)]] {
            let result = f.service.upload_images(&club.id, uploads).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
        assert!(f.clubs.get_club(&club.id).await.unwrap().unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn test_upload_to_missing_club() {
        let f = setup_test().await;
        let result = f.service.upload_images("missing", vec![png("a.png", 1)]).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
