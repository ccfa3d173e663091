//! backend/src/io/rest/mappers/club_mapper.rs

use crate::domain::commands::club::{ClubDetail, ClubPage, CreateClubCommand, ListClubsQuery, UpdateClubCommand};
use crate::domain::models::club::{
    AgeRange, Club as DomainClub, ClubImage, ClubSearchFilter, ClubSort, ClubSortField, ClubSuggestion,
    Contact, DayOfWeek, GeoPoint, GeoRadius, Review, ScheduleSlot,
};
use crate::domain::models::enrollment::ClubEnrollmentStats;
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::enrollment_mapper::EnrollmentMapper;
use shared::{
    AgeCount, ClubDetailResponse, ClubPageResponse, ClubSearchParams, ClubStatsResponse, CreateClubRequest,
    GeoLocation, PageParams, PopularTime, StatusCount, UpdateClubRequest,
};

/// Search radius when the client gives a point but no distance
pub const DEFAULT_MAX_DISTANCE_M: f64 = 5000.0;

pub struct ClubMapper;

impl ClubMapper {
    pub fn to_dto(domain: DomainClub) -> shared::Club {
        shared::Club {
            id: domain.id,
            name: domain.name,
            description: domain.description,
            category: domain.category,
            location: GeoLocation::point(domain.location.longitude, domain.location.latitude),
            address: domain.address,
            schedule: domain.schedule.into_iter().map(Self::slot_to_dto).collect(),
            age_range: shared::AgeRange {
                min: domain.age_range.min as i64,
                max: domain.age_range.max as i64,
            },
            price: domain.price,
            contact: shared::Contact {
                phone: domain.contact.phone,
                email: domain.contact.email,
            },
            interests: domain.interests,
            images: domain.images.into_iter().map(Self::image_to_dto).collect(),
            reviews: domain.reviews.into_iter().map(Self::review_to_dto).collect(),
            total_ratings: domain.total_ratings,
            review_count: domain.review_count,
            rating: domain.rating,
            created_by: domain.created_by,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_list_dto(clubs: Vec<DomainClub>) -> Vec<shared::Club> {
        clubs.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_detail_dto(detail: ClubDetail) -> ClubDetailResponse {
        ClubDetailResponse {
            club: Self::to_dto(detail.club),
            enrolled_count: detail.enrolled_count,
        }
    }

    pub fn to_page_dto(page: ClubPage) -> ClubPageResponse {
        ClubPageResponse {
            clubs: Self::to_list_dto(page.clubs),
            total_pages: page.total_pages,
            current_page: page.current_page,
            total_clubs: page.total_clubs,
        }
    }

    pub fn slot_to_dto(slot: ScheduleSlot) -> shared::ScheduleSlot {
        shared::ScheduleSlot {
            day: Self::day_to_dto(slot.day),
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }

    pub fn image_to_dto(image: ClubImage) -> shared::ClubImage {
        shared::ClubImage {
            id: image.id,
            url: image.url,
            filename: image.filename,
        }
    }

    pub fn review_to_dto(review: Review) -> shared::Review {
        shared::Review {
            id: review.id,
            user: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at.to_rfc3339(),
        }
    }

    pub fn suggestion_to_dto(suggestion: ClubSuggestion) -> shared::ClubSuggestion {
        shared::ClubSuggestion {
            id: suggestion.id,
            name: suggestion.name,
            category: suggestion.category,
        }
    }

    pub fn stats_to_dto(stats: ClubEnrollmentStats) -> ClubStatsResponse {
        ClubStatsResponse {
            statuses: stats
                .statuses
                .into_iter()
                .map(|s| StatusCount {
                    status: EnrollmentMapper::status_to_dto(s.status),
                    count: s.count,
                })
                .collect(),
            total: stats.total,
            age_distribution: stats
                .age_distribution
                .into_iter()
                .map(|a| AgeCount {
                    age: a.age,
                    count: a.count,
                })
                .collect(),
            popular_times: stats
                .popular_slots
                .into_iter()
                .map(|s| PopularTime {
                    day: s.day,
                    time: s.time,
                    count: s.count,
                })
                .collect(),
        }
    }

    pub fn to_list_query(params: PageParams) -> ListClubsQuery {
        let defaults = ListClubsQuery::default();
        ListClubsQuery {
            page: params.page.filter(|p| *p > 0).unwrap_or(defaults.page),
            limit: params.limit.filter(|l| *l > 0).unwrap_or(defaults.limit),
        }
    }

    pub fn to_create_command(dto: CreateClubRequest) -> Result<CreateClubCommand, ApiError> {
        Ok(CreateClubCommand {
            name: dto.name,
            description: dto.description,
            category: dto.category,
            location: dto.coordinates.map(Self::point).unwrap_or_default(),
            address: dto.address,
            schedule: Self::schedule_to_domain(dto.schedule.unwrap_or_default()),
            age_range: Self::age_range(dto.age_range)?,
            price: dto.price,
            contact: Self::contact(dto.contact.unwrap_or_default()),
            interests: dto.interests.unwrap_or_default(),
        })
    }

    pub fn to_update_command(dto: UpdateClubRequest) -> Result<UpdateClubCommand, ApiError> {
        Ok(UpdateClubCommand {
            name: dto.name,
            description: dto.description,
            category: dto.category,
            location: dto.coordinates.map(Self::point),
            address: dto.address,
            schedule: dto.schedule.map(Self::schedule_to_domain),
            age_range: dto.age_range.map(Self::age_range).transpose()?,
            price: dto.price,
            contact: dto.contact.map(Self::contact),
            interests: dto.interests,
        })
    }

    /// Build a search filter from query parameters.
    ///
    /// Geo filtering applies only when both coordinates are present.
    pub fn to_search_filter(params: ClubSearchParams) -> Result<ClubSearchFilter, ApiError> {
        let age = params
            .age
            .map(|age| {
                u8::try_from(age).map_err(|_| ApiError::BadRequest("Age must be a non-negative integer".to_string()))
            })
            .transpose()?;

        let interests = params
            .interests
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let near = match (params.longitude, params.latitude) {
            (Some(longitude), Some(latitude)) => {
                let max_distance_m = params.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_M);
                if !max_distance_m.is_finite() || max_distance_m < 0.0 {
                    return Err(ApiError::BadRequest(
                        "maxDistance must be a non-negative number".to_string(),
                    ));
                }
                Some(GeoRadius {
                    center: GeoPoint { longitude, latitude },
                    max_distance_m,
                })
            }
            _ => None,
        };

        let mut sort = ClubSort::default();
        if let Some(key) = params.sort_by.as_deref() {
            sort.field = ClubSortField::parse(key)
                .ok_or_else(|| ApiError::BadRequest(format!("Cannot sort by '{}'", key)))?;
        }
        if let Some(order) = params.sort_order.as_deref() {
            sort.descending = match order {
                "-1" | "desc" => true,
                "1" | "asc" => false,
                other => {
                    return Err(ApiError::BadRequest(format!("Invalid sort order '{}'", other)));
                }
            };
        }

        Ok(ClubSearchFilter {
            text: params.search_text.filter(|t| !t.trim().is_empty()),
            category: params.category.filter(|c| !c.is_empty()),
            age,
            interests,
            min_price: params.min_price,
            max_price: params.max_price,
            near,
            sort,
        })
    }

    fn point([longitude, latitude]: [f64; 2]) -> GeoPoint {
        GeoPoint { longitude, latitude }
    }

    fn contact(dto: shared::Contact) -> Contact {
        Contact {
            phone: dto.phone,
            email: dto.email,
        }
    }

    fn age_range(dto: shared::AgeRange) -> Result<AgeRange, ApiError> {
        let bound = |age: i64| {
            u8::try_from(age).map_err(|_| ApiError::BadRequest("Age range is out of bounds".to_string()))
        };
        Ok(AgeRange {
            min: bound(dto.min)?,
            max: bound(dto.max)?,
        })
    }

    fn schedule_to_domain(slots: Vec<shared::ScheduleSlot>) -> Vec<ScheduleSlot> {
        slots
            .into_iter()
            .map(|slot| ScheduleSlot {
                day: Self::day_to_domain(slot.day),
                start_time: slot.start_time,
                end_time: slot.end_time,
            })
            .collect()
    }

    fn day_to_dto(day: DayOfWeek) -> shared::DayOfWeek {
        match day {
            DayOfWeek::Mon => shared::DayOfWeek::Mon,
            DayOfWeek::Tue => shared::DayOfWeek::Tue,
            DayOfWeek::Wed => shared::DayOfWeek::Wed,
            DayOfWeek::Thu => shared::DayOfWeek::Thu,
            DayOfWeek::Fri => shared::DayOfWeek::Fri,
            DayOfWeek::Sat => shared::DayOfWeek::Sat,
            DayOfWeek::Sun => shared::DayOfWeek::Sun,
        }
    }

    fn day_to_domain(day: shared::DayOfWeek) -> DayOfWeek {
        match day {
            shared::DayOfWeek::Mon => DayOfWeek::Mon,
            shared::DayOfWeek::Tue => DayOfWeek::Tue,
            shared::DayOfWeek::Wed => DayOfWeek::Wed,
            shared::DayOfWeek::Thu => DayOfWeek::Thu,
            shared::DayOfWeek::Fri => DayOfWeek::Fri,
            shared::DayOfWeek::Sat => DayOfWeek::Sat,
            shared::DayOfWeek::Sun => DayOfWeek::Sun,
        }
    }
}
