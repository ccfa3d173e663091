//! backend/src/io/rest/mappers/enrollment_mapper.rs

use crate::domain::commands::enrollment::CreateEnrollmentCommand;
use crate::domain::models::enrollment::{
    Enrollment as DomainEnrollment, EnrollmentDetails, EnrollmentListEntry, EnrollmentSlot, EnrollmentStatus,
};
use crate::io::rest::mappers::{ChildMapper, ClubMapper};
use shared::{ChildSummary, ClubBrief, CreateEnrollmentRequest, EnrollmentDetail, EnrollmentListItem};

pub struct EnrollmentMapper;

impl EnrollmentMapper {
    pub fn to_dto(domain: DomainEnrollment) -> shared::Enrollment {
        shared::Enrollment {
            id: domain.id,
            child: domain.child_id,
            club: domain.club_id,
            parent: domain.parent_id,
            schedule: Self::slot_to_dto(domain.slot),
            status: Self::status_to_dto(domain.status),
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn to_list_item_dto(entry: EnrollmentListEntry) -> EnrollmentListItem {
        let enrollment = entry.enrollment;
        EnrollmentListItem {
            id: enrollment.id,
            child: entry.child.map(|child| ChildSummary {
                id: child.id,
                name: child.name,
                age: child.age,
            }),
            club: entry.club.map(|club| ClubBrief {
                id: club.id,
                name: club.name,
                category: club.category,
                schedule: club.schedule.into_iter().map(ClubMapper::slot_to_dto).collect(),
                price: club.price,
            }),
            parent: enrollment.parent_id,
            schedule: Self::slot_to_dto(enrollment.slot),
            status: Self::status_to_dto(enrollment.status),
            created_at: enrollment.created_at.to_rfc3339(),
        }
    }

    pub fn to_detail_dto(details: EnrollmentDetails) -> EnrollmentDetail {
        let enrollment = details.enrollment;
        EnrollmentDetail {
            id: enrollment.id,
            child: details.child.map(ChildMapper::to_dto),
            club: details.club.map(ClubMapper::to_dto),
            parent: enrollment.parent_id,
            schedule: Self::slot_to_dto(enrollment.slot),
            status: Self::status_to_dto(enrollment.status),
            created_at: enrollment.created_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(dto: CreateEnrollmentRequest) -> CreateEnrollmentCommand {
        CreateEnrollmentCommand {
            child_id: dto.child_id.trim().to_string(),
            club_id: dto.club_id.trim().to_string(),
            slot: EnrollmentSlot {
                day: dto.schedule.day.trim().to_string(),
                time: dto.schedule.time.trim().to_string(),
            },
        }
    }

    pub fn status_to_dto(status: EnrollmentStatus) -> shared::EnrollmentStatus {
        match status {
            EnrollmentStatus::Pending => shared::EnrollmentStatus::Pending,
            EnrollmentStatus::Confirmed => shared::EnrollmentStatus::Confirmed,
            EnrollmentStatus::Cancelled => shared::EnrollmentStatus::Cancelled,
        }
    }

    fn slot_to_dto(slot: EnrollmentSlot) -> shared::EnrollmentSlot {
        shared::EnrollmentSlot {
            day: slot.day,
            time: slot.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::enrollment::ChildProjection;
    use crate::test_utils::slot;

    #[test]
    fn test_list_item_keeps_missing_referents_null() {
        let enrollment = DomainEnrollment::new_pending("child-1", "club-gone", "parent-1", slot("Tue", "17:00"));
        let entry = EnrollmentListEntry {
            enrollment,
            child: Some(ChildProjection {
                id: "child-1".to_string(),
                name: "Anna".to_string(),
                age: 9,
            }),
            club: None,
        };

        let dto = EnrollmentMapper::to_list_item_dto(entry);

        assert_eq!(dto.child.map(|c| c.name), Some("Anna".to_string()));
        assert!(dto.club.is_none());
        assert_eq!(dto.status, shared::EnrollmentStatus::Pending);
        assert_eq!(dto.schedule.day, "Tue");
    }
}
