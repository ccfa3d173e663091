//! backend/src/io/rest/mappers/child_mapper.rs

use crate::domain::commands::child::{CreateChildCommand, UpdateChildCommand};
use crate::domain::models::child::Child as DomainChild;
use crate::io::rest::error::ApiError;
use shared::{Child as SharedChild, CreateChildRequest, UpdateChildRequest};

/// Mapper to convert between shared Child DTOs and domain Child models.
pub struct ChildMapper;

impl ChildMapper {
    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            parent: domain.parent_id,
            name: domain.name,
            age: domain.age,
            interests: domain.interests,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(dto: CreateChildRequest) -> Result<CreateChildCommand, ApiError> {
        Ok(CreateChildCommand {
            name: dto.name,
            age: Self::age(dto.age)?,
            interests: dto.interests.unwrap_or_default(),
        })
    }

    pub fn to_update_command(dto: UpdateChildRequest) -> Result<UpdateChildCommand, ApiError> {
        Ok(UpdateChildCommand {
            name: dto.name,
            age: dto.age.map(Self::age).transpose()?,
            interests: dto.interests,
        })
    }

    fn age(age: i64) -> Result<u8, ApiError> {
        u8::try_from(age).map_err(|_| ApiError::BadRequest("Age must be between 1 and 18".to_string()))
    }
}
