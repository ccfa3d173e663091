//! backend/src/io/rest/mappers/user_mapper.rs

use crate::domain::commands::auth::{LoginCommand, RegisterCommand};
use crate::domain::models::user::User as DomainUser;
use shared::{LoginRequest, RegisterRequest, User as SharedUser};

pub struct UserMapper;

impl UserMapper {
    /// The password hash never leaves the domain.
    pub fn to_dto(domain: DomainUser) -> SharedUser {
        SharedUser {
            id: domain.id,
            name: domain.name,
            email: domain.email,
            phone: domain.phone,
            role: domain.role,
            children: domain.children,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_register_command(dto: RegisterRequest) -> RegisterCommand {
        RegisterCommand {
            name: dto.name,
            email: dto.email,
            password: dto.password,
            phone: dto.phone,
        }
    }

    pub fn to_login_command(dto: LoginRequest) -> LoginCommand {
        LoginCommand {
            email: dto.email,
            password: dto.password,
        }
    }
}
