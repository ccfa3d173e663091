//! Identity provider: registration, login and bearer token verification.
//!
//! Tokens are HS256 JWTs whose subject is the user id. Passwords are stored
//! as Argon2 PHC strings; hashing and verification run on the blocking pool.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::commands::auth::{LoginCommand, RegisterCommand};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::user::{User, DEFAULT_ROLE};
use crate::storage::traits::UserStorage;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_TOKEN: &str = "Token is not valid";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStorage>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStorage>, jwt_secret: &str, token_ttl_hours: i64) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    /// Create an account and return a token for it
    pub async fn register(&self, command: RegisterCommand) -> DomainResult<String> {
        let email = normalize_email(&command.email);
        info!("Registering user: {}", email);

        if self.users.find_user_by_email(&email).await?.is_some() {
            warn!("Registration rejected, email already in use: {}", email);
            return Err(DomainError::validation("User already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: User::generate_id(),
            name: command.name.trim().to_string(),
            email,
            password_hash: hash_password(command.password).await?,
            phone: command.phone,
            role: DEFAULT_ROLE.to_string(),
            children: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.users.store_user(&user).await?;

        info!("Registered user {} with ID: {}", user.email, user.id);
        self.issue_token(&user.id)
    }

    /// Check credentials and return a fresh token
    pub async fn login(&self, command: LoginCommand) -> DomainResult<String> {
        let email = normalize_email(&command.email);
        info!("Login attempt: {}", email);

        let user = match self.users.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!("Login failed, unknown email: {}", email);
                return Err(DomainError::validation(INVALID_CREDENTIALS));
            }
        };

        if !verify_password(command.password, user.password_hash.clone()).await? {
            warn!("Login failed, wrong password for: {}", email);
            return Err(DomainError::validation(INVALID_CREDENTIALS));
        }

        self.issue_token(&user.id)
    }

    /// Resolve a bearer token to the user it was issued for
    pub async fn authenticate(&self, token: &str) -> DomainResult<User> {
        let user_id = self.verify_token(token)?;
        self.users
            .get_user(&user_id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("Token is not valid, user not found".to_string()))
    }

    pub fn issue_token(&self, user_id: &str) -> DomainResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
            .map_err(DomainError::from)
    }

    pub fn verify_token(&self, token: &str) -> DomainResult<String> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.sub)
            .map_err(|e| {
                warn!("Rejected token: {}", e);
                DomainError::Unauthorized(INVALID_TOKEN.to_string())
            })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String) -> DomainResult<String> {
    let hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    })
    .await
    .context("Password hashing task failed")??;
    Ok(hash)
}

async fn verify_password(password: String, stored_hash: String) -> DomainResult<bool> {
    let matches = tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(&stored_hash).map_err(|e| anyhow!("Corrupt password hash: {}", e))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .context("Password verification task failed")??;
    Ok(matches)
}
