//! Request extractors shared by the REST handlers.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::validation::Validate;
use crate::domain::models::user::User;
use crate::AppState;

/// Header accepted in place of `Authorization: Bearer` by older clients
pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// The user behind the request's bearer token.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".to_string()))?;

        let user = state.auth_service.authenticate(token).await?;
        debug!("Authenticated user {}", user.id);
        Ok(AuthUser(user))
    }
}

fn request_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get(LEGACY_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
        })
        .filter(|token| !token.is_empty())
}

/// JSON body that has passed its [`Validate`] rules.
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Query string with rejections rendered as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));

        assert_eq!(request_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_legacy_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(LEGACY_TOKEN_HEADER, HeaderValue::from_static("legacy"));
        assert_eq!(request_token(&headers), Some("legacy"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(request_token(&headers), Some("legacy"));
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(request_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(request_token(&headers), None);
    }
}
