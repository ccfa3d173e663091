//! # REST API for Accounts
//!
//! Registration, login and the current user.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use shared::{LoginRequest, RegisterRequest, TokenResponse, User};
use tracing::info;

use super::error::{ApiError, DomainResultExt};
use super::extractors::{AuthUser, ValidJson};
use super::mappers::UserMapper;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/user", get(current_user))
}

/// Create an account and sign it in
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    info!("POST /api/auth/register - email: {}", request.email);

    let token = state
        .auth_service
        .register(UserMapper::to_register_command(request))
        .await
        .or_api("Registration failed")?;
    Ok(Json(TokenResponse { token }))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    info!("POST /api/auth/login - email: {}", request.email);

    let token = state
        .auth_service
        .login(UserMapper::to_login_command(request))
        .await
        .or_api("Login failed")?;
    Ok(Json(TokenResponse { token }))
}

pub async fn current_user(AuthUser(user): AuthUser) -> Json<User> {
    info!("GET /api/auth/user - {}", user.id);
    Json(UserMapper::to_dto(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::extractors::LEGACY_TOKEN_HEADER;
    use crate::test_utils::{empty_request, json_request, send, TestApp};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};

    fn register_body(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Anna".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            phone: Some("+100200300".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_login_and_fetch_user() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());

        let (status, body) = send(
            routes.clone(),
            json_request(Method::POST, "/register", None, &register_body("Anna@Example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some());

        let login = LoginRequest {
            email: "anna@example.com".to_string(),
            password: "secret123".to_string(),
        };
        let (status, body) = send(routes.clone(), json_request(Method::POST, "/login", None, &login)).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, user) = send(routes, empty_request(Method::GET, "/user", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "anna@example.com");
        assert_eq!(user["role"], "parent");
        assert!(user.get("passwordHash").is_none());
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_bad_request() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());

        let first = send(routes.clone(), json_request(Method::POST, "/register", None, &register_body("dup@example.com"))).await;
        assert_eq!(first.0, StatusCode::OK);

        let (status, body) =
            send(routes, json_request(Method::POST, "/register", None, &register_body("dup@example.com"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());

        let mut request = register_body("not-an-email");
        request.password = "123".to_string();
        let (status, body) = send(routes, json_request(Method::POST, "/register", None, &request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("valid email"));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());
        send(routes.clone(), json_request(Method::POST, "/register", None, &register_body("ann@example.com"))).await;

        let login = LoginRequest {
            email: "ann@example.com".to_string(),
            password: "wrong-password".to_string(),
        };
        let (status, body) = send(routes, json_request(Method::POST, "/login", None, &login)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_current_user_requires_token() {
        let app = TestApp::new().await;
        let routes = router().with_state(app.state.clone());

        let (status, _) = send(routes.clone(), empty_request(Method::GET, "/user", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(routes, empty_request(Method::GET, "/user", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_legacy_token_header() {
        let app = TestApp::new().await;
        let (parent, token) = app.parent("legacy@example.com").await;
        let routes = router().with_state(app.state.clone());

        let request = Request::builder()
            .method(Method::GET)
            .uri("/user")
            .header(LEGACY_TOKEN_HEADER, token)
            .body(Body::empty())
            .unwrap();
        let (status, user) = send(routes, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["id"], parent.id);
    }
}
