//! # Club Marketplace Backend
//!
//! REST service where parents register, describe their children, browse and
//! search extracurricular clubs, enroll children, leave reviews and receive
//! recommendations.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST handlers, validation, mappers)
//!     ↓
//! Domain Layer (services, business rules)
//!     ↓
//! Storage Layer (SQLite repositories, image files)
//! ```
//!
//! [`initialize_backend`] wires the layers together from an [`AppConfig`],
//! [`create_router`] exposes them under `/api` and [`start_server`] serves
//! the router until Ctrl+C or SIGTERM.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    middleware, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{error, info, warn};

pub use config::AppConfig;
use domain::{
    AuthService, ChildService, ClubService, EnrollmentService, LogNotifier, NotificationService, Notifier,
    RecommendationService, ReviewService, SmtpNotifier,
};
use storage::{
    ChildRepository, ClubRepository, DbConnection, EnrollmentRepository, ImageStore, SqliteClubSearchIndex,
    UserRepository,
};

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub child_service: ChildService,
    pub club_service: ClubService,
    pub enrollment_service: EnrollmentService,
    pub review_service: ReviewService,
    pub recommendation_service: RecommendationService,
    /// Send the cause of internal errors to clients
    pub expose_error_details: bool,
}

/// Open the database, pick a notifier and build the application state
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => match SmtpNotifier::new(email) {
            Ok(smtp) => Arc::new(smtp),
            Err(e) => {
                warn!("SMTP unavailable, emails will only be logged: {:#}", e);
                Arc::new(LogNotifier)
            }
        },
        None => {
            info!("No SMTP settings, emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    Ok(build_state(db, config, notifier))
}

/// Wire repositories into services
pub fn build_state(db: DbConnection, config: &AppConfig, notifier: Arc<dyn Notifier>) -> AppState {
    info!("Setting up domain services");
    let users = Arc::new(UserRepository::new(db.clone()));
    let children = Arc::new(ChildRepository::new(db.clone()));
    let clubs = Arc::new(ClubRepository::new(db.clone()));
    let enrollments = Arc::new(EnrollmentRepository::new(db.clone()));
    let search_index = Arc::new(SqliteClubSearchIndex::new(db));

    let notifications = NotificationService::new(notifier, config.cancellation_delivery);

    AppState {
        auth_service: AuthService::new(users.clone(), &config.jwt_secret, config.token_ttl_hours),
        child_service: ChildService::new(children.clone(), users),
        club_service: ClubService::new(
            clubs.clone(),
            enrollments.clone(),
            search_index,
            ImageStore::new(config.upload_dir.clone()),
        ),
        enrollment_service: EnrollmentService::new(
            enrollments.clone(),
            children.clone(),
            clubs.clone(),
            notifications,
        ),
        review_service: ReviewService::new(clubs.clone(), enrollments),
        recommendation_service: RecommendationService::new(children, clubs),
        expose_error_details: !config.is_production(),
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, upload_dir: &Path, cors_origin: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Invalid CORS origin, allowing any: {}", e);
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    };

    let api_routes = Router::new()
        .nest("/auth", io::rest::auth_apis::router())
        .nest("/children", io::rest::child_apis::router())
        .nest("/clubs", io::rest::club_apis::router())
        .nest("/enrollments", io::rest::enrollment_apis::router());

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(middleware::map_response_with_state(
            app_state.clone(),
            io::rest::error::attach_error_details,
        ))
        .layer(cors)
        .with_state(app_state)
}

/// Serve the API until a shutdown signal arrives
pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = initialize_backend(&config).await?;
    let app = create_router(state, &config.upload_dir, config.cors_origin.as_deref());

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{empty_request, send, TestApp};
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_api_is_nested_and_uploads_are_served() {
        let app = TestApp::new().await;
        let clubs_dir = app.uploads.path().join("clubs");
        std::fs::create_dir_all(&clubs_dir).unwrap();
        std::fs::write(clubs_dir.join("images-1.png"), b"png bytes").unwrap();
        let router = create_router(app.state.clone(), app.uploads.path(), None);

        let (status, page) = send(router.clone(), empty_request(Method::GET, "/api/clubs", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["totalClubs"], 0);

        let (status, _) = send(router.clone(), empty_request(Method::GET, "/api/auth/user", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = router
            .clone()
            .oneshot(empty_request(Method::GET, "/uploads/clubs/images-1.png", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"png bytes");

        let response = router
            .oneshot(empty_request(Method::GET, "/api/nothing-here", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
