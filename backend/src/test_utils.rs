//! Fixtures shared by the unit and router tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tower::ServiceExt;

use crate::config::{AppConfig, Environment};
use crate::domain::commands::child::CreateChildCommand;
use crate::domain::models::child::Child;
use crate::domain::models::club::{AgeRange, Club, Contact, GeoPoint};
use crate::domain::models::enrollment::EnrollmentSlot;
use crate::domain::models::user::{User, DEFAULT_ROLE};
use crate::domain::{CancellationDelivery, Notifier};
use crate::storage::{ClubRepository, ClubStorage, DbConnection, UserRepository, UserStorage};
use crate::{build_state, AppState};

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn sample_user(email: &str) -> User {
    let now = Utc::now();
    User {
        id: User::generate_id(),
        name: "Test Parent".to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        phone: None,
        role: DEFAULT_ROLE.to_string(),
        children: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_child(parent_id: &str, age: u8, interests: &[&str]) -> Child {
    let now = Utc::now();
    Child {
        id: Child::generate_id(),
        parent_id: parent_id.to_string(),
        name: "Mia".to_string(),
        age,
        interests: interests.iter().map(|s| s.to_string()).collect(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_club(name: &str, interests: &[&str], min_age: u8, max_age: u8) -> Club {
    let now = Utc::now();
    Club {
        id: Club::generate_id(),
        name: name.to_string(),
        description: "A friendly club for curious kids".to_string(),
        category: "general".to_string(),
        location: GeoPoint::default(),
        address: "1 Main St".to_string(),
        schedule: Vec::new(),
        age_range: AgeRange {
            min: min_age,
            max: max_age,
        },
        price: 50.0,
        contact: Contact::default(),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        images: Vec::new(),
        reviews: Vec::new(),
        total_ratings: 0,
        review_count: 0,
        rating: 0.0,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn slot(day: &str, time: &str) -> EnrollmentSlot {
    EnrollmentSlot {
        day: day.to_string(),
        time: time.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that hands every message to a channel
pub struct RecordingNotifier {
    sent: UnboundedSender<SentMessage>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, UnboundedReceiver<SentMessage>) {
        let (sent, received) = unbounded_channel();
        (Self { sent }, received)
    }

    /// Next message, or `None` if nothing arrives within a second
    pub async fn next(received: &mut UnboundedReceiver<SentMessage>) -> Option<SentMessage> {
        tokio::time::timeout(Duration::from_secs(1), received.recv())
            .await
            .ok()
            .flatten()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .send(SentMessage {
                to: to_email.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            })
            .map_err(|_| anyhow!("recording channel closed"))
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _to_email: &str, _subject: &str, _body: &str) -> Result<()> {
        Err(anyhow!("SMTP relay unreachable"))
    }
}

/// A fully wired application over an in-memory database
pub struct TestApp {
    pub state: AppState,
    pub db: DbConnection,
    pub sent: UnboundedReceiver<SentMessage>,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let (notifier, sent) = RecordingNotifier::new();

        let config = AppConfig {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            token_ttl_hours: 1,
            environment: Environment::Development,
            upload_dir: uploads.path().to_path_buf(),
            cors_origin: None,
            email: None,
            cancellation_delivery: CancellationDelivery::Detached,
        };
        let state = build_state(db.clone(), &config, Arc::new(notifier));

        Self { state, db, sent, uploads }
    }

    /// A stored parent and a bearer token for it
    pub async fn parent(&self, email: &str) -> (User, String) {
        let user = sample_user(email);
        UserRepository::new(self.db.clone())
            .store_user(&user)
            .await
            .expect("Failed to store parent");
        let token = self.state.auth_service.issue_token(&user.id).expect("Failed to issue token");
        (user, token)
    }

    /// A child registered through the child service, so the parent's list knows it
    pub async fn child_of(&self, parent: &User, age: u8, interests: &[&str]) -> Child {
        let command = CreateChildCommand {
            name: "Mia".to_string(),
            age,
            interests: interests.iter().map(|s| s.to_string()).collect(),
        };
        self.state
            .child_service
            .create_child(&parent.id, command)
            .await
            .expect("Failed to create child")
    }

    pub async fn club(&self, club: Club) -> Club {
        ClubRepository::new(self.db.clone())
            .store_club(&club)
            .await
            .expect("Failed to store club");
        club
    }
}

pub fn json_request<T: Serialize>(method: Method, uri: &str, token: Option<&str>, body: &T) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("Failed to serialize body")))
        .expect("Failed to build request")
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

/// Send one request and decode the JSON body (`Null` when empty)
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, body)
}
