//! HTTP error mapping.
//!
//! Every failure leaves a handler as an [`ApiError`], which renders the
//! shared [`ErrorResponse`] body. Internal errors carry the message of the
//! operation that failed. The cause travels with the response as
//! [`ErrorDetails`], and [`attach_error_details`] puts it into the body as
//! `error` and `stack` when [`AppState::expose_error_details`] is set (any
//! deployment but production).

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::errors::DomainError;
use crate::AppState;

/// Detailed body of an internal error, carried as a response extension
#[derive(Debug, Clone)]
pub struct ErrorDetails(pub ErrorResponse);

/// Response middleware: replace the body of internal errors with the
/// detailed one when the deployment exposes error details.
pub async fn attach_error_details(State(state): State<AppState>, mut response: Response) -> Response {
    match response.extensions_mut().remove::<ErrorDetails>() {
        Some(ErrorDetails(details)) if state.expose_error_details => {
            (response.status(), Json(details)).into_response()
        }
        _ => response,
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Internal { message: String, source: anyhow::Error },
}

impl ApiError {
    pub fn internal(message: impl Into<String>, source: anyhow::Error) -> Self {
        ApiError::Internal {
            message: message.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) => ApiError::BadRequest(message),
            DomainError::NotFound(message) => ApiError::NotFound(message),
            // A failed state precondition reads as "no such record in that state"
            DomainError::Conflict(message) => ApiError::NotFound(message),
            DomainError::Forbidden(message) => ApiError::Forbidden(message),
            DomainError::Unauthorized(message) => ApiError::Unauthorized(message),
            DomainError::Internal(source) => ApiError::internal("Server error", source),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Attach an operation specific message to internal failures
pub trait DomainResultExt<T> {
    fn or_api(self, message: &str) -> Result<T, ApiError>;
}

impl<T> DomainResultExt<T> for Result<T, DomainError> {
    fn or_api(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            DomainError::Internal(source) => ApiError::internal(message, source),
            other => other.into(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Internal { message, source } => {
                error!("{}: {:#}", message, source);
                let details = ErrorDetails(ErrorResponse {
                    message: message.clone(),
                    error: Some(format!("{:#}", source)),
                    stack: Some(format!("{:?}", source)),
                });
                let body = ErrorResponse {
                    message,
                    error: None,
                    stack: None,
                };
                let mut response = (status, Json(body)).into_response();
                response.extensions_mut().insert(details);
                response
            }
            other => {
                warn!("{} {}", status.as_u16(), other);
                let body = ErrorResponse {
                    message: other.to_string(),
                    error: None,
                    stack: None,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
