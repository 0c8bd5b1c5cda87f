//! API error type and its JSON body.
//!
//! Every failure leaves the server as `{"success": false, "message", "code"}`.
//! Internal failures are logged here and reach the client as a generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authorization::AuthorizationError;
use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::documents::DocumentError;
use crate::identity::IdentityError;
use crate::navigation::NavigationError;
use crate::photos::PhotoError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Sesión requerida".to_string(),
            ),
            ApiError::AuthFailed(detail) => (StatusCode::UNAUTHORIZED, "AUTH_FAILED", detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "VALIDATION", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Ocurrió un error interno".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            code,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DatabaseError::InvalidEnum { .. }
            | DatabaseError::ConstraintViolation(_)
            | DatabaseError::MissingReference { .. }
            | DatabaseError::Serialization(_) => ApiError::BadRequest(err.to_string()),
            DatabaseError::VersionConflict { .. } => ApiError::Conflict(err.to_string()),
            DatabaseError::Sqlite(_) | DatabaseError::MigrationFailed { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
            CoreError::Photos(e) => e.into(),
            CoreError::Identity(e) => e.into(),
            CoreError::LockPoisoned | CoreError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => ApiError::AuthFailed(err.to_string()),
            IdentityError::MissingField(_) => ApiError::BadRequest(err.to_string()),
            IdentityError::Database(e) => e.into(),
        }
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<NavigationError> for ApiError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::NotPermitted(..) => ApiError::Forbidden(err.to_string()),
            NavigationError::ConsentNotSaved => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Database(e) => e.into(),
            DocumentError::InvalidPayload { .. } => ApiError::BadRequest(err.to_string()),
            DocumentError::Pdf(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<PhotoError> for ApiError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::Empty | PhotoError::UnsupportedType | PhotoError::TooLarge { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            PhotoError::Database(e) => e.into(),
            PhotoError::Io(e) => ApiError::Internal(e.to_string()),
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

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}
