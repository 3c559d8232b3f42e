//! Error types and their HTTP rendering.

use poem::error::{NotFoundError, ResponseError};
use poem::http::StatusCode;
use poem::web::Json;
use poem::{IntoResponse, Response};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Why the authorization gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Missing token")]
    MissingToken,

    /// Malformed, expired, or signed with another secret.
    #[error("Invalid token")]
    InvalidToken,
}

/// Failure talking to the relational store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[source] DbErr),

    /// A unique constraint rejected the write.
    #[error("duplicate row: {0}")]
    Duplicate(#[source] DbErr),

    #[error("query failed: {0}")]
    QueryFailed(#[source] DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return Self::Duplicate(err);
        }
        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::Unavailable(err),
            other => Self::QueryFailed(other),
        }
    }
}

/// Errors returned from request handlers.
///
/// The `Display` text is what the client sees in the `error` field, so the
/// 5xx variants carry a fixed message and keep the real cause as `source`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Post not found")]
    NotFound,

    #[error("Not authorized")]
    Forbidden,

    #[error("Invalid credentials")]
    BadCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Wraps a store failure with the message shown to the client.
    pub fn persistence(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Persistence { message, source }
    }

    pub fn internal<E>(message: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        move |source| Self::Internal {
            message,
            source: source.into(),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) | Self::BadCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Persistence { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        match self {
            Self::Persistence { message, source } => {
                tracing::error!(error = %source, "{message}");
            }
            Self::Internal { message, source } => {
                tracing::error!(error = %format!("{source:#}"), "{message}");
            }
            _ => {}
        }

        Json(ErrorBody {
            error: self.to_string(),
        })
        .with_status(self.status())
        .into_response()
    }
}

/// Renders an unmatched route like every other error.
pub(crate) async fn not_found(_: NotFoundError) -> impl IntoResponse {
    Json(ErrorBody {
        error: "Not found".to_string(),
    })
    .with_status(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_render_their_reason() {
        assert_eq!(
            ApiError::from(AuthError::MissingHeader).to_string(),
            "Missing Authorization header"
        );
        assert_eq!(ApiError::from(AuthError::MissingToken).to_string(), "Missing token");
        assert_eq!(ApiError::from(AuthError::InvalidToken).to_string(), "Invalid token");
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::UsernameTaken.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_failures_hide_their_cause() {
        let err = ApiError::persistence("Update failed")(StoreError::from(DbErr::Custom(
            "relation \"posts\" does not exist".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Update failed");
    }

    #[test]
    fn connection_errors_are_unavailable() {
        let err = StoreError::from(DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "pool closed".into(),
        )));
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(matches!(
            StoreError::from(DbErr::RecordNotFound("x".into())),
            StoreError::QueryFailed(_)
        ));
    }
}
