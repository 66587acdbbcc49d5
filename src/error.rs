use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ShortLink;

/// Failures reported by a [`LinkStore`](crate::store::LinkStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("short id already exists: {0}")]
    AlreadyExists(String),

    /// The target URL is already mapped; carries the record that owns it.
    #[error("target url already mapped to {}", .0.short_id)]
    TargetExists(ShortLink),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures reported by the [`Allocator`](crate::allocator::Allocator).
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("could not find a free short id after {attempts} attempts")]
    Exhausted { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by HTTP handlers. Rendered as `{ "detail": "..." }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store error: {:?}", e);
        ApiError::Internal("Internal error".into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("DB error: {:?}", e);
        ApiError::Internal("Internal error".into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<AllocError> for ApiError {
    fn from(e: AllocError) -> Self {
        match e {
            AllocError::Exhausted { attempts } => {
                tracing::warn!("Short id allocation exhausted after {} attempts", attempts);
                ApiError::Internal("Could not generate a short link, please retry".into())
            }
            AllocError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unprocessable("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(AllocError::Exhausted { attempts: 10 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn exhausted_message_mentions_attempts() {
        let err = AllocError::Exhausted { attempts: 10 };
        assert_eq!(
            err.to_string(),
            "could not find a free short id after 10 attempts"
        );
    }
}
