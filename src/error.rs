use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use model::store::StoreError;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::schemas::{ErrorResponse, ResponseStatus};

/// Errors a handler can return. Each kind renders as the JSON envelope with its own
/// status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or a missing/invalid token.
    #[error("{0}")]
    Auth(String),

    /// The profile, reminder or preference row does not exist for this user.
    #[error("{0}")]
    NotFound(String),

    /// A username or email belongs to another user.
    #[error("{0}")]
    Conflict(String),

    /// Unexpected store or IO failure. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Internal(detail) => {
                error!("Request failed: {}", detail);
                ErrorResponse {
                    resp: ResponseStatus::Error,
                    message: "Internal server error".to_string(),
                    code: self.code().to_string(),
                }
            }
            Self::Validation(message)
            | Self::Auth(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => ErrorResponse {
                resp: ResponseStatus::Failed,
                message: message.clone(),
                code: self.code().to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Self::Validation(message),
            StoreError::Auth(message) => Self::Auth(message),
            StoreError::NotFound(message) => Self::NotFound(message),
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Credential(_) | StoreError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Validation(format!("Invalid multipart body: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(format!("Media storage failure: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(StoreError::Validation("taken".into())),
            ApiError::Validation(m) if m == "taken"
        ));
        assert!(matches!(ApiError::from(StoreError::Auth("no".into())), ApiError::Auth(_)));
        assert!(matches!(
            ApiError::from(StoreError::Conflict("dup".into())),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Database(DbErr::Custom("boom".into()))),
            ApiError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let response = ApiError::Internal("secret database error".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.resp, ResponseStatus::Error);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("secret"));
    }
}
