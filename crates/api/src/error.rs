//! API error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;
use vantage_core::visibility::{DirectoryError, VisibilityError};
use vantage_shared::AppError;

/// Handler error rendered as `{"error": code, "message": message}`.
///
/// Server-side failures are logged and replaced with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 404 for a record that does not exist.
    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self(AppError::NotFound(format!("{what} not found")))
    }

    /// 400 for an invalid request.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<VisibilityError> for ApiError {
    fn from(err: VisibilityError) -> Self {
        match err {
            VisibilityError::Forbidden => {
                Self(AppError::Forbidden(VisibilityError::Forbidden.to_string()))
            }
            VisibilityError::Directory(e) => e.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_client_visible() {
            self.0.message().to_string()
        } else {
            error!(error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}
