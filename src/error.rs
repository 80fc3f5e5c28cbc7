/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body {success:false, error, code})
 * - RepoError / AuthError / MailError などを統一的に変換
 */
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::{
    auth::AuthError, drive::DriveError, id_codec::IdCodecError, mail::MailError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{message}")]
    Conflict { code: &'static str, message: String },
    #[error("{message}")]
    Upstream { message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, error) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthorized => ("UNAUTHORIZED", "Unauthorized".into()),
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found")),
            AppError::Conflict { code, message } => (code, message),
            AppError::Upstream { message } => ("UPSTREAM_ERROR", message),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "Internal server error".into()),
        };

        let body = ErrorResponse {
            success: false,
            error,
            code,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "Resource already exists"),
            RepoError::Invalid(message) => AppError::bad_request("INVALID_RECORD", message),
            RepoError::Db(_) | RepoError::Migrate(_) => {
                tracing::error!(error = ?e, "repository failure");
                AppError::Internal
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        if e == AuthError::NotConfigured {
            tracing::warn!("BLOG_PASSWORD is not set; rejecting admin request");
        }
        AppError::Unauthorized
    }
}

impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        tracing::error!(error = %e, "public id encoding failed");
        AppError::Internal
    }
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        tracing::error!(error = %e, "mail delivery failed");
        AppError::Internal
    }
}

impl From<DriveError> for AppError {
    fn from(e: DriveError) -> Self {
        match e {
            DriveError::InvalidFileId => AppError::bad_request("INVALID_FILE_ID", "Invalid file ID"),
            DriveError::Status(_) | DriveError::Http(_) => {
                tracing::warn!(error = %e, "drive proxy failed");
                AppError::upstream("Failed to fetch PDF")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request("INVALID_BODY", e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::bad_request("INVALID_QUERY", e.body_text())
    }
}
