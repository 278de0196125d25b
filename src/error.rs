use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::media::reference::ReferenceError;
use crate::media::tools::ToolError;
use crate::services::object_store::ObjectStoreError;
use crate::store::StoreError;

/// Failure classes of the ingestion pipeline, used to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Resource,
    ExternalTool,
    Upload,
    Persistence,
    InvalidReference,
    Signing,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("video {0} not found")]
    VideoNotFound(uuid::Uuid),

    #[error("user is not the owner of this video")]
    NotOwner,

    #[error("unsupported media type: {0}")]
    InvalidMediaType(String),

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },

    #[error("failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error("fast-start remux failed: {0}")]
    Transcode(#[source] ToolError),

    #[error("stream probe failed: {0}")]
    Probe(#[source] ToolError),

    #[error("object upload failed: {0}")]
    Upload(#[source] ObjectStoreError),

    #[error("metadata lookup failed: {0}")]
    MetadataUnavailable(#[source] StoreError),

    #[error("metadata update failed: {0}")]
    Persistence(#[source] StoreError),

    #[error("invalid object reference: {0}")]
    InvalidReferenceFormat(#[from] ReferenceError),

    #[error("presigning failed: {0}")]
    Signing(#[source] ObjectStoreError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::VideoNotFound(_)
            | IngestError::NotOwner
            | IngestError::InvalidMediaType(_)
            | IngestError::PayloadTooLarge { .. } => ErrorKind::Validation,
            IngestError::Staging(_) | IngestError::MetadataUnavailable(_) => ErrorKind::Resource,
            IngestError::Transcode(_) | IngestError::Probe(_) => ErrorKind::ExternalTool,
            IngestError::Upload(_) => ErrorKind::Upload,
            IngestError::Persistence(_) => ErrorKind::Persistence,
            IngestError::InvalidReferenceFormat(_) => ErrorKind::InvalidReference,
            IngestError::Signing(_) => ErrorKind::Signing,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "internal server error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::VideoNotFound(_) => AppError::NotFound(err.to_string()),
            IngestError::NotOwner => AppError::Forbidden(err.to_string()),
            IngestError::InvalidMediaType(_) => AppError::BadRequest(err.to_string()),
            IngestError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound(err.to_string()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::BadRequest(format!("Invalid multipart data: {}", err.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_owner_maps_to_forbidden() {
        let err: AppError = IngestError::NotOwner.into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn tool_failures_are_external_and_internal() {
        let err = IngestError::Transcode(ToolError::NoVideoStream);
        assert_eq!(err.kind(), ErrorKind::ExternalTool);

        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn oversized_upload_is_a_validation_failure() {
        let err = IngestError::PayloadTooLarge { limit: 1 << 30 };
        assert_eq!(err.kind(), ErrorKind::Validation);

        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn lookup_failure_is_not_a_persistence_failure() {
        let err = IngestError::MetadataUnavailable(StoreError::Database("timeout".into()));
        assert_eq!(err.kind(), ErrorKind::Resource);

        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn persistence_failure_is_classified() {
        let err = IngestError::Persistence(StoreError::Database("connection reset".into()));
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
