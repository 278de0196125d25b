use std::io;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::video::VideoResponse;
use crate::services::ingest::{ThumbnailUpload, VideoUpload};
use crate::services::staging::BodyLimitExceeded;
use crate::state::AppState;

/// Allowance for multipart boundaries and part headers on top of the payload.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

fn to_io_error(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::other(BodyLimitExceeded)
    } else {
        io::Error::other(err.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/videos/{id}/video",
    params(("id" = Uuid, Path, description = "Video id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Field `video`, an MP4 file"),
    responses(
        (status = 200, description = "Video ingested", body = VideoResponse),
        (status = 400, description = "Missing field or unsupported media type"),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Processing or storage failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("video") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(to_io_error)));

        let video = state
            .pipeline
            .ingest_video(VideoUpload {
                user_id: auth_user.id,
                video_id,
                content_type,
                body,
            })
            .await?;

        return Ok(Json(state.signer.present_committed(video).await));
    }

    Err(AppError::BadRequest("No video field found".to_string()))
}

#[utoipa::path(
    post,
    path = "/videos/{id}/thumbnail",
    params(("id" = Uuid, Path, description = "Video id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Field `thumbnail`, a JPEG or PNG image"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Missing field or unsupported media type"),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Thumbnail exceeds the size limit")
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(video_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    // Reject non-owners before buffering the image.
    state.pipeline.authorize(auth_user.id, video_id).await?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("thumbnail") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;

        let video = state
            .pipeline
            .ingest_thumbnail(ThumbnailUpload {
                user_id: auth_user.id,
                video_id,
                content_type,
                data,
            })
            .await?;

        return Ok(Json(state.signer.present_committed(video).await));
    }

    Err(AppError::BadRequest("No thumbnail field found".to_string()))
}
