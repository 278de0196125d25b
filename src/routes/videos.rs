use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::media::reference::ObjectReference;
use crate::middleware::auth::AuthUser;
use crate::models::video::{NewVideo, Video, VideoResponse};
use crate::pagination::{PaginatedResponse, Pagination};
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Draft video created", body = VideoResponse),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let video = state
        .videos
        .create_video(NewVideo {
            user_id: auth_user.id,
            title: payload.title,
            description: payload.description,
        })
        .await?;

    tracing::info!(video_id = %video.id, user_id = %auth_user.id, "video created");
    let response = state.signer.present(video).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/videos",
    params(Pagination),
    responses(
        (status = 200, description = "The caller's videos, newest first", body = PaginatedResponse<VideoResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<PaginatedResponse<VideoResponse>>, AppError> {
    let (page, page_size) = pagination.resolve();
    let (videos, total) = state
        .videos
        .list_videos(auth_user.id, page, page_size)
        .await?;

    let mut data = Vec::with_capacity(videos.len());
    for video in videos {
        data.push(state.signer.present(video).await?);
    }

    Ok(Json(PaginatedResponse::new(data, total, page, page_size)))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video with presigned URLs", body = VideoResponse),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<VideoResponse>, AppError> {
    let video = state.pipeline.authorize(auth_user.id, id).await?;
    Ok(Json(state.signer.present(video).await?))
}

#[utoipa::path(
    delete,
    path = "/videos/{id}",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Caller does not own the video"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let video = state.pipeline.authorize(auth_user.id, id).await?;
    state.videos.delete_video(video.id).await?;

    delete_remote_objects(&state, &video).await;
    tracing::info!(video_id = %id, user_id = %auth_user.id, "video deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Remote objects are removed best-effort once the record is gone.
async fn delete_remote_objects(state: &AppState, video: &Video) {
    let stored = [video.video_ref.as_deref(), video.thumbnail_ref.as_deref()];
    for stored in stored.into_iter().flatten() {
        let reference = match ObjectReference::parse(stored) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(video_id = %video.id, error = %e, "skipping unreadable reference");
                continue;
            }
        };
        if let Err(e) = state
            .objects
            .delete_object(reference.bucket(), reference.key())
            .await
        {
            tracing::warn!(
                video_id = %video.id,
                bucket = reference.bucket(),
                key = reference.key(),
                error = %e,
                "failed to delete remote object"
            );
        }
    }
}
