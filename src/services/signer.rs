use std::sync::Arc;
use std::time::Duration;

use crate::error::IngestError;
use crate::media::reference::ObjectReference;
use crate::models::video::{Video, VideoResponse};
use crate::services::object_store::ObjectStore;

/// Default lifetime of presigned download URLs.
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);

/// Expands stored object references into presigned download URLs.
#[derive(Clone)]
pub struct UrlSigner {
    objects: Arc<dyn ObjectStore>,
    expires_in: Duration,
}

impl UrlSigner {
    pub fn new(objects: Arc<dyn ObjectStore>, expires_in: Duration) -> Self {
        Self {
            objects,
            expires_in,
        }
    }

    pub async fn sign(&self, stored: &str) -> Result<String, IngestError> {
        let reference = ObjectReference::parse(stored)?;
        self.objects
            .presign_get(reference.bucket(), reference.key(), self.expires_in)
            .await
            .map_err(IngestError::Signing)
    }

    async fn sign_optional(&self, stored: Option<&str>) -> Result<Option<String>, IngestError> {
        match stored {
            Some(stored) => Ok(Some(self.sign(stored).await?)),
            None => Ok(None),
        }
    }

    /// Build the caller-facing view of a record.
    pub async fn present(&self, video: Video) -> Result<VideoResponse, IngestError> {
        let video_url = self.sign_optional(video.video_ref.as_deref()).await?;
        let thumbnail_url = self.sign_optional(video.thumbnail_ref.as_deref()).await?;
        Ok(response(video, video_url, thumbnail_url))
    }

    /// Like [`UrlSigner::present`], but a reference that cannot be signed is
    /// logged and left as `None`. For responses to a committed record change.
    pub async fn present_committed(&self, video: Video) -> VideoResponse {
        let video_url = self.sign_or_warn(video.id, video.video_ref.as_deref()).await;
        let thumbnail_url = self
            .sign_or_warn(video.id, video.thumbnail_ref.as_deref())
            .await;
        response(video, video_url, thumbnail_url)
    }

    async fn sign_or_warn(&self, video_id: uuid::Uuid, stored: Option<&str>) -> Option<String> {
        match self.sign_optional(stored).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%video_id, error = %e, kind = ?e.kind(), "returning record without presigned url");
                None
            }
        }
    }
}

fn response(video: Video, video_url: Option<String>, thumbnail_url: Option<String>) -> VideoResponse {
    VideoResponse {
        id: video.id,
        user_id: video.user_id,
        title: video.title,
        description: video.description,
        thumbnail_url,
        video_url,
        created_at: video.created_at,
        updated_at: video.updated_at,
    }
}
