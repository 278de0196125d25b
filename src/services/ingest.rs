//! Video ingestion pipeline.
//!
//! One call handles one upload, strictly in order:
//!
//! 1. load the record and check the caller owns it (no I/O before this)
//! 2. stage the body into a temp file, bounded by `max_upload_bytes`
//! 3. remux the staged file into a fast-start sibling
//! 4. probe the sibling and classify its aspect ratio
//! 5. build a `<aspect>/<random-id>.mp4` key and upload the sibling
//! 6. write the `"<bucket>,<key>"` reference into the record
//!
//! Every temp file is released before the call returns, whichever step
//! failed. Remote side effects are not compensated: a metadata failure after
//! step 5 leaves an orphaned object, which is handed to the [`Reconciler`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::error::IngestError;
use crate::media::reference::ObjectReference;
use crate::media::tools::{Prober, Remuxer};
use crate::media::{aspect, keys, parse_media_type, THUMBNAIL_MEDIA_TYPES, VIDEO_MEDIA_TYPE};
use crate::models::video::Video;
use crate::services::object_store::{ObjectBody, ObjectStore};
use crate::services::reconcile::{LogReconciler, Reconciler};
use crate::services::staging::StagingArea;
use crate::store::VideoStore;

/// Upper bound for an uploaded video body (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1 << 30;

/// Upper bound for an uploaded thumbnail (10 MiB).
pub const MAX_THUMBNAIL_BYTES: usize = 10 << 20;

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub bucket: String,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: u64,
}

pub struct VideoUpload<R> {
    pub user_id: Uuid,
    pub video_id: Uuid,
    /// Declared `Content-Type` of the uploaded part.
    pub content_type: String,
    pub body: R,
}

pub struct ThumbnailUpload {
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub content_type: String,
    pub data: Bytes,
}

pub struct IngestPipeline {
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    remuxer: Arc<dyn Remuxer>,
    prober: Arc<dyn Prober>,
    reconciler: Arc<dyn Reconciler>,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        remuxer: Arc<dyn Remuxer>,
        prober: Arc<dyn Prober>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            videos,
            objects,
            remuxer,
            prober,
            reconciler: Arc::new(LogReconciler),
            settings,
        }
    }

    pub fn with_reconciler(mut self, reconciler: Arc<dyn Reconciler>) -> Self {
        self.reconciler = reconciler;
        self
    }

    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Load a record and confirm `user_id` owns it.
    pub async fn authorize(&self, user_id: Uuid, video_id: Uuid) -> Result<Video, IngestError> {
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(IngestError::MetadataUnavailable)?
            .ok_or(IngestError::VideoNotFound(video_id))?;

        if video.user_id != user_id {
            tracing::warn!(%video_id, %user_id, "upload rejected: caller does not own video");
            return Err(IngestError::NotOwner);
        }

        Ok(video)
    }

    #[tracing::instrument(skip_all, fields(video_id = %upload.video_id, user_id = %upload.user_id))]
    pub async fn ingest_video<R>(&self, upload: VideoUpload<R>) -> Result<Video, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let VideoUpload {
            user_id,
            video_id,
            content_type,
            mut body,
        } = upload;

        let video = self.authorize(user_id, video_id).await?;
        let media_type = parse_media_type(&content_type)
            .filter(|m| m == VIDEO_MEDIA_TYPE)
            .ok_or_else(|| IngestError::InvalidMediaType(content_type.clone()))?;

        let start = Instant::now();
        let mut staging = StagingArea::new(&self.settings.staging_dir);
        let result = self
            .run_video_steps(&mut staging, video, &media_type, &mut body)
            .await;
        staging.release();

        match &result {
            Ok(video) => tracing::info!(
                video_ref = video.video_ref.as_deref().unwrap_or_default(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "video ingested"
            ),
            Err(e) => tracing::error!(error = %e, kind = ?e.kind(), "video ingestion failed"),
        }
        result
    }

    async fn run_video_steps<R>(
        &self,
        staging: &mut StagingArea,
        mut video: Video,
        media_type: &str,
        body: &mut R,
    ) -> Result<Video, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let staged = staging
            .stage(body, self.settings.max_upload_bytes)
            .await?;

        let remuxed = staging.sibling(&staged, "faststart");
        self.remuxer
            .remux_fast_start(&staged, &remuxed)
            .await
            .map_err(IngestError::Transcode)?;

        let dimensions = self
            .prober
            .probe_dimensions(&remuxed)
            .await
            .map_err(IngestError::Probe)?;
        let aspect = aspect::classify(dimensions).map_err(IngestError::Probe)?;
        tracing::debug!(
            width = dimensions.width,
            height = dimensions.height,
            %aspect,
            "classified video"
        );

        let key = keys::storage_key(aspect.as_str(), media_type);
        let reference = ObjectReference::new(self.settings.bucket.as_str(), key)?;

        self.objects
            .put_object(
                reference.bucket(),
                reference.key(),
                media_type,
                ObjectBody::File(remuxed),
            )
            .await
            .map_err(IngestError::Upload)?;

        video.video_ref = Some(reference.to_string());
        video.updated_at = Utc::now().naive_utc();
        self.persist(&video, &reference).await?;

        Ok(video)
    }

    /// The simpler sibling path: validate, upload from memory, persist.
    #[tracing::instrument(skip_all, fields(video_id = %upload.video_id, user_id = %upload.user_id))]
    pub async fn ingest_thumbnail(&self, upload: ThumbnailUpload) -> Result<Video, IngestError> {
        let mut video = self.authorize(upload.user_id, upload.video_id).await?;

        let media_type = parse_media_type(&upload.content_type)
            .filter(|m| THUMBNAIL_MEDIA_TYPES.contains(&m.as_str()))
            .ok_or_else(|| IngestError::InvalidMediaType(upload.content_type.clone()))?;

        if upload.data.len() > MAX_THUMBNAIL_BYTES {
            return Err(IngestError::PayloadTooLarge {
                limit: MAX_THUMBNAIL_BYTES as u64,
            });
        }

        let key = keys::storage_key(keys::THUMBNAIL_PREFIX, &media_type);
        let reference = ObjectReference::new(self.settings.bucket.as_str(), key)?;

        self.objects
            .put_object(
                reference.bucket(),
                reference.key(),
                &media_type,
                ObjectBody::Bytes(upload.data),
            )
            .await
            .map_err(IngestError::Upload)?;

        video.thumbnail_ref = Some(reference.to_string());
        video.updated_at = Utc::now().naive_utc();
        self.persist(&video, &reference).await?;

        Ok(video)
    }

    async fn persist(&self, video: &Video, reference: &ObjectReference) -> Result<(), IngestError> {
        if let Err(e) = self.videos.update_video(video).await {
            let err = IngestError::Persistence(e);
            self.reconciler.orphaned(reference, &err).await;
            return Err(err);
        }
        Ok(())
    }
}
