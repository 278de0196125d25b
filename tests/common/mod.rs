#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use video_blob_kit::error::IngestError;
use video_blob_kit::media::reference::ObjectReference;
use video_blob_kit::media::tools::{Dimensions, Prober, Remuxer, ToolError};
use video_blob_kit::models::video::{NewVideo, Video};
use video_blob_kit::services::ingest::{IngestPipeline, IngestSettings};
use video_blob_kit::services::object_store::{ObjectBody, ObjectStore, ObjectStoreError};
use video_blob_kit::services::reconcile::Reconciler;
use video_blob_kit::store::{MemoryStore, StoreError, VideoStore};

pub const BUCKET: &str = "test-bucket";

/// Stands in for ffmpeg: the "remuxed" file is a byte copy of the input.
#[derive(Default)]
pub struct CopyRemuxer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux_fast_start(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(input, output)
            .await
            .map_err(|e| ToolError::InvalidOutput(e.to_string()))?;
        Ok(())
    }
}

/// Writes a truncated output file, then reports a non-zero exit.
pub struct FailingRemuxer;

#[async_trait]
impl Remuxer for FailingRemuxer {
    async fn remux_fast_start(&self, _input: &Path, output: &Path) -> Result<(), ToolError> {
        tokio::fs::write(output, b"partial")
            .await
            .map_err(|e| ToolError::InvalidOutput(e.to_string()))?;
        Err(ToolError::Exit {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "moov atom not found".to_string(),
        })
    }
}

pub struct FixedProber(pub Dimensions);

#[async_trait]
impl Prober for FixedProber {
    async fn probe_dimensions(&self, _path: &Path) -> Result<Dimensions, ToolError> {
        Ok(self.0)
    }
}

pub struct FailingProber;

#[async_trait]
impl Prober for FailingProber {
    async fn probe_dimensions(&self, _path: &Path) -> Result<Dimensions, ToolError> {
        Err(ToolError::NoVideoStream)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Object store held in memory. Presigned URLs are deterministic strings.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    deleted: Mutex<Vec<(String, String)>>,
    pub fail_puts: AtomicBool,
    pub fail_presign: AtomicBool,
}

impl MemoryObjectStore {
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody,
    ) -> Result<(), ObjectStoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Put {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let data = match body {
            ObjectBody::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| ObjectStoreError::Body(e.to_string()))?,
            ObjectBody::Bytes(bytes) => bytes.to_vec(),
        };

        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Presign {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "no credentials".to_string(),
            });
        }
        Ok(format!(
            "https://signed.test/{}/{}?expires={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        self.deleted
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingReconciler {
    pub orphans: Mutex<Vec<ObjectReference>>,
}

#[async_trait]
impl Reconciler for RecordingReconciler {
    async fn orphaned(&self, reference: &ObjectReference, _cause: &IngestError) {
        self.orphans.lock().unwrap().push(reference.clone());
    }
}

/// Reads through to a [`MemoryStore`] but refuses every update.
pub struct ReadOnlyStore(pub Arc<MemoryStore>);

#[async_trait]
impl VideoStore for ReadOnlyStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        self.0.get_video(id).await
    }

    async fn update_video(&self, _video: &Video) -> Result<(), StoreError> {
        Err(StoreError::Database("connection reset by peer".to_string()))
    }

    async fn create_video(&self, video: NewVideo) -> Result<Video, StoreError> {
        self.0.create_video(video).await
    }

    async fn list_videos(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Video>, u64), StoreError> {
        self.0.list_videos(user_id, page, page_size).await
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError> {
        self.0.delete_video(id).await
    }
}

/// Every call fails, as if the database were down.
pub struct UnreachableStore;

#[async_trait]
impl VideoStore for UnreachableStore {
    async fn get_video(&self, _id: Uuid) -> Result<Option<Video>, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }

    async fn update_video(&self, _video: &Video) -> Result<(), StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }

    async fn create_video(&self, _video: NewVideo) -> Result<Video, StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }

    async fn list_videos(
        &self,
        _user_id: Uuid,
        _page: u64,
        _page_size: u64,
    ) -> Result<(Vec<Video>, u64), StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }

    async fn delete_video(&self, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Database("connection refused".to_string()))
    }
}

pub fn landscape() -> Dimensions {
    Dimensions {
        width: 1920,
        height: 1080,
    }
}

/// A pipeline wired to in-memory collaborators and a private staging dir.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub reconciler: Arc<RecordingReconciler>,
    pub staging: TempDir,
    pub pipeline: IngestPipeline,
}

pub struct HarnessBuilder {
    remuxer: Arc<dyn Remuxer>,
    prober: Arc<dyn Prober>,
    max_upload_bytes: u64,
    read_only_store: bool,
    unreachable_store: bool,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            remuxer: Arc::new(CopyRemuxer::default()),
            prober: Arc::new(FixedProber(landscape())),
            max_upload_bytes: 1 << 20,
            read_only_store: false,
            unreachable_store: false,
        }
    }
}

impl HarnessBuilder {
    pub fn remuxer(mut self, remuxer: Arc<dyn Remuxer>) -> Self {
        self.remuxer = remuxer;
        self
    }

    pub fn prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub fn max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn read_only_store(mut self) -> Self {
        self.read_only_store = true;
        self
    }

    pub fn unreachable_store(mut self) -> Self {
        self.unreachable_store = true;
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let objects = Arc::new(MemoryObjectStore::default());
        let reconciler = Arc::new(RecordingReconciler::default());
        let staging = tempfile::tempdir().unwrap();

        let videos: Arc<dyn VideoStore> = if self.unreachable_store {
            Arc::new(UnreachableStore)
        } else if self.read_only_store {
            Arc::new(ReadOnlyStore(store.clone()))
        } else {
            store.clone()
        };

        let pipeline = IngestPipeline::new(
            videos,
            objects.clone(),
            self.remuxer,
            self.prober,
            IngestSettings {
                bucket: BUCKET.to_string(),
                staging_dir: staging.path().to_path_buf(),
                max_upload_bytes: self.max_upload_bytes,
            },
        )
        .with_reconciler(reconciler.clone());

        Harness {
            store,
            objects,
            reconciler,
            staging,
            pipeline,
        }
    }
}

impl Harness {
    pub async fn seed_video(&self, owner: Uuid) -> Video {
        self.store
            .create_video(NewVideo {
                user_id: owner,
                title: "Boat trip".to_string(),
                description: "Sunset over the harbour".to_string(),
            })
            .await
            .unwrap()
    }

    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }
}
