use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("failed to read upload body: {0}")]
    Body(String),

    #[error("put {bucket}/{key} failed: {message}")]
    Put {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("presign {bucket}/{key} failed: {message}")]
    Presign {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("delete {bucket}/{key} failed: {message}")]
    Delete {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Payload for [`ObjectStore::put_object`].
#[derive(Debug, Clone)]
pub enum ObjectBody {
    /// Streamed from a local file.
    File(PathBuf),
    Bytes(Bytes),
}

/// Remote durable storage.
///
/// Every call is all-or-nothing from the caller's point of view; no retries
/// or partial-upload resumption happen behind this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody,
    ) -> Result<(), ObjectStoreError>;

    /// A time-limited GET URL for the object.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;
}
