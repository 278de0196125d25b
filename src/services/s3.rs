use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::Config;
use crate::services::object_store::{ObjectBody, ObjectStore, ObjectStoreError};

#[derive(Clone)]
pub struct S3Service {
    client: Client,
}

impl S3Service {
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));

        // Explicit keys win; otherwise the default credential chain applies.
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "manual_config",
            ));
        }

        let shared = loader.load().await;
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.s3_endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Self {
            client: Client::from_conf(s3_config_builder.build()),
        }
    }

    /// Create the bucket if it is missing. Used at startup against
    /// S3-compatible development stores.
    pub async fn ensure_bucket_exists(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        tracing::info!(bucket, "bucket does not exist, attempting to create");
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Put {
                bucket: bucket.to_string(),
                key: String::new(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Service {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: ObjectBody,
    ) -> Result<(), ObjectStoreError> {
        let start = Instant::now();

        let body = match body {
            ObjectBody::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(|e| ObjectStoreError::Body(format!("{}: {}", path.display(), e)))?,
            ObjectBody::Bytes(bytes) => ByteStream::from(bytes),
        };

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(bucket, key, error = %message, "S3 upload failed");
                ObjectStoreError::Put {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message,
                }
            })?;

        tracing::info!(
            bucket,
            key,
            duration_ms = start.elapsed().as_millis() as u64,
            "S3 upload successful"
        );
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, ObjectStoreError> {
        let presign_error = |message: String| ObjectStoreError::Presign {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };

        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| presign_error(e.to_string()))?;

        let presigned_req = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(bucket, key, error = %message, "S3 presigning failed");
                presign_error(message)
            })?;

        Ok(presigned_req.uri().to_string())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Delete {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
