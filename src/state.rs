use std::sync::Arc;

use crate::services::ingest::IngestPipeline;
use crate::services::object_store::ObjectStore;
use crate::services::signer::UrlSigner;
use crate::store::{UserStore, VideoStore};

/// Shared handler state. Cloned per request; everything inside is `Arc`ed.
#[derive(Clone)]
pub struct AppState {
    pub videos: Arc<dyn VideoStore>,
    pub users: Arc<dyn UserStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub pipeline: Arc<IngestPipeline>,
    pub signer: UrlSigner,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        users: Arc<dyn UserStore>,
        objects: Arc<dyn ObjectStore>,
        pipeline: IngestPipeline,
        signer: UrlSigner,
        jwt_secret: &str,
    ) -> Self {
        Self {
            videos,
            users,
            objects,
            pipeline: Arc::new(pipeline),
            signer,
            jwt_secret: Arc::from(jwt_secret),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.pipeline.settings().max_upload_bytes
    }
}
