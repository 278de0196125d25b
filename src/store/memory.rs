use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::user::User;
use crate::models::video::{NewVideo, Video};
use crate::store::{StoreError, UserStore, VideoStore};

/// In-process metadata store.
///
/// Backs the test suites. Owned by whoever constructs it (wrapped in an
/// `Arc` in the app state); there is no shared global instance.
#[derive(Default)]
pub struct MemoryStore {
    videos: RwLock<HashMap<Uuid, Video>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a record as-is.
    pub async fn insert_video(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update_video(&self, video: &Video) -> Result<(), StoreError> {
        let mut videos = self.videos.write().await;
        let slot = videos.get_mut(&video.id).ok_or(StoreError::NotFound)?;
        *slot = video.clone();
        Ok(())
    }

    async fn create_video(&self, video: NewVideo) -> Result<Video, StoreError> {
        let now = Utc::now().naive_utc();
        let video = Video {
            id: Uuid::new_v4(),
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_ref: None,
            video_ref: None,
            created_at: now,
            updated_at: now,
        };
        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn list_videos(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Video>, u64), StoreError> {
        let videos = self.videos.read().await;
        let mut owned: Vec<Video> = videos
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = owned.len() as u64;
        let skip = page.saturating_sub(1).saturating_mul(page_size) as usize;
        let data = owned
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();
        Ok((data, total))
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError> {
        self.videos
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("{} is already registered", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}
