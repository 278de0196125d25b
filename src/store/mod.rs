//! Metadata store collaborators.
//!
//! The pipeline reads and writes video records only through [`VideoStore`];
//! the account routes go through [`UserStore`]. [`SeaOrmStore`] backs both
//! with Postgres, [`MemoryStore`] with an owned in-process map.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::User;
use crate::models::video::{NewVideo, Video};

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(_) | sea_orm::DbErr::RecordNotUpdated => {
                StoreError::NotFound
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, StoreError>;

    /// Replace a stored record. Fails with `NotFound` if the id is unknown.
    async fn update_video(&self, video: &Video) -> Result<(), StoreError>;

    async fn create_video(&self, video: NewVideo) -> Result<Video, StoreError>;

    /// One page of a user's videos, newest first, plus the total count.
    async fn list_videos(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Video>, u64), StoreError>;

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` if the email is already registered.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
