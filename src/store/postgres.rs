use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entities::{user, video};
use crate::models::user::User;
use crate::models::video::{NewVideo, Video};
use crate::store::{StoreError, UserStore, VideoStore};

#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SeaOrmStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let model = video::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Video::from))
    }

    async fn update_video(&self, v: &Video) -> Result<(), StoreError> {
        let active = video::ActiveModel {
            id: Set(v.id),
            user_id: Set(v.user_id),
            title: Set(v.title.clone()),
            description: Set(v.description.clone()),
            thumbnail_ref: Set(v.thumbnail_ref.clone()),
            video_ref: Set(v.video_ref.clone()),
            created_at: Set(v.created_at),
            updated_at: Set(v.updated_at),
        };
        active.update(&self.db).await?;
        Ok(())
    }

    async fn create_video(&self, new: NewVideo) -> Result<Video, StoreError> {
        let now = Utc::now().naive_utc();
        let active = video::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            title: Set(new.title),
            description: Set(new.description),
            thumbnail_ref: Set(None),
            video_ref: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active.insert(&self.db).await?;
        Ok(model.into())
    }

    async fn list_videos(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<Video>, u64), StoreError> {
        let paginator = video::Entity::find()
            .filter(video::Column::UserId.eq(user_id))
            .order_by_desc(video::Column::CreatedAt)
            .paginate(&self.db, page_size.max(1));

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((models.into_iter().map(Video::from).collect(), total))
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError> {
        let result = video::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for SeaOrmStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let active = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password: Set(password_hash.to_string()),
            created_at: Set(Utc::now().naive_utc()),
        };

        match active.insert(&self.db).await {
            Ok(model) => Ok(model.into()),
            Err(err) => Err(map_unique_violation(err, email)),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(User::from))
    }
}

fn map_unique_violation(err: DbErr, email: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StoreError::Conflict(format!("{} is already registered", email))
        }
        _ => err.into(),
    }
}
