use crate::{
    error::{AppError, AppResult},
    models::{photo, Photo, PhotoModel, Venue},
    services::{
        moderation::{PhotoAction, PhotoStatus},
        storage::{self, ObjectStorage},
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

pub struct PhotoService {
    db: DatabaseConnection,
}

impl PhotoService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn upload(
        &self,
        storage: &dyn ObjectStorage,
        venue_id: i32,
        user_id: Uuid,
        data: &[u8],
        content_type: &str,
        caption: Option<String>,
    ) -> AppResult<PhotoModel> {
        Venue::find_by_id(venue_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let key = storage::image_key(&format!("photos/{}", venue_id), data, content_type)?;
        storage.put(&key, data, content_type).await?;

        let model = photo::ActiveModel {
            venue_id: Set(venue_id),
            user_id: Set(user_id),
            storage_key: Set(key.clone()),
            caption: Set(caption),
            status: Set(PhotoStatus::Active.as_str().to_string()),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                storage::delete_best_effort(storage, &key).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<PhotoModel> {
        Photo::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn active_for_venue(&self, venue_id: i32) -> AppResult<Vec<PhotoModel>> {
        Ok(Photo::find()
            .filter(photo::Column::VenueId.eq(venue_id))
            .filter(photo::Column::Status.eq(PhotoStatus::Active.as_str()))
            .order_by_desc(photo::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn list_admin(
        &self,
        status: Option<PhotoStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<PhotoModel>, u64)> {
        let mut query = Photo::find().order_by_desc(photo::Column::CreatedAt);
        if let Some(s) = status {
            query = query.filter(photo::Column::Status.eq(s.as_str()));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn transition(&self, row: PhotoModel, action: PhotoAction) -> AppResult<PhotoModel> {
        let current: PhotoStatus = row.status.parse()?;
        let next = current.apply(action)?;

        let mut active = row.into_active_model();
        active.status = Set(next.as_str().to_string());
        Ok(active.update(&self.db).await?)
    }

    /// Uploader removal hides the photo; the stored object stays until an
    /// admin deletes it.
    pub async fn delete_own(&self, id: i32, user_id: Uuid) -> AppResult<PhotoModel> {
        let row = self.get_by_id(id).await?;
        if row.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        self.transition(row, PhotoAction::Hide).await
    }

    pub async fn moderate(&self, id: i32, action: PhotoAction) -> AppResult<PhotoModel> {
        let row = self.get_by_id(id).await?;
        let updated = self.transition(row, action).await?;
        tracing::info!(photo_id = id, action = action.as_str(), "Photo moderated");
        Ok(updated)
    }

    /// Remove the row, then the stored object. A storage failure is logged
    /// and does not fail the request.
    pub async fn hard_delete(&self, storage: &dyn ObjectStorage, id: i32) -> AppResult<()> {
        let row = self.get_by_id(id).await?;
        Photo::delete_by_id(row.id).exec(&self.db).await?;
        storage::delete_best_effort(storage, &row.storage_key).await;
        tracing::info!(photo_id = id, "Photo deleted");
        Ok(())
    }
}
