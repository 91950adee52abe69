use crate::{
    error::{AppError, AppResult},
    models::{favorite, feedback, photo, profile, Favorite, Feedback, Photo, Profile, ProfileModel},
    services::{
        moderation::{FeedbackStatus, PhotoStatus},
        storage::{self, ObjectStorage},
    },
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

pub struct ProfileService {
    db: DatabaseConnection,
}

impl ProfileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, user_id: Uuid) -> AppResult<Option<ProfileModel>> {
        Ok(Profile::find_by_id(user_id).one(&self.db).await?)
    }

    /// Profiles are created lazily the first time a user touches them.
    pub async fn get_or_create(&self, user_id: Uuid) -> AppResult<ProfileModel> {
        if let Some(existing) = self.find(user_id).await? {
            return Ok(existing);
        }

        let now = chrono::Utc::now().naive_utc();
        let model = profile::ActiveModel {
            user_id: Set(user_id),
            display_name: Set(None),
            avatar_key: Set(None),
            home_suburb: Set(None),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Two first requests can race here; the loser re-reads.
        Profile::insert(model)
            .on_conflict(
                OnConflict::column(profile::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        self.find(user_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Profile {} missing after insert", user_id)))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        display_name: Option<String>,
        home_suburb: Option<String>,
    ) -> AppResult<ProfileModel> {
        let current = self.get_or_create(user_id).await?;
        let mut active = current.into_active_model();
        active.display_name = Set(display_name);
        active.home_suburb = Set(home_suburb);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Store a new avatar and drop the previous one.
    pub async fn set_avatar(
        &self,
        storage: &dyn ObjectStorage,
        user_id: Uuid,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<ProfileModel> {
        let current = self.get_or_create(user_id).await?;
        let key = storage::image_key("avatars", data, content_type)?;
        storage.put(&key, data, content_type).await?;

        let previous = current.avatar_key.clone();
        let mut active = current.into_active_model();
        active.avatar_key = Set(Some(key.clone()));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = match active.update(&self.db).await {
            Ok(updated) => updated,
            Err(e) => {
                storage::delete_best_effort(storage, &key).await;
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            storage::delete_best_effort(storage, &old).await;
        }
        Ok(updated)
    }

    /// Anonymize the profile, hide the user's feedback and photos and drop
    /// their favorites. The hosted auth account itself is not touched.
    pub async fn delete_account(
        &self,
        storage: &dyn ObjectStorage,
        user_id: Uuid,
    ) -> AppResult<()> {
        let current = self.get_or_create(user_id).await?;
        let avatar = current.avatar_key.clone();
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;

        let mut active = current.into_active_model();
        active.display_name = Set(None);
        active.avatar_key = Set(None);
        active.home_suburb = Set(None);
        active.is_deleted = Set(true);
        active.updated_at = Set(now);
        active.update(&txn).await?;

        let hidden_feedback = Feedback::update_many()
            .col_expr(
                feedback::Column::Status,
                Expr::value(FeedbackStatus::Hidden.as_str()),
            )
            .col_expr(feedback::Column::UpdatedAt, Expr::value(now))
            .filter(feedback::Column::UserId.eq(user_id))
            .filter(feedback::Column::Status.eq(FeedbackStatus::Active.as_str()))
            .exec(&txn)
            .await?;

        let hidden_photos = Photo::update_many()
            .col_expr(photo::Column::Status, Expr::value(PhotoStatus::Hidden.as_str()))
            .filter(photo::Column::UserId.eq(user_id))
            .filter(photo::Column::Status.eq(PhotoStatus::Active.as_str()))
            .exec(&txn)
            .await?;

        Favorite::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        if let Some(key) = avatar {
            storage::delete_best_effort(storage, &key).await;
        }

        tracing::info!(
            user_id = %user_id,
            feedback = hidden_feedback.rows_affected,
            photos = hidden_photos.rows_affected,
            "Account deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::StorageError;
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::sync::Mutex;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[derive(Default)]
    struct RecordingStorage {
        puts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn put(&self, key: &str, _: &[u8], _: &str) -> Result<(), StorageError> {
            self.puts.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.deletes.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/media/{key}")
        }
    }

    fn profile_row(user_id: Uuid, avatar_key: Option<&str>) -> ProfileModel {
        let now = chrono::Utc::now().naive_utc();
        ProfileModel {
            user_id,
            display_name: None,
            avatar_key: avatar_key.map(str::to_string),
            home_suburb: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn failed_avatar_update_removes_new_object() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![profile_row(user_id, Some("avatars/old.png"))]])
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let storage = RecordingStorage::default();

        let result = ProfileService::new(db)
            .set_avatar(&storage, user_id, PNG, "image/png")
            .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        let puts = storage.puts.lock().unwrap().clone();
        assert_eq!(puts.len(), 1);
        // Only the fresh upload is removed; the old avatar stays referenced.
        assert_eq!(*storage.deletes.lock().unwrap(), puts);
    }

    #[tokio::test]
    async fn new_avatar_replaces_previous_object() {
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![profile_row(user_id, Some("avatars/old.png"))],
                vec![profile_row(user_id, Some("avatars/new.png"))],
            ])
            .into_connection();
        let storage = RecordingStorage::default();

        let updated = ProfileService::new(db)
            .set_avatar(&storage, user_id, PNG, "image/png")
            .await
            .unwrap();

        assert_eq!(updated.avatar_key.as_deref(), Some("avatars/new.png"));
        assert_eq!(*storage.deletes.lock().unwrap(), vec!["avatars/old.png".to_string()]);
    }
}
