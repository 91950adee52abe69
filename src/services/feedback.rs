use crate::{
    error::{AppError, AppResult},
    models::{
        feedback::{self, FeedbackContent, FeedbackKind},
        Feedback, FeedbackModel, Venue,
    },
    services::moderation::{FeedbackAction, FeedbackStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

pub struct FeedbackService {
    db: DatabaseConnection,
}

impl FeedbackService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        venue_id: i32,
        user_id: Uuid,
        content: FeedbackContent,
    ) -> AppResult<FeedbackModel> {
        content.validate()?;

        Venue::find_by_id(venue_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        let (kind, rating, body, correction_type) = content.into_columns();
        let model = feedback::ActiveModel {
            venue_id: Set(venue_id),
            user_id: Set(user_id),
            kind: Set(kind),
            rating: Set(rating),
            body: Set(body),
            correction_type: Set(correction_type),
            status: Set(FeedbackStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<FeedbackModel> {
        Feedback::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Active feedback for a venue, newest first.
    pub async fn list_for_venue(
        &self,
        venue_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<FeedbackModel>, u64)> {
        let paginator = Feedback::find()
            .filter(feedback::Column::VenueId.eq(venue_id))
            .filter(feedback::Column::Status.eq(FeedbackStatus::Active.as_str()))
            .order_by_desc(feedback::Column::CreatedAt)
            .order_by_desc(feedback::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn list_admin(
        &self,
        status: Option<FeedbackStatus>,
        kind: Option<FeedbackKind>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<FeedbackModel>, u64)> {
        let mut query = Feedback::find()
            .order_by_desc(feedback::Column::CreatedAt)
            .order_by_desc(feedback::Column::Id);
        if let Some(s) = status {
            query = query.filter(feedback::Column::Status.eq(s.as_str()));
        }
        if let Some(k) = kind {
            query = query.filter(feedback::Column::Kind.eq(k.as_str()));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn transition(
        &self,
        row: FeedbackModel,
        action: FeedbackAction,
    ) -> AppResult<FeedbackModel> {
        let current: FeedbackStatus = row.status.parse()?;
        let next = current.apply(action)?;

        let mut active = row.into_active_model();
        active.status = Set(next.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Author removal. The row is hidden, not deleted.
    pub async fn delete_own(&self, id: i32, user_id: Uuid) -> AppResult<FeedbackModel> {
        let row = self.get_by_id(id).await?;
        if row.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        self.transition(row, FeedbackAction::Hide).await
    }

    pub async fn moderate(&self, id: i32, action: FeedbackAction) -> AppResult<FeedbackModel> {
        let row = self.get_by_id(id).await?;
        if action == FeedbackAction::Resolve && row.kind != FeedbackKind::Correction.as_str() {
            return Err(AppError::Validation(
                "Only corrections can be resolved".to_string(),
            ));
        }
        let updated = self.transition(row, action).await?;
        tracing::info!(feedback_id = id, action = action.as_str(), "Feedback moderated");
        Ok(updated)
    }

    pub async fn hard_delete(&self, id: i32) -> AppResult<()> {
        let result = Feedback::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!(feedback_id = id, "Feedback deleted");
        Ok(())
    }
}
