use crate::{
    error::AppResult,
    models::{
        feedback::{self, FeedbackKind},
        photo, submission, Feedback, Photo, Profile, Submission, Venue,
    },
    services::moderation::{FeedbackStatus, PhotoStatus, SubmissionStatus},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub total_venues: u64,
    pub geocoded_venues: u64,
    pub pending_submissions: u64,
    pub active_feedback: u64,
    pub open_corrections: u64,
    pub hidden_feedback: u64,
    pub active_photos: u64,
    pub hidden_photos: u64,
    pub profiles: u64,
    pub feedback_today: u64,
}

pub struct AdminService {
    db: DatabaseConnection,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self) -> AppResult<AdminStats> {
        use crate::models::venue;

        let total_venues = Venue::find().count(&self.db).await?;
        let geocoded_venues = Venue::find()
            .filter(venue::Column::Latitude.is_not_null())
            .filter(venue::Column::Longitude.is_not_null())
            .count(&self.db)
            .await?;

        let pending_submissions = Submission::find()
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending.as_str()))
            .count(&self.db)
            .await?;

        let active_feedback = Feedback::find()
            .filter(feedback::Column::Status.eq(FeedbackStatus::Active.as_str()))
            .count(&self.db)
            .await?;
        let open_corrections = Feedback::find()
            .filter(feedback::Column::Status.eq(FeedbackStatus::Active.as_str()))
            .filter(feedback::Column::Kind.eq(FeedbackKind::Correction.as_str()))
            .count(&self.db)
            .await?;
        let hidden_feedback = Feedback::find()
            .filter(feedback::Column::Status.eq(FeedbackStatus::Hidden.as_str()))
            .count(&self.db)
            .await?;

        let active_photos = Photo::find()
            .filter(photo::Column::Status.eq(PhotoStatus::Active.as_str()))
            .count(&self.db)
            .await?;
        let hidden_photos = Photo::find()
            .filter(photo::Column::Status.eq(PhotoStatus::Hidden.as_str()))
            .count(&self.db)
            .await?;

        let profiles = Profile::find().count(&self.db).await?;

        let today_start = chrono::Utc::now()
            .naive_utc()
            .date()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default();
        let feedback_today = Feedback::find()
            .filter(feedback::Column::CreatedAt.gte(today_start))
            .count(&self.db)
            .await?;

        Ok(AdminStats {
            total_venues,
            geocoded_venues,
            pending_submissions,
            active_feedback,
            open_corrections,
            hidden_feedback,
            active_photos,
            hidden_photos,
            profiles,
            feedback_today,
        })
    }
}
