use crate::{
    error::{AppError, AppResult},
    geo::{Coordinate, Located},
    models::{
        submission,
        venue::{self, CourtType},
        Submission, SubmissionModel, VenueModel,
    },
    services::{
        moderation::{SubmissionAction, SubmissionStatus},
        places::PlacesService,
        venue::unique_slug,
    },
    utils::slug::venue_slug,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use uuid::Uuid;

/// Sanitized submission fields, ready to store.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub name: String,
    pub suburb: String,
    pub region: String,
    pub address: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub court_type: CourtType,
    pub surface: Option<String>,
    pub court_count: Option<i32>,
    pub features: Vec<String>,
    pub notes: Option<String>,
}

pub struct SubmissionService {
    db: DatabaseConnection,
}

impl SubmissionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        submitted_by: Option<Uuid>,
        input: NewSubmission,
    ) -> AppResult<SubmissionModel> {
        let now = chrono::Utc::now().naive_utc();
        let model = submission::ActiveModel {
            name: Set(input.name),
            suburb: Set(input.suburb),
            region: Set(input.region),
            address: Set(input.address),
            latitude: Set(input.coordinate.map(|c| c.lat)),
            longitude: Set(input.coordinate.map(|c| c.lng)),
            court_type: Set(input.court_type.as_str().to_string()),
            surface: Set(input.surface),
            court_count: Set(input.court_count),
            features: Set(serde_json::json!(input.features)),
            notes: Set(input.notes),
            submitted_by: Set(submitted_by),
            status: Set(SubmissionStatus::Pending.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<SubmissionModel> {
        Submission::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn list(
        &self,
        status: Option<SubmissionStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<SubmissionModel>, u64)> {
        let mut query = Submission::find().order_by_desc(submission::Column::CreatedAt);
        if let Some(s) = status {
            query = query.filter(submission::Column::Status.eq(s.as_str()));
        }

        let paginator = query.paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    fn check_transition(model: &SubmissionModel, action: SubmissionAction) -> AppResult<()> {
        let current: SubmissionStatus = model.status.parse()?;
        current.apply(action)?;
        Ok(())
    }

    /// Approve a pending submission and create its venue.
    ///
    /// The pending -> approved claim is a conditional update inside the same
    /// transaction as the venue insert, so of two concurrent approvals exactly
    /// one creates a venue and the other gets a conflict.
    pub async fn approve(
        &self,
        id: i32,
        places: &PlacesService,
    ) -> AppResult<(SubmissionModel, VenueModel)> {
        let pending = self.get_by_id(id).await?;
        Self::check_transition(&pending, SubmissionAction::Approve)?;

        // Geocoding happens before the transaction so no lock is held across
        // the network call.
        let coordinate = match pending.coordinate() {
            Some(c) => Some(c),
            None => places.geocode(&geocode_query(&pending)).await,
        };
        if coordinate.is_none() {
            tracing::info!(submission_id = id, "Approving submission without coordinates");
        }

        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let claimed = Submission::update_many()
            .col_expr(
                submission::Column::Status,
                Expr::value(SubmissionStatus::Approved.as_str()),
            )
            .col_expr(submission::Column::ReviewedAt, Expr::value(now))
            .filter(submission::Column::Id.eq(id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending.as_str()))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Submission has already been reviewed".to_string(),
            ));
        }

        let slug = unique_slug(&txn, &venue_slug(&pending.name, &pending.suburb)).await?;
        let venue = venue::ActiveModel {
            slug: Set(slug),
            name: Set(pending.name.clone()),
            suburb: Set(pending.suburb.clone()),
            region: Set(pending.region.clone()),
            address: Set(pending.address.clone()),
            latitude: Set(coordinate.map(|c| c.lat)),
            longitude: Set(coordinate.map(|c| c.lng)),
            court_type: Set(pending.court_type.clone()),
            surface: Set(pending.surface.clone()),
            court_count: Set(pending.court_count),
            features: Set(pending.features.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Submission::update_many()
            .col_expr(submission::Column::VenueId, Expr::value(venue.id))
            .filter(submission::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(submission_id = id, venue_id = venue.id, slug = %venue.slug, "Submission approved");

        let approved = self.get_by_id(id).await?;
        Ok((approved, venue))
    }

    pub async fn reject(&self, id: i32, reason: Option<String>) -> AppResult<SubmissionModel> {
        let pending = self.get_by_id(id).await?;
        Self::check_transition(&pending, SubmissionAction::Reject)?;

        let now = chrono::Utc::now().naive_utc();
        let claimed = Submission::update_many()
            .col_expr(
                submission::Column::Status,
                Expr::value(SubmissionStatus::Rejected.as_str()),
            )
            .col_expr(submission::Column::RejectionReason, Expr::value(reason))
            .col_expr(submission::Column::ReviewedAt, Expr::value(now))
            .filter(submission::Column::Id.eq(id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Submission has already been reviewed".to_string(),
            ));
        }

        self.get_by_id(id).await
    }
}

fn geocode_query(s: &SubmissionModel) -> String {
    match &s.address {
        Some(address) => format!("{}, {} {}", address, s.suburb, s.region),
        None => format!("{}, {} {}", s.name, s.suburb, s.region),
    }
}
