use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{feedback::FeedbackContent, FeedbackModel};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::feedback::FeedbackService;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: i32,
    pub venue_id: i32,
    #[serde(flatten)]
    pub content: FeedbackContent,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<FeedbackModel> for FeedbackResponse {
    type Error = AppError;

    fn try_from(f: FeedbackModel) -> Result<Self, Self::Error> {
        let content = FeedbackContent::try_from(&f)?;
        Ok(Self {
            id: f.id,
            venue_id: f.venue_id,
            content,
            status: f.status,
            created_at: f.created_at.to_string(),
            updated_at: f.updated_at.to_string(),
        })
    }
}

pub(crate) fn to_responses(rows: Vec<FeedbackModel>) -> AppResult<Vec<FeedbackResponse>> {
    rows.into_iter().map(FeedbackResponse::try_from).collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/venues/{id}/feedback",
    params(
        ("id" = i32, Path, description = "Venue ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Active feedback, newest first", body = PaginatedResponse<FeedbackResponse>),
    ),
    tag = "feedback"
)]
pub async fn list_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Path(venue_id): Path<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let (rows, total) = FeedbackService::new(db)
        .list_for_venue(venue_id, page, per_page)
        .await?;
    let items = to_responses(rows)?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/venues/{id}/feedback",
    params(("id" = i32, Path, description = "Venue ID")),
    request_body = FeedbackContent,
    responses(
        (status = 200, description = "Feedback created", body = FeedbackResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Venue not found", body = AppError),
    ),
    security(("jwt_token" = [])),
    tag = "feedback"
)]
pub async fn create_feedback(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(venue_id): Path<i32>,
    Json(payload): Json<FeedbackContent>,
) -> AppResult<impl IntoResponse> {
    let content = payload.sanitized();
    let row = FeedbackService::new(db)
        .create(venue_id, auth_user.user_id, content)
        .await?;

    tracing::info!(feedback_id = row.id, venue_id, kind = %row.kind, "Feedback created");
    Ok(ApiResponse::ok(FeedbackResponse::try_from(row)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/feedback/{id}",
    params(("id" = i32, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback removed", body = FeedbackResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Feedback not found", body = AppError),
        (status = 409, description = "Feedback is not active", body = AppError),
    ),
    security(("jwt_token" = [])),
    tag = "feedback"
)]
pub async fn delete_feedback(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let row = FeedbackService::new(db)
        .delete_own(id, auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(FeedbackResponse::try_from(row)?))
}
