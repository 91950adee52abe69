use crate::config::admin::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{
    append_set_cookie,
    feedback::FeedbackResponse,
    photo::PhotoResponse,
    submission::SubmissionResponse,
    venue::VenueResponse,
};
use crate::models::feedback::FeedbackKind;
use crate::response::{page_params, ApiResponse, PaginatedResponse};
use crate::services::{
    admin::{AdminService, AdminStats},
    enrichment::EnrichmentService,
    feedback::FeedbackService,
    login_limiter::LoginLimiter,
    moderation::{FeedbackAction, FeedbackStatus, PhotoAction, PhotoStatus, SubmissionStatus},
    photo::PhotoService,
    places::PlacesService,
    storage::SharedStorage,
    submission::SubmissionService,
    venue::VenueService,
};
use crate::utils::{
    admin_token::{password_matches, sign_session},
    cookie::{build_clear_cookie, build_session_cookie, ADMIN_SESSION_COOKIE},
    sanitize_optional,
};
use axum::{
    extract::{ConnectInfo, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1, max = 200))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    /// Session expiry, unix seconds
    pub expires_at: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectSubmissionRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub submission: SubmissionResponse,
    pub venue: VenueResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminFeedbackResponse {
    #[serde(flatten)]
    pub feedback: FeedbackResponse,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminPhotoResponse {
    #[serde(flatten)]
    pub photo: PhotoResponse,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrichResponse {
    pub venue: VenueResponse,
    /// Resolved media URLs for the stored photo references
    pub photo_urls: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModerationListQuery {
    pub status: Option<String>,
    /// Feedback only: review, comment or correction
    pub kind: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ModerationListQuery {
    fn page(&self) -> (u64, u64) {
        page_params(self.page, self.per_page)
    }
}

/// Parse an optional query filter, reporting unknown values as a client error.
fn parse_filter<T: FromStr>(raw: Option<&str>, field: &str) -> AppResult<Option<T>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("Unknown {} '{}'", field, s))),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = AdminLoginResponse),
        (status = 401, description = "Wrong password", body = AppError),
        (status = 429, description = "Too many failed attempts", body = AppError),
    ),
    tag = "admin"
)]
pub async fn login(
    Extension(config): Extension<Arc<AdminConfig>>,
    Extension(limiter): Extension<LoginLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let ip = addr.ip();
    limiter.check(ip)?;

    if !password_matches(&config.session_secret, &config.password, &payload.password)? {
        limiter.record_failure(ip);
        return Err(AppError::Unauthorized);
    }
    limiter.reset(ip);

    let expires_at = chrono::Utc::now().timestamp() + config.session_ttl_seconds as i64;
    let token = sign_session(&config.session_secret, expires_at)?;
    tracing::info!(ip = %ip, "Admin signed in");

    let mut response = ApiResponse::ok(AdminLoginResponse { expires_at }).into_response();
    append_set_cookie(
        &mut response,
        &build_session_cookie(ADMIN_SESSION_COOKIE, &token, config.session_ttl_seconds),
    )?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/logout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "admin"
)]
pub async fn logout() -> AppResult<impl IntoResponse> {
    let mut response =
        ApiResponse::<()>::with_message((), "Signed out".to_string()).into_response();
    append_set_cookie(&mut response, &build_clear_cookie(ADMIN_SESSION_COOKIE))?;
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("admin_session" = [])),
    responses(
        (status = 200, description = "Moderation dashboard counts", body = AdminStats),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let stats = AdminService::new(db).get_stats().await?;
    Ok(ApiResponse::ok(stats))
}

// Submissions

#[utoipa::path(
    get,
    path = "/api/v1/admin/submissions",
    security(("admin_session" = [])),
    params(
        ("status" = Option<String>, Query, description = "pending, approved or rejected"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Submissions, newest first", body = PaginatedResponse<SubmissionResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_submissions(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ModerationListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.page();
    let status = parse_filter::<SubmissionStatus>(params.status.as_deref(), "status")?;

    let (rows, total) = SubmissionService::new(db)
        .list(status, page, per_page)
        .await?;
    let items = rows.into_iter().map(SubmissionResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/submissions/{id}/approve",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission approved and venue created", body = ApprovalResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Submission not found", body = AppError),
        (status = 409, description = "Submission already reviewed", body = AppError),
    ),
    tag = "admin"
)]
pub async fn approve_submission(
    Extension(db): Extension<DatabaseConnection>,
    Extension(places): Extension<PlacesService>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (submission, venue) = SubmissionService::new(db).approve(id, &places).await?;
    Ok(ApiResponse::ok(ApprovalResponse {
        submission: submission.into(),
        venue: VenueResponse::new(venue, None),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/submissions/{id}/reject",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Submission ID")),
    request_body = RejectSubmissionRequest,
    responses(
        (status = 200, description = "Submission rejected", body = SubmissionResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Submission not found", body = AppError),
        (status = 409, description = "Submission already reviewed", body = AppError),
    ),
    tag = "admin"
)]
pub async fn reject_submission(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<RejectSubmissionRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let reason = sanitize_optional(payload.reason.as_deref());

    let submission = SubmissionService::new(db).reject(id, reason).await?;
    tracing::info!(submission_id = id, "Submission rejected");
    Ok(ApiResponse::ok(SubmissionResponse::from(submission)))
}

// Feedback

#[utoipa::path(
    get,
    path = "/api/v1/admin/feedback",
    security(("admin_session" = [])),
    params(
        ("status" = Option<String>, Query, description = "active, hidden or resolved"),
        ("kind" = Option<String>, Query, description = "review, comment or correction"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Feedback, newest first", body = PaginatedResponse<AdminFeedbackResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ModerationListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.page();
    let status = parse_filter::<FeedbackStatus>(params.status.as_deref(), "status")?;
    let kind = parse_filter::<FeedbackKind>(params.kind.as_deref(), "kind")?;

    let (rows, total) = FeedbackService::new(db)
        .list_admin(status, kind, page, per_page)
        .await?;
    let items = rows
        .into_iter()
        .map(|row| {
            let user_id = row.user_id;
            FeedbackResponse::try_from(row).map(|feedback| AdminFeedbackResponse {
                feedback,
                user_id,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

async fn moderate_feedback(
    db: DatabaseConnection,
    id: i32,
    action: FeedbackAction,
) -> AppResult<ApiResponse<FeedbackResponse>> {
    let row = FeedbackService::new(db).moderate(id, action).await?;
    Ok(ApiResponse::ok(FeedbackResponse::try_from(row)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/feedback/{id}/hide",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback hidden", body = FeedbackResponse),
        (status = 404, description = "Feedback not found", body = AppError),
        (status = 409, description = "Feedback is not active", body = AppError),
    ),
    tag = "admin"
)]
pub async fn hide_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    moderate_feedback(db, id, FeedbackAction::Hide).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/feedback/{id}/restore",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback visible again", body = FeedbackResponse),
        (status = 404, description = "Feedback not found", body = AppError),
        (status = 409, description = "Feedback is not hidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn restore_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    moderate_feedback(db, id, FeedbackAction::Restore).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/feedback/{id}/resolve",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Correction resolved", body = FeedbackResponse),
        (status = 400, description = "Not a correction", body = AppError),
        (status = 404, description = "Feedback not found", body = AppError),
        (status = 409, description = "Correction is not active", body = AppError),
    ),
    tag = "admin"
)]
pub async fn resolve_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    moderate_feedback(db, id, FeedbackAction::Resolve).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/feedback/{id}/delete",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback permanently deleted"),
        (status = 404, description = "Feedback not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn delete_feedback(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    FeedbackService::new(db).hard_delete(id).await?;
    tracing::info!(feedback_id = id, "Feedback deleted");
    Ok(ApiResponse::<()>::with_message((), "Feedback deleted".to_string()))
}

// Photos

#[utoipa::path(
    get,
    path = "/api/v1/admin/photos",
    security(("admin_session" = [])),
    params(
        ("status" = Option<String>, Query, description = "active or hidden"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Photos, newest first", body = PaginatedResponse<AdminPhotoResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_photos(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    Query(params): Query<ModerationListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.page();
    let status = parse_filter::<PhotoStatus>(params.status.as_deref(), "status")?;

    let (rows, total) = PhotoService::new(db)
        .list_admin(status, page, per_page)
        .await?;
    let items = rows
        .into_iter()
        .map(|row| {
            let user_id = row.user_id;
            AdminPhotoResponse {
                photo: PhotoResponse::new(row, storage.as_ref()),
                user_id,
            }
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

async fn moderate_photo(
    db: DatabaseConnection,
    storage: SharedStorage,
    id: i32,
    action: PhotoAction,
) -> AppResult<ApiResponse<PhotoResponse>> {
    let row = PhotoService::new(db).moderate(id, action).await?;
    Ok(ApiResponse::ok(PhotoResponse::new(row, storage.as_ref())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/photos/{id}/hide",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo hidden", body = PhotoResponse),
        (status = 404, description = "Photo not found", body = AppError),
        (status = 409, description = "Photo already hidden", body = AppError),
    ),
    tag = "admin"
)]
pub async fn hide_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    moderate_photo(db, storage, id, PhotoAction::Hide).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/photos/{id}/show",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo visible again", body = PhotoResponse),
        (status = 404, description = "Photo not found", body = AppError),
        (status = 409, description = "Photo already visible", body = AppError),
    ),
    tag = "admin"
)]
pub async fn show_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    moderate_photo(db, storage, id, PhotoAction::Show).await
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/photos/{id}/delete",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo deleted; storage cleanup is best effort"),
        (status = 404, description = "Photo not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn delete_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    PhotoService::new(db)
        .hard_delete(storage.as_ref(), id)
        .await?;
    Ok(ApiResponse::<()>::with_message((), "Photo deleted".to_string()))
}

// Venues

#[utoipa::path(
    post,
    path = "/api/v1/admin/venues/{id}/enrich",
    security(("admin_session" = [])),
    params(("id" = i32, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Venue enriched from the places API", body = EnrichResponse),
        (status = 400, description = "No matching place", body = AppError),
        (status = 404, description = "Venue not found", body = AppError),
        (status = 502, description = "Places API unavailable", body = AppError),
    ),
    tag = "admin"
)]
pub async fn enrich_venue(
    Extension(db): Extension<DatabaseConnection>,
    Extension(places): Extension<PlacesService>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = EnrichmentService::new(db.clone());
    let (venue, photo_urls) = service.enrich(&places, id).await?;
    let rating = VenueService::new(db)
        .community_rating(venue.id)
        .await?;

    Ok(ApiResponse::ok(EnrichResponse {
        venue: VenueResponse::new(venue, rating),
        photo_urls,
    }))
}
