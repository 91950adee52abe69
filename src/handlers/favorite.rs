use crate::error::AppResult;
use crate::handlers::venue::{with_ratings, VenueResponse};
use crate::middleware::AuthUser;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::{favorite::FavoriteService, venue::VenueService};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteToggleResponse {
    pub venue_id: i32,
    pub favorited: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/venues/{id}/favorite",
    params(("id" = i32, Path, description = "Venue ID")),
    responses(
        (status = 200, description = "Favorite toggled", body = FavoriteToggleResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 404, description = "Venue not found", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "favorites"
)]
pub async fn toggle_favorite(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(venue_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let favorited = FavoriteService::new(db)
        .toggle(auth_user.user_id, venue_id)
        .await?;
    Ok(ApiResponse::ok(FavoriteToggleResponse {
        venue_id,
        favorited,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Favorited venues, most recent first", body = PaginatedResponse<VenueResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "favorites"
)]
pub async fn list_favorites(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let (venues, total) = FavoriteService::new(db.clone())
        .list(auth_user.user_id, page, per_page)
        .await?;
    let items = with_ratings(&VenueService::new(db), venues).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
