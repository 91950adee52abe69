use crate::error::{AppError, AppResult};
use crate::handlers::read_image_upload;
use crate::middleware::AuthUser;
use crate::models::PhotoModel;
use crate::response::ApiResponse;
use crate::services::{
    photo::PhotoService,
    storage::{ObjectStorage, SharedStorage},
};
use crate::utils::sanitize_optional;
use axum::{
    extract::{Multipart, Path},
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

const MAX_CAPTION_CHARS: usize = 200;

#[derive(Debug, Serialize, ToSchema)]
pub struct PhotoResponse {
    pub id: i32,
    pub venue_id: i32,
    pub url: String,
    pub caption: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl PhotoResponse {
    pub fn new(p: PhotoModel, storage: &dyn ObjectStorage) -> Self {
        Self {
            url: storage.public_url(&p.storage_key),
            id: p.id,
            venue_id: p.venue_id,
            caption: p.caption,
            status: p.status,
            created_at: p.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/venues/{id}/photos",
    params(("id" = i32, Path, description = "Venue ID")),
    request_body(content_type = "multipart/form-data", description = "Parts: file (jpeg, png or webp), caption"),
    responses(
        (status = 200, description = "Photo uploaded", body = PhotoResponse),
        (status = 400, description = "Invalid image", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Venue not found", body = AppError),
        (status = 413, description = "Image too large", body = AppError),
    ),
    security(("jwt_token" = [])),
    tag = "photos"
)]
pub async fn upload_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Path(venue_id): Path<i32>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = read_image_upload(multipart).await?;
    let caption = sanitize_optional(upload.caption.as_deref());
    if caption
        .as_deref()
        .is_some_and(|c| c.chars().count() > MAX_CAPTION_CHARS)
    {
        return Err(AppError::Validation(format!(
            "Caption must be at most {} characters",
            MAX_CAPTION_CHARS
        )));
    }

    let photo = PhotoService::new(db)
        .upload(
            storage.as_ref(),
            venue_id,
            auth_user.user_id,
            &upload.data,
            &upload.content_type,
            caption,
        )
        .await?;

    Ok(ApiResponse::ok(PhotoResponse::new(photo, storage.as_ref())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/photos/{id}",
    params(("id" = i32, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo removed", body = PhotoResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the uploader", body = AppError),
        (status = 404, description = "Photo not found", body = AppError),
        (status = 409, description = "Photo already hidden", body = AppError),
    ),
    security(("jwt_token" = [])),
    tag = "photos"
)]
pub async fn delete_photo(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let photo = PhotoService::new(db)
        .delete_own(id, auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(PhotoResponse::new(photo, storage.as_ref())))
}
