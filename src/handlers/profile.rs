use crate::error::AppResult;
use crate::handlers::{append_set_cookie, read_image_upload};
use crate::middleware::AuthUser;
use crate::models::ProfileModel;
use crate::response::ApiResponse;
use crate::services::{
    profile::ProfileService,
    storage::{ObjectStorage, SharedStorage},
};
use crate::utils::{
    cookie::{build_clear_cookie, ACCESS_TOKEN_COOKIE},
    sanitize_optional,
};
use axum::{extract::Multipart, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    /// Email from the access token, if the provider includes one
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub home_suburb: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileResponse {
    fn new(p: ProfileModel, email: Option<String>, storage: &dyn ObjectStorage) -> Self {
        Self {
            avatar_url: p.avatar_key.as_deref().map(|k| storage.public_url(k)),
            user_id: p.user_id,
            email,
            display_name: p.display_name,
            home_suburb: p.home_suburb,
            created_at: p.created_at.to_string(),
            updated_at: p.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    /// Display name (1-50 characters); omit to clear
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub home_suburb: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Current user's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "profile"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let profile = ProfileService::new(db)
        .get_or_create(auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(ProfileResponse::new(
        profile,
        auth_user.email,
        storage.as_ref(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation error", body = crate::error::AppError),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "profile"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let profile = ProfileService::new(db)
        .update(
            auth_user.user_id,
            sanitize_optional(payload.display_name.as_deref()),
            sanitize_optional(payload.home_suburb.as_deref()),
        )
        .await?;
    Ok(ApiResponse::ok(ProfileResponse::new(
        profile,
        auth_user.email,
        storage.as_ref(),
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile/avatar",
    request_body(content_type = "multipart/form-data", description = "Part: file (jpeg, png or webp)"),
    responses(
        (status = 200, description = "Avatar replaced", body = ProfileResponse),
        (status = 400, description = "Invalid image", body = crate::error::AppError),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 413, description = "Image too large", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "profile"
)]
pub async fn upload_avatar(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let upload = read_image_upload(multipart).await?;
    let profile = ProfileService::new(db)
        .set_avatar(
            storage.as_ref(),
            auth_user.user_id,
            &upload.data,
            &upload.content_type,
        )
        .await?;
    Ok(ApiResponse::ok(ProfileResponse::new(
        profile,
        auth_user.email,
        storage.as_ref(),
    )))
}

/// Anonymize the account and sign the browser out.
#[utoipa::path(
    post,
    path = "/api/v1/account/delete",
    responses(
        (status = 200, description = "Account data removed"),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    security(("jwt_token" = [])),
    tag = "profile"
)]
pub async fn delete_account(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    ProfileService::new(db)
        .delete_account(storage.as_ref(), auth_user.user_id)
        .await?;

    let mut response = ApiResponse::<()>::with_message((), "Account deleted".to_string())
        .into_response();
    append_set_cookie(&mut response, &build_clear_cookie(ACCESS_TOKEN_COOKIE))?;
    Ok(response)
}
