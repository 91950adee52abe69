use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::places::{PlaceDetails, PlaceSuggestion, PlacesService, DEFAULT_PHOTO_WIDTH};
use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AutocompleteQuery {
    pub input: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhotoQuery {
    /// Photo resource name, `places/{place}/photos/{photo}`
    pub name: String,
    pub max_width: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/places/autocomplete",
    params(("input" = String, Query, description = "Partial place name")),
    responses(
        (status = 200, description = "Place predictions", body = Vec<PlaceSuggestion>),
        (status = 400, description = "Empty input", body = AppError),
        (status = 502, description = "Places API unavailable", body = AppError),
    ),
    tag = "places"
)]
pub async fn autocomplete(
    Extension(places): Extension<PlacesService>,
    Query(params): Query<AutocompleteQuery>,
) -> AppResult<impl IntoResponse> {
    let input = params.input.trim();
    if input.is_empty() || input.chars().count() > 100 {
        return Err(AppError::Validation(
            "input must be 1-100 characters".to_string(),
        ));
    }
    let suggestions = places.autocomplete(input).await?;
    Ok(ApiResponse::ok(suggestions))
}

#[utoipa::path(
    get,
    path = "/api/v1/places/details/{place_id}",
    params(("place_id" = String, Path, description = "Place ID")),
    responses(
        (status = 200, description = "Place details", body = PlaceDetails),
        (status = 502, description = "Places API unavailable", body = AppError),
    ),
    tag = "places"
)]
pub async fn details(
    Extension(places): Extension<PlacesService>,
    Path(place_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let details = places.details(&place_id).await?;
    Ok(ApiResponse::ok(details))
}

#[utoipa::path(
    get,
    path = "/api/v1/places/photo",
    params(
        ("name" = String, Query, description = "Photo resource name"),
        ("max_width" = Option<u32>, Query, description = "Maximum width in pixels"),
    ),
    responses(
        (status = 302, description = "Redirect to the photo"),
        (status = 400, description = "Invalid photo reference", body = AppError),
        (status = 502, description = "Places API unavailable", body = AppError),
    ),
    tag = "places"
)]
pub async fn photo(
    Extension(places): Extension<PlacesService>,
    Query(params): Query<PhotoQuery>,
) -> AppResult<impl IntoResponse> {
    let uri = places
        .photo_uri(&params.name, params.max_width.unwrap_or(DEFAULT_PHOTO_WIDTH))
        .await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, uri)]))
}
