use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::services::{
    places::PlacesService,
    suggest::{SuggestService, Suggestion, DEFAULT_LIMIT, MAX_LIMIT},
};
use axum::{extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::ToSchema;

const MAX_QUERY_CHARS: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/v1/suggest",
    params(
        ("q" = Option<String>, Query, description = "Search text; empty returns popular picks"),
        ("limit" = Option<usize>, Query, description = "Maximum suggestions (default 8, max 20)"),
    ),
    responses(
        (status = 200, description = "Ranked suggestions", body = Vec<Suggestion>),
    ),
    tag = "search"
)]
pub async fn suggest(
    Extension(db): Extension<DatabaseConnection>,
    Extension(places): Extension<PlacesService>,
    Query(params): Query<SuggestQuery>,
) -> AppResult<impl IntoResponse> {
    let query: String = params
        .q
        .unwrap_or_default()
        .chars()
        .take(MAX_QUERY_CHARS)
        .collect();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let suggestions = SuggestService::new(db)
        .suggest(&places, &query, limit)
        .await?;
    Ok(ApiResponse::ok(suggestions))
}
