use crate::config::site::SiteConfig;
use crate::error::AppResult;
use crate::geo::regions;
use crate::services::{
    sitemap::{render_robots, render_sitemap},
    venue::VenueService,
};
use axum::{
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
pub async fn health_check(
    Extension(db): Extension<DatabaseConnection>,
) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Courtside API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    responses((status = 200, description = "Sitemap of venue and suburb pages", content_type = "application/xml")),
    tag = "site"
)]
pub async fn sitemap(
    Extension(db): Extension<DatabaseConnection>,
    Extension(site): Extension<SiteConfig>,
) -> AppResult<impl IntoResponse> {
    let venues = VenueService::new(db).all().await?;
    let suburbs = regions::index_suburbs(&venues);
    let xml = render_sitemap(&site.site_url, &venues, &suburbs)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        xml,
    ))
}

#[utoipa::path(
    get,
    path = "/robots.txt",
    responses((status = 200, description = "Crawler rules", content_type = "text/plain")),
    tag = "site"
)]
pub async fn robots(Extension(site): Extension<SiteConfig>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_robots(&site.site_url),
    )
}
