mod config;
mod error;
mod geo;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, Router};
use config::{
    admin::AdminConfig, auth::AuthConfig, site::SiteConfig, storage::StorageConfig,
};
use sea_orm_migration::MigratorTrait;
use services::{
    login_limiter::LoginLimiter,
    places::PlacesService,
    storage::{LocalStorage, SharedStorage},
};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::site::health_check,
        crate::handlers::site::sitemap,
        crate::handlers::site::robots,
        // Venues and regions
        crate::handlers::venue::list_venues,
        crate::handlers::venue::nearby_venues,
        crate::handlers::venue::get_venue,
        crate::handlers::venue::list_regions,
        crate::handlers::venue::get_region,
        crate::handlers::venue::heatmap,
        // Search and places
        crate::handlers::suggest::suggest,
        crate::handlers::places::autocomplete,
        crate::handlers::places::details,
        crate::handlers::places::photo,
        // Submissions
        crate::handlers::submission::create_submission,
        // Feedback
        crate::handlers::feedback::list_feedback,
        crate::handlers::feedback::create_feedback,
        crate::handlers::feedback::delete_feedback,
        // Photos
        crate::handlers::photo::upload_photo,
        crate::handlers::photo::delete_photo,
        // Favorites
        crate::handlers::favorite::toggle_favorite,
        crate::handlers::favorite::list_favorites,
        // Profile
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::profile::upload_avatar,
        crate::handlers::profile::delete_account,
        // Admin
        crate::handlers::admin::login,
        crate::handlers::admin::logout,
        crate::handlers::admin::get_stats,
        crate::handlers::admin::list_submissions,
        crate::handlers::admin::approve_submission,
        crate::handlers::admin::reject_submission,
        crate::handlers::admin::list_feedback,
        crate::handlers::admin::hide_feedback,
        crate::handlers::admin::restore_feedback,
        crate::handlers::admin::resolve_feedback,
        crate::handlers::admin::delete_feedback,
        crate::handlers::admin::list_photos,
        crate::handlers::admin::hide_photo,
        crate::handlers::admin::show_photo,
        crate::handlers::admin::delete_photo,
        crate::handlers::admin::enrich_venue,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::geo::Coordinate,
            crate::geo::BoundingBox,
            crate::geo::regions::Suburb,
            // Venues
            crate::handlers::venue::VenueResponse,
            crate::handlers::venue::NearbyVenueResponse,
            crate::handlers::venue::VenueDetailResponse,
            crate::handlers::venue::NeighbourResponse,
            crate::handlers::venue::RegionDetailResponse,
            crate::handlers::venue::VenueListQuery,
            crate::handlers::venue::NearbyQuery,
            crate::handlers::venue::HeatmapQuery,
            crate::services::venue::Heatmap,
            crate::services::venue::HeatCell,
            crate::models::feedback::CommunityRating,
            // Search and places
            crate::handlers::suggest::SuggestQuery,
            crate::services::suggest::Suggestion,
            crate::services::suggest::SuggestionKind,
            crate::handlers::places::AutocompleteQuery,
            crate::handlers::places::PhotoQuery,
            crate::services::places::PlaceSuggestion,
            crate::services::places::PlaceDetails,
            // Submissions
            crate::handlers::submission::CreateSubmissionRequest,
            crate::handlers::submission::SubmissionResponse,
            // Feedback
            crate::models::feedback::FeedbackContent,
            crate::models::feedback::CorrectionType,
            crate::handlers::feedback::FeedbackResponse,
            // Photos
            crate::handlers::photo::PhotoResponse,
            // Favorites
            crate::handlers::favorite::FavoriteToggleResponse,
            // Profile
            crate::handlers::profile::ProfileResponse,
            crate::handlers::profile::UpdateProfileRequest,
            // Admin
            crate::handlers::admin::AdminLoginRequest,
            crate::handlers::admin::AdminLoginResponse,
            crate::handlers::admin::RejectSubmissionRequest,
            crate::handlers::admin::ApprovalResponse,
            crate::handlers::admin::AdminFeedbackResponse,
            crate::handlers::admin::AdminPhotoResponse,
            crate::handlers::admin::EnrichResponse,
            crate::handlers::admin::ModerationListQuery,
            crate::services::admin::AdminStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "venues", description = "Venue directory"),
        (name = "regions", description = "Suburb index"),
        (name = "map", description = "Heat-map aggregation"),
        (name = "search", description = "Typeahead suggestions"),
        (name = "places", description = "Places API proxy"),
        (name = "submissions", description = "User-proposed venues"),
        (name = "feedback", description = "Reviews, comments and corrections"),
        (name = "photos", description = "User photo uploads"),
        (name = "favorites", description = "Saved venues"),
        (name = "profile", description = "Profile and account operations"),
        (name = "admin", description = "Moderation console"),
        (name = "site", description = "Crawler files"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "admin_session",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                utils::cookie::ADMIN_SESSION_COOKIE,
            ))),
        );
    }
}

/// Validated startup configuration.
struct AppConfig {
    auth: AuthConfig,
    admin: AdminConfig,
    storage: StorageConfig,
    site: SiteConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    // Validate configuration before doing anything else
    let config = validate_config()?;

    utils::jwt::init_auth_config(config.auth)?;

    tracing::info!("Starting Courtside API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let storage: SharedStorage = Arc::new(LocalStorage::new(&config.storage));
    let places = PlacesService::from_env();
    let limiter = LoginLimiter::new(config.admin.login_max_attempts, config.admin.login_window);

    let app = create_app(&config.storage.root_dir, &config.storage.public_path)
        .layer(Extension(db))
        .layer(Extension(storage))
        .layer(Extension(places))
        .layer(Extension(limiter))
        .layer(Extension(Arc::new(config.admin)))
        .layer(Extension(config.site));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "courtside=debug,tower_http=debug,axum=debug".into());
    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<AppConfig> {
    let auth = AuthConfig::from_env()?;
    let admin = AdminConfig::from_env()?;

    // Checked here for an early error; the connection is opened later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let storage = StorageConfig::from_env();
    std::fs::create_dir_all(&storage.root_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create storage directory '{}': {}",
            storage.root_dir,
            e
        )
    })?;

    Ok(AppConfig {
        auth,
        admin,
        storage,
        site: SiteConfig::from_env(),
    })
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        // Cookie sessions need an explicit origin list.
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins).allow_credentials(true)
    }
}

fn create_app(storage_dir: &str, public_path: &str) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service(public_path, ServeDir::new(storage_dir))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
