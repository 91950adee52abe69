use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::{admin::admin_middleware, auth::auth_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .route("/", routing::get(handlers::site::health_check))
        .route("/sitemap.xml", routing::get(handlers::site::sitemap))
        .route("/robots.txt", routing::get(handlers::site::robots))
        .nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let public_read = public_read_routes(&rate_limit_config);
    let user = user_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));
    let admin_session = admin_session_routes(&rate_limit_config);
    let admin = admin_routes(&rate_limit_config).layer(middleware::from_fn(admin_middleware));

    public_read.merge(user).merge(admin_session).merge(admin)
}

/// Public read routes: directory, map, search and places lookups.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Venues
        .route("/venues", routing::get(handlers::venue::list_venues))
        .route(
            "/venues/nearby",
            routing::get(handlers::venue::nearby_venues),
        )
        // Detail is keyed by slug; the parameter shares its name with the
        // numeric-id routes below because the router rejects mixed names.
        .route("/venues/{id}", routing::get(handlers::venue::get_venue))
        .route(
            "/venues/{id}/feedback",
            routing::get(handlers::feedback::list_feedback),
        )
        // Regions and map
        .route("/regions", routing::get(handlers::venue::list_regions))
        .route("/regions/{slug}", routing::get(handlers::venue::get_region))
        .route("/heatmap", routing::get(handlers::venue::heatmap))
        // Search
        .route("/suggest", routing::get(handlers::suggest::suggest))
        // Places
        .route(
            "/places/autocomplete",
            routing::get(handlers::places::autocomplete),
        )
        .route(
            "/places/details/{place_id}",
            routing::get(handlers::places::details),
        )
        .route("/places/photo", routing::get(handlers::places::photo));

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Signed-in user routes. Identity comes from the hosted-auth token.
fn user_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/submissions",
            routing::post(handlers::submission::create_submission),
        )
        // Feedback
        .route(
            "/venues/{id}/feedback",
            routing::post(handlers::feedback::create_feedback),
        )
        .route(
            "/feedback/{id}",
            routing::delete(handlers::feedback::delete_feedback),
        )
        // Photos
        .route(
            "/venues/{id}/photos",
            routing::post(handlers::photo::upload_photo),
        )
        .route(
            "/photos/{id}",
            routing::delete(handlers::photo::delete_photo),
        )
        // Favorites
        .route(
            "/venues/{id}/favorite",
            routing::post(handlers::favorite::toggle_favorite),
        )
        .route(
            "/favorites",
            routing::get(handlers::favorite::list_favorites),
        )
        // Profile
        .route(
            "/profile",
            routing::get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route(
            "/profile/avatar",
            routing::put(handlers::profile::upload_avatar),
        )
        .route(
            "/account/delete",
            routing::post(handlers::profile::delete_account),
        );

    with_optional_rate_limit(router, config.enabled, config.write)
}

/// Admin sign-in and sign-out; no session required.
fn admin_session_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/admin/login", routing::post(handlers::admin::login))
        .route("/admin/logout", routing::post(handlers::admin::logout));

    with_optional_rate_limit(router, config.enabled, config.admin)
}

/// Moderation console routes, behind the admin session cookie.
fn admin_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        // Submissions
        .route(
            "/admin/submissions",
            routing::get(handlers::admin::list_submissions),
        )
        .route(
            "/admin/submissions/{id}/approve",
            routing::post(handlers::admin::approve_submission),
        )
        .route(
            "/admin/submissions/{id}/reject",
            routing::post(handlers::admin::reject_submission),
        )
        // Feedback
        .route(
            "/admin/feedback",
            routing::get(handlers::admin::list_feedback),
        )
        .route(
            "/admin/feedback/{id}/hide",
            routing::post(handlers::admin::hide_feedback),
        )
        .route(
            "/admin/feedback/{id}/restore",
            routing::post(handlers::admin::restore_feedback),
        )
        .route(
            "/admin/feedback/{id}/resolve",
            routing::post(handlers::admin::resolve_feedback),
        )
        .route(
            "/admin/feedback/{id}/delete",
            routing::post(handlers::admin::delete_feedback),
        )
        // Photos
        .route("/admin/photos", routing::get(handlers::admin::list_photos))
        .route(
            "/admin/photos/{id}/hide",
            routing::post(handlers::admin::hide_photo),
        )
        .route(
            "/admin/photos/{id}/show",
            routing::post(handlers::admin::show_photo),
        )
        .route(
            "/admin/photos/{id}/delete",
            routing::post(handlers::admin::delete_photo),
        )
        // Venues
        .route(
            "/admin/venues/{id}/enrich",
            routing::post(handlers::admin::enrich_venue),
        );

    with_optional_rate_limit(router, config.enabled, config.admin)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "Invalid rate limit rule, route group left unlimited");
            router
        }
    }
}
