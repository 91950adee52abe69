use crate::config::{parse_bool_env, storage::StorageConfig};
use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{env, sync::OnceLock};

const DEFAULT_CSP_POLICY: &str = "default-src 'self'; base-uri 'self'; frame-ancestors 'none'; object-src 'none'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
/// Stored objects get a fresh UUID key on every upload, so a URL never
/// changes content.
const MEDIA_CACHE_VALUE: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Clone)]
struct SecurityHeadersConfig {
    csp: HeaderValue,
    enable_hsts: bool,
    media_prefix: String,
}

impl SecurityHeadersConfig {
    fn from_env() -> Self {
        let raw_csp = env::var("CSP_POLICY").unwrap_or_else(|_| DEFAULT_CSP_POLICY.to_string());
        let csp = HeaderValue::from_str(&raw_csp).unwrap_or_else(|err| {
            tracing::warn!(
                "Invalid CSP_POLICY value ({}), falling back to default policy",
                err
            );
            HeaderValue::from_static(DEFAULT_CSP_POLICY)
        });

        let enable_hsts = parse_bool_env("ENABLE_HSTS", true);
        let media_prefix = format!("{}/", StorageConfig::from_env().public_path);

        Self {
            csp,
            enable_hsts,
            media_prefix,
        }
    }
}

fn security_headers_config() -> &'static SecurityHeadersConfig {
    static CONFIG: OnceLock<SecurityHeadersConfig> = OnceLock::new();
    CONFIG.get_or_init(SecurityHeadersConfig::from_env)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachePolicy {
    /// Admin and account responses carry session data.
    NoStore,
    Immutable,
    /// Leave whatever the handler set.
    Handler,
}

fn cache_policy(path: &str, media_prefix: &str) -> CachePolicy {
    const PRIVATE: [&str; 4] = [
        "/api/v1/admin",
        "/api/v1/profile",
        "/api/v1/favorites",
        "/api/v1/account",
    ];
    if PRIVATE.iter().any(|prefix| path.starts_with(prefix)) {
        CachePolicy::NoStore
    } else if path.starts_with(media_prefix) {
        CachePolicy::Immutable
    } else {
        CachePolicy::Handler
    }
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let config = security_headers_config();
    let policy = cache_policy(request.uri().path(), &config.media_prefix);
    let mut response = next.run(request).await;
    let status = response.status();
    let headers = response.headers_mut();

    headers.insert("content-security-policy", config.csp.clone());
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("geolocation=(self), microphone=(), camera=()"),
    );
    headers.insert(
        "cross-origin-opener-policy",
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        "cross-origin-resource-policy",
        HeaderValue::from_static("same-site"),
    );

    match policy {
        CachePolicy::NoStore => {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
        // A 404 for a deleted photo must not be cached forever.
        CachePolicy::Immutable if status == StatusCode::OK => {
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static(MEDIA_CACHE_VALUE),
            );
        }
        _ => {}
    }

    if config.enable_hsts {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}
