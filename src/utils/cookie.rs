use crate::config::parse_bool_env;
use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

/// Access token cookie written by the hosted auth provider's browser SDK.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const ADMIN_SESSION_COOKIE: &str = "admin_session";

#[derive(Debug, Clone)]
struct CookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl CookieConfig {
    fn from_env() -> Self {
        let same_site =
            parse_same_site(&env::var("COOKIE_SAMESITE").unwrap_or_else(|_| "Strict".to_string()));
        let mut secure = parse_bool_env("COOKIE_SECURE", false);
        let domain = env::var("COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Browsers require SameSite=None cookies to also be Secure.
        if same_site == "None" {
            secure = true;
        }

        Self {
            secure,
            same_site,
            domain,
        }
    }
}

fn cookie_config() -> &'static CookieConfig {
    static CONFIG: OnceLock<CookieConfig> = OnceLock::new();
    CONFIG.get_or_init(CookieConfig::from_env)
}

fn parse_same_site(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "lax" => "Lax",
        "none" => "None",
        _ => "Strict",
    }
}

pub fn build_session_cookie(name: &str, value: &str, max_age_seconds: u64) -> String {
    let config = cookie_config();
    let mut cookie = format!(
        "{name}={value}; Path=/; Max-Age={max_age_seconds}; HttpOnly; SameSite={}",
        config.same_site
    );
    append_attributes(&mut cookie, config);
    cookie
}

pub fn build_clear_cookie(name: &str) -> String {
    let config = cookie_config();
    let mut cookie = format!(
        "{name}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite={}",
        config.same_site
    );
    append_attributes(&mut cookie, config);
    cookie
}

fn append_attributes(cookie: &mut String, config: &CookieConfig) {
    if config.secure {
        cookie.push_str("; Secure");
    }

    if let Some(domain) = &config.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let (key, value) = cookie.trim().split_once('=')?;
                (key.trim() == name).then(|| value.trim().to_string())
            })
        })
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=123.abc; other=1"),
        );
        assert_eq!(
            extract_cookie(&headers, ADMIN_SESSION_COOKIE),
            Some("123.abc".to_string())
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn empty_cookie_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_session="));
        assert_eq!(extract_cookie(&headers, ADMIN_SESSION_COOKIE), None);
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = build_session_cookie(ADMIN_SESSION_COOKIE, "v", 60);
        assert!(cookie.starts_with("admin_session=v; Path=/; Max-Age=60; HttpOnly"));
        assert!(build_clear_cookie(ADMIN_SESSION_COOKIE).contains("Max-Age=0"));
    }
}
