use crate::{
    config::admin::AdminConfig,
    error::AppError,
    utils::{
        admin_token::verify_session,
        cookie::{extract_cookie, ADMIN_SESSION_COOKIE},
    },
};
use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response, Extension};
use std::sync::Arc;

/// Guard for the moderation console: requires a valid, unexpired signed
/// `admin_session` cookie.
pub async fn admin_middleware(
    Extension(config): Extension<Arc<AdminConfig>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_cookie(&headers, ADMIN_SESSION_COOKIE).ok_or(AppError::Unauthorized)?;
    let now = chrono::Utc::now().timestamp();
    if !verify_session(&config.session_secret, &token, now) {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
