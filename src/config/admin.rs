use super::parse_env;
use anyhow::Result;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub password: String,
    pub session_secret: String,
    pub session_ttl_seconds: u64,
    pub login_max_attempts: usize,
    pub login_window: Duration,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self> {
        let password = env::var("ADMIN_PASSWORD")
            .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD environment variable must be set"))?;
        if password.len() < 12 {
            return Err(anyhow::anyhow!("ADMIN_PASSWORD must be at least 12 characters"));
        }

        let session_secret = env::var("ADMIN_SESSION_SECRET").map_err(|_| {
            anyhow::anyhow!("ADMIN_SESSION_SECRET environment variable must be set")
        })?;
        if session_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "ADMIN_SESSION_SECRET must be at least 32 characters"
            ));
        }

        Ok(Self {
            password,
            session_secret,
            session_ttl_seconds: parse_env("ADMIN_SESSION_TTL_SECONDS", 8 * 3600),
            login_max_attempts: parse_env("ADMIN_LOGIN_MAX_ATTEMPTS", 5),
            login_window: Duration::from_secs(parse_env("ADMIN_LOGIN_WINDOW_SECONDS", 900)),
        })
    }
}
