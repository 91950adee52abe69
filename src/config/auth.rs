use super::non_empty_env;
use anyhow::Result;
use std::env;

/// Settings for verifying the hosted auth provider's access tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Expected `aud` claim; `None` disables the audience check.
    pub audience: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("AUTH_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("AUTH_JWT_SECRET environment variable must be set"))?;

        if jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "AUTH_JWT_SECRET must be at least 32 characters"
            ));
        }

        let audience = match env::var("AUTH_JWT_AUDIENCE") {
            Ok(_) => non_empty_env("AUTH_JWT_AUDIENCE"),
            Err(_) => Some("authenticated".to_string()),
        };

        Ok(Self {
            jwt_secret,
            audience,
        })
    }
}
