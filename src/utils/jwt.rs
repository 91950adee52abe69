//! Verification of access tokens issued by the hosted auth provider.
//!
//! The provider signs HS256 JWTs with a project secret; this service never
//! issues user tokens itself, it only checks them.

use crate::config::auth::AuthConfig;
use anyhow::Result;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

static AUTH_CONFIG: OnceLock<AuthConfig> = OnceLock::new();

/// Initialize token verification. Must be called once at startup.
pub fn init_auth_config(config: AuthConfig) -> Result<()> {
    AUTH_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Auth config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static AuthConfig> {
    AUTH_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Auth config not initialized"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow::anyhow!("Invalid subject: {}", e))
    }
}

fn validation(config: &AuthConfig) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    match &config.audience {
        Some(aud) => validation.set_audience(&[aud.as_str()]),
        None => validation.validate_aud = false,
    }
    validation
}

pub fn decode_access_token(token: &str) -> Result<Claims> {
    let config = get_config()?;
    decode_with(config, token)
}

fn decode_with(config: &AuthConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation(config),
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode access token: {}", e))
}
