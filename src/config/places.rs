use super::non_empty_env;
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com/v1";

#[derive(Debug, Clone)]
pub struct PlacesConfig {
    pub api_key: String,
    pub base_url: String,
    pub region_code: String,
}

impl PlacesConfig {
    /// `None` when no API key is configured; places features are then skipped.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_env("PLACES_API_KEY")?;
        let base_url = env::var("PLACES_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let region_code = env::var("PLACES_REGION_CODE").unwrap_or_else(|_| "au".to_string());

        Some(Self {
            api_key,
            base_url,
            region_code,
        })
    }
}
