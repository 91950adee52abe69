use std::env;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Public origin of the front end, without a trailing slash.
    pub site_url: String,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        Self { site_url }
    }
}
