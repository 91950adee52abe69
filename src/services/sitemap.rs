use crate::error::{AppError, AppResult};
use crate::geo::regions::Suburb;
use crate::models::VenueModel;
use serde::Serialize;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Debug, Serialize)]
struct UrlSet {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    url: Vec<UrlEntry>,
}

#[derive(Debug, Serialize)]
struct UrlEntry {
    loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    lastmod: Option<String>,
}

impl UrlEntry {
    fn new(loc: String) -> Self {
        Self { loc, lastmod: None }
    }
}

/// Sitemap listing the home page, every venue and every suburb.
pub fn render_sitemap(
    site_url: &str,
    venues: &[VenueModel],
    suburbs: &[Suburb],
) -> AppResult<String> {
    let base = site_url.trim_end_matches('/');

    let mut url = Vec::with_capacity(1 + venues.len() + suburbs.len());
    url.push(UrlEntry::new(format!("{}/", base)));
    url.extend(venues.iter().map(|v| UrlEntry {
        loc: format!("{}/courts/{}", base, v.slug),
        lastmod: Some(v.updated_at.format("%Y-%m-%d").to_string()),
    }));
    url.extend(
        suburbs
            .iter()
            .map(|s| UrlEntry::new(format!("{}/regions/{}", base, s.slug))),
    );

    let set = UrlSet {
        xmlns: SITEMAP_NS,
        url,
    };
    let body = quick_xml::se::to_string_with_root("urlset", &set)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(format!("{}{}\n", XML_DECLARATION, body))
}

pub fn render_robots(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n",
        site_url.trim_end_matches('/')
    )
}
