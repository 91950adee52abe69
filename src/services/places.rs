//! Client for the external places API (Places API "New", v1).
//!
//! Used for autocomplete, details, geocoding via text search and photo media.
//! When no API key is configured every call short-circuits: lookups that feed
//! other features return nothing, direct proxy calls return `Upstream`.

use crate::config::places::PlacesConfig;
use crate::error::{AppError, AppResult};
use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use utoipa::ToSchema;

const DETAILS_FIELD_MASK: &str = "id,displayName,formattedAddress,location,rating,userRatingCount,nationalPhoneNumber,websiteUri,regularOpeningHours.weekdayDescriptions,photos";
const SEARCH_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location";
pub const MAX_PHOTO_REFS: usize = 5;
pub const DEFAULT_PHOTO_WIDTH: u32 = 800;
const MAX_PHOTO_WIDTH: u32 = 1600;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub main_text: String,
    pub secondary_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: Option<i32>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Vec<String>,
    /// Photo resource names, e.g. `places/abc/photos/xyz`.
    pub photo_refs: Vec<String>,
}

impl PlaceDetails {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

// --- wire types ---

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    #[serde(default)]
    weekday_descriptions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoRef {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlace {
    id: String,
    display_name: Option<LocalizedText>,
    formatted_address: Option<String>,
    location: Option<LatLng>,
    rating: Option<f64>,
    user_rating_count: Option<i32>,
    national_phone_number: Option<String>,
    website_uri: Option<String>,
    regular_opening_hours: Option<OpeningHours>,
    #[serde(default)]
    photos: Vec<PhotoRef>,
}

impl From<WirePlace> for PlaceDetails {
    fn from(p: WirePlace) -> Self {
        let (latitude, longitude) = match p.location {
            Some(l) => (Some(l.latitude), Some(l.longitude)),
            None => (None, None),
        };
        Self {
            place_id: p.id,
            name: p.display_name.map(|t| t.text),
            address: p.formatted_address,
            latitude,
            longitude,
            rating: p.rating,
            rating_count: p.user_rating_count,
            phone: p.national_phone_number,
            website: p.website_uri,
            opening_hours: p
                .regular_opening_hours
                .map(|h| h.weekday_descriptions)
                .unwrap_or_default(),
            photo_refs: p
                .photos
                .into_iter()
                .take(MAX_PHOTO_REFS)
                .map(|ph| ph.name)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<WirePlace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredFormat {
    main_text: Option<LocalizedText>,
    secondary_text: Option<LocalizedText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacePrediction {
    place_id: String,
    text: Option<LocalizedText>,
    structured_format: Option<StructuredFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutocompleteEntry {
    place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<AutocompleteEntry>,
}

impl AutocompleteResponse {
    fn into_suggestions(self) -> Vec<PlaceSuggestion> {
        self.suggestions
            .into_iter()
            .filter_map(|s| s.place_prediction)
            .filter_map(|p| {
                let (main, secondary) = match p.structured_format {
                    Some(f) => (f.main_text.map(|t| t.text), f.secondary_text.map(|t| t.text)),
                    None => (None, None),
                };
                let main_text = main.or(p.text.map(|t| t.text))?;
                Some(PlaceSuggestion {
                    place_id: p.place_id,
                    main_text,
                    secondary_text: secondary,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhotoMedia {
    photo_uri: String,
}

// --- client ---

#[derive(Clone)]
pub struct PlacesService {
    http: reqwest::Client,
    config: Option<PlacesConfig>,
}

impl PlacesService {
    pub fn new(config: Option<PlacesConfig>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Build from environment variables. Without `PLACES_API_KEY` the service
    /// is inert.
    pub fn from_env() -> Self {
        let config = PlacesConfig::from_env();
        if config.is_none() {
            tracing::info!("PLACES_API_KEY not set, places features disabled");
        }
        Self::new(config)
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> AppResult<&PlacesConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| AppError::Upstream("places API is not configured".to_string()))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> AppResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("places {} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "places {} returned {}",
                what, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("places {} response invalid: {}", what, e)))
    }

    pub async fn autocomplete(&self, input: &str) -> AppResult<Vec<PlaceSuggestion>> {
        let cfg = self.config()?;
        let request = self
            .http
            .post(format!("{}/places:autocomplete", cfg.base_url))
            .header("X-Goog-Api-Key", &cfg.api_key)
            .json(&json!({
                "input": input,
                "includedRegionCodes": [cfg.region_code],
            }));

        let body: AutocompleteResponse = self.send(request, "autocomplete").await?;
        Ok(body.into_suggestions())
    }

    pub async fn details(&self, place_id: &str) -> AppResult<PlaceDetails> {
        let cfg = self.config()?;
        if place_id.is_empty() || place_id.contains('/') {
            return Err(AppError::Validation("Invalid place id".to_string()));
        }
        let request = self
            .http
            .get(format!("{}/places/{}", cfg.base_url, place_id))
            .header("X-Goog-Api-Key", &cfg.api_key)
            .header("X-Goog-FieldMask", DETAILS_FIELD_MASK);

        let place: WirePlace = self.send(request, "details").await?;
        Ok(place.into())
    }

    /// First text-search hit for `query`, or `None` when nothing matched.
    pub async fn search_text(&self, query: &str) -> AppResult<Option<PlaceDetails>> {
        let cfg = self.config()?;
        let request = self
            .http
            .post(format!("{}/places:searchText", cfg.base_url))
            .header("X-Goog-Api-Key", &cfg.api_key)
            .header("X-Goog-FieldMask", SEARCH_FIELD_MASK)
            .json(&json!({
                "textQuery": query,
                "regionCode": cfg.region_code,
                "maxResultCount": 1,
            }));

        let body: SearchResponse = self.send(request, "search").await?;
        Ok(body.places.into_iter().next().map(PlaceDetails::from))
    }

    /// Geocode a free-text address. Failures are logged and reported as no
    /// match.
    pub async fn geocode(&self, query: &str) -> Option<Coordinate> {
        if !self.is_configured() {
            return None;
        }
        match self.search_text(query).await {
            Ok(hit) => hit.and_then(|p| p.coordinate()),
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Geocoding failed");
                None
            }
        }
    }

    /// Resolve a photo resource name to a short-lived media URI.
    pub async fn photo_uri(&self, name: &str, max_width: u32) -> AppResult<String> {
        let cfg = self.config()?;
        if !is_photo_name(name) {
            return Err(AppError::Validation("Invalid photo reference".to_string()));
        }
        let width = max_width.clamp(1, MAX_PHOTO_WIDTH);
        let request = self
            .http
            .get(format!("{}/{}/media", cfg.base_url, name))
            .header("X-Goog-Api-Key", &cfg.api_key)
            .query(&[
                ("maxWidthPx", width.to_string()),
                ("skipHttpRedirect", "true".to_string()),
            ]);

        let media: PhotoMedia = self.send(request, "photo").await?;
        Ok(media.photo_uri)
    }
}

/// `places/{place}/photos/{photo}` with no other path segments.
fn is_photo_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('/').collect();
    parts.len() == 4
        && parts[0] == "places"
        && parts[2] == "photos"
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_response_maps_to_place_details() {
        let raw = json!({
            "id": "ChIJ123",
            "displayName": { "text": "Manly Pickleball Club", "languageCode": "en" },
            "formattedAddress": "1 Beach Rd, Manly NSW",
            "location": { "latitude": -33.79, "longitude": 151.28 },
            "rating": 4.6,
            "userRatingCount": 87,
            "nationalPhoneNumber": "(02) 9000 0000",
            "websiteUri": "https://example.org",
            "regularOpeningHours": { "weekdayDescriptions": ["Monday: 6 AM to 10 PM"] },
            "photos": [
                { "name": "places/ChIJ123/photos/a" },
                { "name": "places/ChIJ123/photos/b" },
                { "name": "places/ChIJ123/photos/c" },
                { "name": "places/ChIJ123/photos/d" },
                { "name": "places/ChIJ123/photos/e" },
                { "name": "places/ChIJ123/photos/f" }
            ]
        });
        let place: WirePlace = serde_json::from_value(raw).unwrap();
        let details = PlaceDetails::from(place);

        assert_eq!(details.place_id, "ChIJ123");
        assert_eq!(details.name.as_deref(), Some("Manly Pickleball Club"));
        assert_eq!(details.rating_count, Some(87));
        assert_eq!(details.opening_hours.len(), 1);
        assert_eq!(details.photo_refs.len(), MAX_PHOTO_REFS);
        assert!(details.coordinate().is_some());
    }

    #[test]
    fn sparse_details_response_is_accepted() {
        let place: WirePlace = serde_json::from_value(json!({ "id": "x" })).unwrap();
        let details = PlaceDetails::from(place);
        assert!(details.coordinate().is_none());
        assert!(details.photo_refs.is_empty());
    }

    #[test]
    fn autocomplete_prefers_structured_text() {
        let raw = json!({
            "suggestions": [
                {
                    "placePrediction": {
                        "placeId": "p1",
                        "text": { "text": "Bondi Beach, NSW, Australia" },
                        "structuredFormat": {
                            "mainText": { "text": "Bondi Beach" },
                            "secondaryText": { "text": "NSW, Australia" }
                        }
                    }
                },
                { "queryPrediction": { "text": { "text": "bondi courts" } } },
                {
                    "placePrediction": {
                        "placeId": "p2",
                        "text": { "text": "Bondi Junction" }
                    }
                }
            ]
        });
        let body: AutocompleteResponse = serde_json::from_value(raw).unwrap();
        let suggestions = body.into_suggestions();

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].main_text, "Bondi Beach");
        assert_eq!(suggestions[0].secondary_text.as_deref(), Some("NSW, Australia"));
        assert_eq!(suggestions[1].main_text, "Bondi Junction");
    }

    #[test]
    fn photo_names_are_checked() {
        assert!(is_photo_name("places/ChIJ123/photos/Aap_uE-9"));
        assert!(!is_photo_name("places/ChIJ123/photos"));
        assert!(!is_photo_name("places/../photos/x"));
        assert!(!is_photo_name("https://evil/places/a/photos/b"));
    }

    #[tokio::test]
    async fn unconfigured_service_short_circuits() {
        let places = PlacesService::new(None);
        assert!(!places.is_configured());
        assert!(matches!(
            places.autocomplete("bondi").await,
            Err(AppError::Upstream(_))
        ));
        assert!(places.geocode("Manly NSW").await.is_none());
    }
}
