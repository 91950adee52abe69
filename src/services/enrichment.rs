use crate::{
    error::{AppError, AppResult},
    models::VenueModel,
    services::{
        places::{PlacesService, DEFAULT_PHOTO_WIDTH},
        venue::VenueService,
    },
};
use futures_util::future::join_all;
use sea_orm::DatabaseConnection;

pub struct EnrichmentService {
    db: DatabaseConnection,
}

impl EnrichmentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Look the venue up on the places API and merge what comes back.
    /// Returns the updated venue plus resolved photo URLs for preview.
    pub async fn enrich(
        &self,
        places: &PlacesService,
        venue_id: i32,
    ) -> AppResult<(VenueModel, Vec<String>)> {
        let venues = VenueService::new(self.db.clone());
        let venue = venues.get_by_id(venue_id).await?;

        let place_id = match &venue.place_id {
            Some(id) => id.clone(),
            None => {
                let query = format!("{} {} {}", venue.name, venue.suburb, venue.region);
                places
                    .search_text(&query)
                    .await?
                    .map(|hit| hit.place_id)
                    .ok_or_else(|| {
                        AppError::Validation(format!("No place found for '{}'", query))
                    })?
            }
        };

        let details = places.details(&place_id).await?;
        let updated = venues.apply_enrichment(venue, &details).await?;

        let lookups = details
            .photo_refs
            .iter()
            .map(|name| places.photo_uri(name, DEFAULT_PHOTO_WIDTH));
        let photo_urls = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|r| match r {
                Ok(uri) => Some(uri),
                Err(e) => {
                    tracing::warn!(venue_id, error = %e, "Photo lookup failed");
                    None
                }
            })
            .collect();

        tracing::info!(venue_id, place_id = %place_id, "Venue enriched");
        Ok((updated, photo_urls))
    }
}
