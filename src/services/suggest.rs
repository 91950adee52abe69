//! Search-box suggestions.
//!
//! Local candidates are venues and suburbs. A prefix match ranks 0, a
//! substring match ranks 1, anything else is dropped. External place
//! suggestions are scored the same way on their main text and rank 2 when the
//! provider matched them some other way.

use crate::{
    error::AppResult,
    geo::regions::{self, Suburb},
    models::VenueModel,
    services::{places::PlaceSuggestion, places::PlacesService, venue::VenueService},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

pub const DEFAULT_LIMIT: usize = 8;
pub const MAX_LIMIT: usize = 20;
const EXTERNAL_FALLBACK_RANK: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Venue,
    Region,
    Place,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub label: String,
    pub secondary: Option<String>,
    /// Venue or suburb slug for local results.
    pub slug: Option<String>,
    /// Places id for external results.
    pub place_id: Option<String>,
    pub rank: u8,
}

/// 0 for a prefix match, 1 for a substring match. `query` must already be
/// lowercased and trimmed.
pub fn match_rank(query: &str, candidate: &str) -> Option<u8> {
    let candidate = candidate.to_lowercase();
    if candidate.starts_with(query) {
        Some(0)
    } else if candidate.contains(query) {
        Some(1)
    } else {
        None
    }
}

fn sort_and_cap(mut items: Vec<Suggestion>, limit: usize) -> Vec<Suggestion> {
    items.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
    });
    items.truncate(limit);
    items
}

pub fn rank_local(query: &str, venues: &[VenueModel], suburbs: &[Suburb]) -> Vec<Suggestion> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }

    let suburb_hits = suburbs.iter().filter_map(|s| {
        match_rank(&q, &s.name).map(|rank| Suggestion {
            kind: SuggestionKind::Region,
            label: s.name.clone(),
            secondary: Some(s.region.clone()).filter(|r| !r.is_empty()),
            slug: Some(s.slug.clone()),
            place_id: None,
            rank,
        })
    });

    let venue_hits = venues.iter().filter_map(|v| {
        match_rank(&q, &v.name).map(|rank| Suggestion {
            kind: SuggestionKind::Venue,
            label: v.name.clone(),
            secondary: Some(v.suburb.clone()),
            slug: Some(v.slug.clone()),
            place_id: None,
            rank,
        })
    });

    suburb_hits.chain(venue_hits).collect()
}

fn region_suggestion(s: &Suburb) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Region,
        label: s.name.clone(),
        secondary: Some(s.region.clone()).filter(|r| !r.is_empty()),
        slug: Some(s.slug.clone()),
        place_id: None,
        rank: 0,
    }
}

fn venue_suggestion(v: &VenueModel) -> Suggestion {
    Suggestion {
        kind: SuggestionKind::Venue,
        label: v.name.clone(),
        secondary: Some(v.suburb.clone()),
        slug: Some(v.slug.clone()),
        place_id: None,
        rank: 0,
    }
}

/// Default list for an empty query: busiest suburbs first, then the
/// best-rated venues. Slots the rated venues cannot fill go to the next
/// suburbs and then to unrated venues by name, so the list is only short
/// when there are not enough candidates at all.
pub fn popular(venues: &[VenueModel], suburbs: &[Suburb], limit: usize) -> Vec<Suggestion> {
    let region_slots = limit.div_ceil(2);

    let mut top_suburbs: Vec<&Suburb> = suburbs.iter().collect();
    top_suburbs.sort_by(|a, b| {
        b.venue_count
            .cmp(&a.venue_count)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    let extra_suburbs = top_suburbs.split_off(region_slots.min(top_suburbs.len()));

    let (mut rated, mut unrated): (Vec<&VenueModel>, Vec<&VenueModel>) =
        venues.iter().partition(|v| v.external_rating.is_some());
    rated.sort_by(|a, b| {
        let ra = a.external_rating.unwrap_or_default();
        let rb = b.external_rating.unwrap_or_default();
        rb.total_cmp(&ra)
            .then_with(|| b.external_rating_count.cmp(&a.external_rating_count))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    unrated.sort_by_key(|v| v.name.to_lowercase());

    top_suburbs
        .into_iter()
        .map(region_suggestion)
        .chain(rated.into_iter().map(venue_suggestion))
        .chain(extra_suburbs.into_iter().map(region_suggestion))
        .chain(unrated.into_iter().map(venue_suggestion))
        .take(limit)
        .collect()
}

/// Combine local hits with external suggestions, dropping externals whose
/// text repeats a region already matched.
pub fn merge(
    query: &str,
    local: Vec<Suggestion>,
    external: Vec<PlaceSuggestion>,
    limit: usize,
) -> Vec<Suggestion> {
    let q = query.trim().to_lowercase();
    let mut seen: HashSet<String> = local
        .iter()
        .filter(|s| s.kind == SuggestionKind::Region)
        .map(|s| s.label.to_lowercase())
        .collect();

    let mut merged = local;
    for place in external {
        if !seen.insert(place.main_text.to_lowercase()) {
            continue;
        }
        let rank = match_rank(&q, &place.main_text).unwrap_or(EXTERNAL_FALLBACK_RANK);
        merged.push(Suggestion {
            kind: SuggestionKind::Place,
            label: place.main_text,
            secondary: place.secondary_text,
            slug: None,
            place_id: Some(place.place_id),
            rank,
        });
    }

    sort_and_cap(merged, limit)
}

pub struct SuggestService {
    db: DatabaseConnection,
}

impl SuggestService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn suggest(
        &self,
        places: &PlacesService,
        query: &str,
        limit: usize,
    ) -> AppResult<Vec<Suggestion>> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let venues = VenueService::new(self.db.clone()).all().await?;
        let suburbs = regions::index_suburbs(&venues);

        if query.trim().is_empty() {
            return Ok(popular(&venues, &suburbs, limit));
        }

        let local = rank_local(query, &venues, &suburbs);

        let external = if places.is_configured() {
            match places.autocomplete(query.trim()).await {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!(error = %e, "Place autocomplete failed, using local suggestions only");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(merge(query, local, external, limit))
    }
}
