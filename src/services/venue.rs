use crate::{
    error::{AppError, AppResult},
    geo::{
        grid::{self, DEFAULT_TIER_THRESHOLDS},
        nearby,
        regions::{self, Suburb},
        BoundingBox, Coordinate, Located,
    },
    models::{
        feedback::{self, CommunityRating, FeedbackKind},
        venue::{self, CourtType},
        Feedback, Venue, VenueModel,
    },
    services::{moderation::FeedbackStatus, places::PlaceDetails},
    utils::slug::with_suffix,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

/// Suburb lookup radius for heat-map cells whose centre is outside every
/// suburb box.
const CELL_SUBURB_FALLBACK_KM: f64 = 5.0;
const HEATMAP_PADDING: f64 = 0.02;

#[derive(Debug, Default, Clone)]
pub struct VenueFilter {
    pub region: Option<String>,
    pub suburb: Option<String>,
    pub court_type: Option<CourtType>,
    pub q: Option<String>,
}

impl VenueFilter {
    pub fn matches(&self, v: &VenueModel) -> bool {
        if let Some(region) = &self.region {
            if !v.region.eq_ignore_ascii_case(region.trim()) {
                return false;
            }
        }
        if let Some(suburb) = &self.suburb {
            let wanted = crate::utils::slugify(suburb);
            if crate::utils::slugify(&v.suburb) != wanted {
                return false;
            }
        }
        if let Some(ct) = self.court_type {
            if v.court_type != ct.as_str() {
                return false;
            }
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            let hit = v.name.to_lowercase().contains(&q)
                || v.suburb.to_lowercase().contains(&q)
                || v
                    .address
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HeatCell {
    pub row: usize,
    pub col: usize,
    /// Cell centre.
    pub lat: f64,
    pub lng: f64,
    pub count: usize,
    pub tier: usize,
    pub suburb: Option<String>,
    pub venue_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Heatmap {
    pub bounds: Option<BoundingBox>,
    pub resolution: usize,
    pub total: usize,
    pub cells: Vec<HeatCell>,
}

pub struct VenueService {
    db: DatabaseConnection,
}

impl VenueService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> AppResult<Vec<VenueModel>> {
        Ok(Venue::find()
            .order_by_asc(venue::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn list(
        &self,
        filter: &VenueFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<VenueModel>, u64)> {
        let matching: Vec<VenueModel> = self
            .all()
            .await?
            .into_iter()
            .filter(|v| filter.matches(v))
            .collect();
        Ok(nearby::paginate(matching, page, per_page))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<VenueModel> {
        Venue::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppResult<VenueModel> {
        Venue::find()
            .filter(venue::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Community rating per venue, from active review rows.
    pub async fn community_ratings(
        &self,
        venue_ids: &[i32],
    ) -> AppResult<HashMap<i32, CommunityRating>> {
        if venue_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, Option<i16>)> = Feedback::find()
            .select_only()
            .column(feedback::Column::VenueId)
            .column(feedback::Column::Rating)
            .filter(feedback::Column::VenueId.is_in(venue_ids.iter().copied()))
            .filter(feedback::Column::Kind.eq(FeedbackKind::Review.as_str()))
            .filter(feedback::Column::Status.eq(FeedbackStatus::Active.as_str()))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut grouped: HashMap<i32, Vec<i16>> = HashMap::new();
        for (venue_id, rating) in rows {
            if let Some(r) = rating {
                grouped.entry(venue_id).or_default().push(r);
            }
        }

        Ok(grouped
            .into_iter()
            .filter_map(|(id, ratings)| CommunityRating::from_ratings(ratings).map(|r| (id, r)))
            .collect())
    }

    pub async fn community_rating(&self, venue_id: i32) -> AppResult<Option<CommunityRating>> {
        Ok(self
            .community_ratings(&[venue_id])
            .await?
            .remove(&venue_id))
    }

    /// Venues within `radius_km` of `origin`, nearest first.
    pub async fn nearby(
        &self,
        origin: Coordinate,
        radius_km: f64,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<(VenueModel, f64)>, u64)> {
        let venues = self.all().await?;
        let ranked: Vec<(VenueModel, f64)> =
            nearby::rank_by_distance(&venues, origin, Some(radius_km))
                .into_iter()
                .map(|r| (r.item.clone(), r.distance_km))
                .collect();
        Ok(nearby::paginate(ranked, page, per_page))
    }

    /// Closest other venues to `venue`, for the detail view.
    pub async fn neighbours_of(
        &self,
        venue: &VenueModel,
        limit: usize,
    ) -> AppResult<Vec<(VenueModel, f64)>> {
        let Some(origin) = venue.coordinate() else {
            return Ok(Vec::new());
        };
        let venues = self.all().await?;
        Ok(
            nearby::rank_by_distance(&venues, origin, Some(nearby::DEFAULT_RADIUS_KM))
                .into_iter()
                .filter(|r| r.item.id != venue.id)
                .take(limit)
                .map(|r| (r.item.clone(), r.distance_km))
                .collect(),
        )
    }

    pub async fn suburbs(&self) -> AppResult<Vec<Suburb>> {
        let venues = self.all().await?;
        Ok(regions::index_suburbs(&venues))
    }

    /// A suburb, its venues and its closest neighbouring suburbs.
    pub async fn suburb_detail(
        &self,
        slug: &str,
        neighbour_limit: usize,
    ) -> AppResult<(Suburb, Vec<VenueModel>, Vec<(Suburb, f64)>)> {
        let venues = self.all().await?;
        let suburbs = regions::index_suburbs(&venues);
        let suburb = suburbs
            .iter()
            .find(|s| s.slug == slug)
            .cloned()
            .ok_or(AppError::NotFound)?;

        let members = venues
            .into_iter()
            .filter(|v| crate::utils::slugify(&v.suburb) == slug)
            .collect();
        let neighbours = regions::neighbours(&suburbs, slug, neighbour_limit)
            .into_iter()
            .map(|(s, d)| (s.clone(), d))
            .collect();

        Ok((suburb, members, neighbours))
    }

    pub async fn heatmap(
        &self,
        bounds: Option<BoundingBox>,
        resolution: usize,
    ) -> AppResult<Heatmap> {
        let venues = self.all().await?;
        Ok(build_heatmap(&venues, bounds, resolution))
    }

    /// Merge places details into a venue. Coordinates and address are only
    /// filled when missing.
    pub async fn apply_enrichment(
        &self,
        venue: VenueModel,
        details: &PlaceDetails,
    ) -> AppResult<VenueModel> {
        let now = chrono::Utc::now().naive_utc();
        let fill_coords = venue.coordinate().is_none();
        let fill_address = venue.address.is_none();

        let mut active = venue.into_active_model();
        active.place_id = Set(Some(details.place_id.clone()));
        active.external_rating = Set(details.rating);
        active.external_rating_count = Set(details.rating_count);
        active.phone = Set(details.phone.clone());
        active.website = Set(details.website.clone());
        active.opening_hours = Set(Some(serde_json::json!(details.opening_hours)));
        active.photo_refs = Set(Some(serde_json::json!(details.photo_refs)));
        active.enriched_at = Set(Some(now));
        active.updated_at = Set(now);
        if fill_coords {
            if let Some(c) = details.coordinate() {
                active.latitude = Set(Some(c.lat));
                active.longitude = Set(Some(c.lng));
            }
        }
        if fill_address && details.address.is_some() {
            active.address = Set(details.address.clone());
        }

        Ok(active.update(&self.db).await?)
    }
}

/// Aggregate venues into an N×N grid. Without explicit bounds the grid spans
/// every geocoded venue, padded so edge points stay inside.
pub fn build_heatmap(
    venues: &[VenueModel],
    bounds: Option<BoundingBox>,
    resolution: usize,
) -> Heatmap {
    let bounds = bounds.or_else(|| {
        BoundingBox::enclosing(venues.iter().filter_map(Located::coordinate))
            .map(|b| b.padded(HEATMAP_PADDING))
    });
    let Some(bounds) = bounds else {
        return Heatmap {
            bounds: None,
            resolution,
            total: 0,
            cells: Vec::new(),
        };
    };

    let suburbs = regions::index_suburbs(venues);
    let heat = grid::bin_points(venues, &bounds, resolution);

    let cells = heat
        .occupied()
        .map(|cell| HeatCell {
            row: cell.index.row,
            col: cell.index.col,
            lat: cell.centroid.lat,
            lng: cell.centroid.lng,
            count: cell.count(),
            tier: grid::intensity_tier(cell.count(), &DEFAULT_TIER_THRESHOLDS),
            suburb: regions::suburb_at(&suburbs, cell.centroid, CELL_SUBURB_FALLBACK_KM)
                .map(|s| s.name.clone()),
            venue_ids: cell.points.iter().map(|v| v.id).collect(),
        })
        .collect();

    Heatmap {
        bounds: Some(bounds),
        resolution,
        total: heat.total_points(),
        cells,
    }
}

/// First of `base`, `base-2`, `base-3`, ... not present in `taken`.
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> String {
    (1..)
        .map(|n| with_suffix(base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Unique venue slug for `base`, checked against existing rows on `conn`
/// (pass the transaction when inserting).
pub async fn unique_slug<C: ConnectionTrait>(conn: &C, base: &str) -> AppResult<String> {
    let taken: HashSet<String> = Venue::find()
        .select_only()
        .column(venue::Column::Slug)
        .filter(
            venue::Column::Slug
                .eq(base)
                .or(venue::Column::Slug.starts_with(format!("{}-", base))),
        )
        .into_tuple::<String>()
        .all(conn)
        .await?
        .into_iter()
        .collect();
    Ok(next_free_slug(base, &taken))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::venue::fixture;

    fn sample() -> Vec<VenueModel> {
        let mut a = fixture(1, "Manly Courts", "Manly", Some((-33.797, 151.285)));
        a.address = Some("1 Pittwater Rd".to_string());
        let mut b = fixture(2, "Dee Why Rec", "Dee Why", Some((-33.751, 151.288)));
        b.court_type = "indoor".to_string();
        let mut c = fixture(3, "Fitzroy Gardens", "Fitzroy", Some((-37.80, 144.98)));
        c.region = "VIC".to_string();
        let d = fixture(4, "Unmapped Hall", "Manly", None);
        vec![a, b, c, d]
    }

    #[test]
    fn filter_by_region_and_type() {
        let venues = sample();
        let f = VenueFilter {
            region: Some("nsw".to_string()),
            court_type: Some(CourtType::Indoor),
            ..Default::default()
        };
        let ids: Vec<i32> = venues.iter().filter(|v| f.matches(v)).map(|v| v.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn filter_by_suburb_slug_and_query() {
        let venues = sample();
        let f = VenueFilter {
            suburb: Some("manly".to_string()),
            ..Default::default()
        };
        assert_eq!(venues.iter().filter(|v| f.matches(v)).count(), 2);

        let q = VenueFilter {
            q: Some("pittwater".to_string()),
            ..Default::default()
        };
        let ids: Vec<i32> = venues.iter().filter(|v| q.matches(v)).map(|v| v.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn blank_query_matches_everything() {
        let f = VenueFilter {
            q: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(sample().iter().all(|v| f.matches(v)));
    }

    #[test]
    fn heatmap_skips_unmapped_venues() {
        let venues = sample();
        let map = build_heatmap(&venues, None, 20);
        assert_eq!(map.total, 3);
        assert!(map.bounds.is_some());
        assert!(map.cells.iter().all(|c| c.tier == 0));
    }

    #[test]
    fn heatmap_cells_carry_suburb_names() {
        let venues: Vec<VenueModel> = sample().into_iter().take(2).collect();
        let map = build_heatmap(&venues, None, 20);
        let mut labels: Vec<&str> = map
            .cells
            .iter()
            .filter_map(|c| c.suburb.as_deref())
            .collect();
        labels.sort();
        assert_eq!(labels, vec!["Dee Why", "Manly"]);
    }

    #[test]
    fn heatmap_without_coordinates_is_empty() {
        let venues = vec![fixture(1, "A", "B", None)];
        let map = build_heatmap(&venues, None, 20);
        assert!(map.bounds.is_none());
        assert!(map.cells.is_empty());
    }

    #[test]
    fn heatmap_with_explicit_bounds_excludes_outside() {
        let venues = sample();
        let sydney = BoundingBox::new(-34.0, -33.5, 151.0, 151.5);
        let map = build_heatmap(&venues, Some(sydney), 10);
        assert_eq!(map.total, 2);
    }

    #[test]
    fn next_free_slug_appends_counter() {
        let mut taken = HashSet::new();
        assert_eq!(next_free_slug("manly-courts", &taken), "manly-courts");
        taken.insert("manly-courts".to_string());
        taken.insert("manly-courts-2".to_string());
        assert_eq!(next_free_slug("manly-courts", &taken), "manly-courts-3");
    }
}
