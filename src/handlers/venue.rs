use crate::error::{AppError, AppResult};
use crate::geo::{grid, nearby, regions::Suburb, BoundingBox, Coordinate};
use crate::handlers::photo::PhotoResponse;
use crate::models::{feedback::CommunityRating, venue::CourtType, VenueModel};
use crate::response::{page_params, ApiResponse, PaginatedResponse};
use crate::services::{
    photo::PhotoService,
    storage::SharedStorage,
    venue::{Heatmap, VenueFilter, VenueService},
};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const NEIGHBOUR_LIMIT: usize = 6;

#[derive(Debug, Serialize, ToSchema)]
pub struct VenueResponse {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub suburb: String,
    pub region: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// indoor, outdoor or hybrid
    pub court_type: String,
    pub surface: Option<String>,
    pub court_count: Option<i32>,
    pub features: Vec<String>,
    /// Rating from the places API
    pub external_rating: Option<f64>,
    pub external_rating_count: Option<i32>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Vec<String>,
    /// Photo references, resolved through `/api/v1/places/photo`
    pub photo_refs: Vec<String>,
    pub enriched_at: Option<String>,
    /// Average of active community reviews
    pub community_rating: Option<CommunityRating>,
    pub created_at: String,
    pub updated_at: String,
}

impl VenueResponse {
    pub fn new(v: VenueModel, community_rating: Option<CommunityRating>) -> Self {
        let features = v.features();
        let opening_hours = v.opening_hours();
        let photo_refs = v.photo_refs();
        Self {
            id: v.id,
            slug: v.slug,
            name: v.name,
            suburb: v.suburb,
            region: v.region,
            address: v.address,
            latitude: v.latitude,
            longitude: v.longitude,
            court_type: v.court_type,
            surface: v.surface,
            court_count: v.court_count,
            features,
            external_rating: v.external_rating,
            external_rating_count: v.external_rating_count,
            phone: v.phone,
            website: v.website,
            opening_hours,
            photo_refs,
            enriched_at: v.enriched_at.map(|t| t.to_string()),
            community_rating,
            created_at: v.created_at.to_string(),
            updated_at: v.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyVenueResponse {
    #[serde(flatten)]
    pub venue: VenueResponse,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VenueDetailResponse {
    pub venue: VenueResponse,
    pub photos: Vec<PhotoResponse>,
    pub nearby: Vec<NearbyVenueResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NeighbourResponse {
    pub suburb: Suburb,
    pub distance_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionDetailResponse {
    pub suburb: Suburb,
    pub venues: Vec<VenueResponse>,
    pub neighbours: Vec<NeighbourResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VenueListQuery {
    pub region: Option<String>,
    pub suburb: Option<String>,
    pub court_type: Option<String>,
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HeatmapQuery {
    /// Grid resolution N (cells per side)
    pub grid: Option<usize>,
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
}

impl HeatmapQuery {
    /// Explicit bounds need all four edges; partial bounds are an error.
    fn bounds(&self) -> AppResult<Option<BoundingBox>> {
        match (self.min_lat, self.max_lat, self.min_lng, self.max_lng) {
            (None, None, None, None) => Ok(None),
            (Some(min_lat), Some(max_lat), Some(min_lng), Some(max_lng)) => {
                let b = BoundingBox::new(min_lat, max_lat, min_lng, max_lng);
                if !b.is_valid() {
                    return Err(AppError::Validation("Invalid bounding box".to_string()));
                }
                Ok(Some(b))
            }
            _ => Err(AppError::Validation(
                "min_lat, max_lat, min_lng and max_lng must be given together".to_string(),
            )),
        }
    }
}

fn validate_origin(lat: f64, lng: f64) -> AppResult<Coordinate> {
    let c = Coordinate::new(lat, lng);
    if !c.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation("Invalid coordinates".to_string()));
    }
    Ok(c)
}

pub(crate) async fn with_ratings(
    service: &VenueService,
    venues: Vec<VenueModel>,
) -> AppResult<Vec<VenueResponse>> {
    let ids: Vec<i32> = venues.iter().map(|v| v.id).collect();
    let mut ratings = service.community_ratings(&ids).await?;
    Ok(venues
        .into_iter()
        .map(|v| {
            let rating = ratings.remove(&v.id);
            VenueResponse::new(v, rating)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/venues",
    params(
        ("region" = Option<String>, Query, description = "Region (case-insensitive)"),
        ("suburb" = Option<String>, Query, description = "Suburb name or slug"),
        ("court_type" = Option<String>, Query, description = "indoor, outdoor or hybrid"),
        ("q" = Option<String>, Query, description = "Text search over name, suburb and address"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Venues", body = PaginatedResponse<VenueResponse>),
        (status = 400, description = "Invalid filter", body = AppError),
    ),
    tag = "venues"
)]
pub async fn list_venues(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<VenueListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = page_params(params.page, params.per_page);
    let court_type = params
        .court_type
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<CourtType>)
        .transpose()?;
    let filter = VenueFilter {
        region: params.region,
        suburb: params.suburb,
        court_type,
        q: params.q,
    };

    let service = VenueService::new(db);
    let (venues, total) = service.list(&filter, page, per_page).await?;
    let items = with_ratings(&service, venues).await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/venues/nearby",
    params(
        ("lat" = f64, Query, description = "Latitude"),
        ("lng" = f64, Query, description = "Longitude"),
        ("radius_km" = Option<f64>, Query, description = "Search radius in km (default 25, max 500)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Venues nearest first", body = PaginatedResponse<NearbyVenueResponse>),
        (status = 400, description = "Invalid coordinates", body = AppError),
    ),
    tag = "venues"
)]
pub async fn nearby_venues(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<NearbyQuery>,
) -> AppResult<impl IntoResponse> {
    let origin = validate_origin(params.lat, params.lng)?;
    let radius = params.radius_km.unwrap_or(nearby::DEFAULT_RADIUS_KM);
    if !radius.is_finite() || radius <= 0.0 || radius > nearby::MAX_RADIUS_KM {
        return Err(AppError::Validation(format!(
            "radius_km must be between 0 and {}",
            nearby::MAX_RADIUS_KM
        )));
    }
    let (page, per_page) = page_params(params.page, params.per_page);

    let service = VenueService::new(db);
    let (ranked, total) = service.nearby(origin, radius, page, per_page).await?;
    let ids: Vec<i32> = ranked.iter().map(|(v, _)| v.id).collect();
    let mut ratings = service.community_ratings(&ids).await?;
    let items = ranked
        .into_iter()
        .map(|(v, distance_km)| {
            let rating = ratings.remove(&v.id);
            NearbyVenueResponse {
                venue: VenueResponse::new(v, rating),
                distance_km,
            }
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/venues/{id}",
    params(("id" = String, Path, description = "Venue slug")),
    responses(
        (status = 200, description = "Venue with photos and nearby venues", body = VenueDetailResponse),
        (status = 404, description = "Venue not found", body = AppError),
    ),
    tag = "venues"
)]
pub async fn get_venue(
    Extension(db): Extension<DatabaseConnection>,
    Extension(storage): Extension<SharedStorage>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = VenueService::new(db.clone());
    let venue = service.get_by_slug(&slug).await?;
    let rating = service.community_rating(venue.id).await?;

    let photos = PhotoService::new(db)
        .active_for_venue(venue.id)
        .await?
        .into_iter()
        .map(|p| PhotoResponse::new(p, storage.as_ref()))
        .collect();

    let neighbours = service.neighbours_of(&venue, NEIGHBOUR_LIMIT).await?;
    let ids: Vec<i32> = neighbours.iter().map(|(v, _)| v.id).collect();
    let mut ratings = service.community_ratings(&ids).await?;
    let nearby = neighbours
        .into_iter()
        .map(|(v, distance_km)| {
            let r = ratings.remove(&v.id);
            NearbyVenueResponse {
                venue: VenueResponse::new(v, r),
                distance_km,
            }
        })
        .collect();

    Ok(ApiResponse::ok(VenueDetailResponse {
        venue: VenueResponse::new(venue, rating),
        photos,
        nearby,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/regions",
    responses(
        (status = 200, description = "Suburbs derived from venues", body = Vec<Suburb>),
    ),
    tag = "regions"
)]
pub async fn list_regions(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let suburbs = VenueService::new(db).suburbs().await?;
    Ok(ApiResponse::ok(suburbs))
}

#[utoipa::path(
    get,
    path = "/api/v1/regions/{slug}",
    params(("slug" = String, Path, description = "Suburb slug")),
    responses(
        (status = 200, description = "Suburb with venues and neighbours", body = RegionDetailResponse),
        (status = 404, description = "Suburb not found", body = AppError),
    ),
    tag = "regions"
)]
pub async fn get_region(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = VenueService::new(db);
    let (suburb, venues, neighbours) = service.suburb_detail(&slug, NEIGHBOUR_LIMIT).await?;
    let venues = with_ratings(&service, venues).await?;
    let neighbours = neighbours
        .into_iter()
        .map(|(suburb, distance_km)| NeighbourResponse {
            suburb,
            distance_km,
        })
        .collect();

    Ok(ApiResponse::ok(RegionDetailResponse {
        suburb,
        venues,
        neighbours,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/heatmap",
    params(
        ("grid" = Option<usize>, Query, description = "Cells per side (default 20, max 100)"),
        ("min_lat" = Option<f64>, Query, description = "South edge"),
        ("max_lat" = Option<f64>, Query, description = "North edge"),
        ("min_lng" = Option<f64>, Query, description = "West edge"),
        ("max_lng" = Option<f64>, Query, description = "East edge"),
    ),
    responses(
        (status = 200, description = "Occupied grid cells", body = Heatmap),
        (status = 400, description = "Invalid grid or bounds", body = AppError),
    ),
    tag = "map"
)]
pub async fn heatmap(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<HeatmapQuery>,
) -> AppResult<impl IntoResponse> {
    let resolution = params.grid.unwrap_or(grid::DEFAULT_RESOLUTION);
    if resolution == 0 || resolution > grid::MAX_RESOLUTION {
        return Err(AppError::Validation(format!(
            "grid must be between 1 and {}",
            grid::MAX_RESOLUTION
        )));
    }
    let bounds = params.bounds()?;

    let map = VenueService::new(db).heatmap(bounds, resolution).await?;
    Ok(ApiResponse::ok(map))
}
