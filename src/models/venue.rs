use crate::geo::{regions::Placed, Coordinate, Located};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "venues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,
    pub suburb: String,
    pub region: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub court_type: String,
    pub surface: Option<String>,
    pub court_count: Option<i32>,
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Json,
    // Enrichment block, merged in from the places API.
    pub place_id: Option<String>,
    pub external_rating: Option<f64>,
    pub external_rating_count: Option<i32>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub opening_hours: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub photo_refs: Option<Json>,
    pub enriched_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
    #[sea_orm(has_many = "super::photo::Entity")]
    Photo,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorite,
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl Related<super::photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photo.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorite.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn features(&self) -> Vec<String> {
        string_list(&self.features)
    }

    pub fn opening_hours(&self) -> Vec<String> {
        self.opening_hours.as_ref().map(string_list).unwrap_or_default()
    }

    pub fn photo_refs(&self) -> Vec<String> {
        self.photo_refs.as_ref().map(string_list).unwrap_or_default()
    }
}

fn string_list(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl Located for Model {
    fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }
}

impl Placed for Model {
    fn suburb(&self) -> &str {
        &self.suburb
    }

    fn region(&self) -> &str {
        &self.region
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourtType {
    Indoor,
    Outdoor,
    Hybrid,
}

impl CourtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourtType::Indoor => "indoor",
            CourtType::Outdoor => "outdoor",
            CourtType::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for CourtType {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(CourtType::Indoor),
            "outdoor" => Ok(CourtType::Outdoor),
            "hybrid" => Ok(CourtType::Hybrid),
            other => Err(crate::error::AppError::Validation(format!(
                "court_type must be one of: indoor, outdoor, hybrid (got '{}')",
                other
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) fn fixture(id: i32, name: &str, suburb: &str, coord: Option<(f64, f64)>) -> Model {
    let now = chrono::Utc::now().naive_utc();
    Model {
        id,
        slug: crate::utils::slug::venue_slug(name, suburb),
        name: name.to_string(),
        suburb: suburb.to_string(),
        region: "NSW".to_string(),
        address: None,
        latitude: coord.map(|c| c.0),
        longitude: coord.map(|c| c.1),
        court_type: "outdoor".to_string(),
        surface: None,
        court_count: Some(2),
        features: serde_json::json!([]),
        place_id: None,
        external_rating: None,
        external_rating_count: None,
        phone: None,
        website: None,
        opening_hours: None,
        photo_refs: None,
        enriched_at: None,
        created_at: now,
        updated_at: now,
    }
}
