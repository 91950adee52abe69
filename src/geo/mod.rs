//! Geospatial helpers for the map views.
//!
//! Everything in here is pure and works on slices fetched per request:
//! there is no spatial index and nothing is cached between calls.

pub mod distance;
pub mod grid;
pub mod nearby;
pub mod regions;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use distance::haversine_km;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Anything that may carry a position. Rows without coordinates return `None`
/// and are skipped by every aggregation in this module.
pub trait Located {
    fn coordinate(&self) -> Option<Coordinate>;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(*self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    pub fn enclosing<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        coords
            .into_iter()
            .filter(Coordinate::is_finite)
            .fold(None, |acc: Option<Self>, c| {
                Some(match acc {
                    None => Self::new(c.lat, c.lat, c.lng, c.lng),
                    Some(b) => Self::new(
                        b.min_lat.min(c.lat),
                        b.max_lat.max(c.lat),
                        b.min_lng.min(c.lng),
                        b.max_lng.max(c.lng),
                    ),
                })
            })
    }

    /// Inclusive on every edge.
    pub fn contains(&self, c: Coordinate) -> bool {
        c.lat >= self.min_lat && c.lat <= self.max_lat && c.lng >= self.min_lng && c.lng <= self.max_lng
    }

    /// Grow each side by `fraction` of the span, with a small absolute floor so
    /// a single point still produces a usable box.
    pub fn padded(&self, fraction: f64) -> Self {
        const MIN_PAD_DEG: f64 = 0.001;
        let lat_pad = ((self.max_lat - self.min_lat) * fraction).max(MIN_PAD_DEG);
        let lng_pad = ((self.max_lng - self.min_lng) * fraction).max(MIN_PAD_DEG);
        Self::new(
            self.min_lat - lat_pad,
            self.max_lat + lat_pad,
            self.min_lng - lng_pad,
            self.max_lng + lng_pad,
        )
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        [self.min_lat, self.max_lat, self.min_lng, self.max_lng]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat <= self.max_lat
            && self.min_lng <= self.max_lng
            && (-90.0..=90.0).contains(&self.min_lat)
            && (-90.0..=90.0).contains(&self.max_lat)
            && (-180.0..=180.0).contains(&self.min_lng)
            && (-180.0..=180.0).contains(&self.max_lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_box_covers_all_points() {
        let points = [
            Coordinate::new(-33.9, 151.2),
            Coordinate::new(-33.7, 151.0),
            Coordinate::new(-34.0, 151.3),
        ];
        let b = BoundingBox::enclosing(points).unwrap();
        assert_eq!(b, BoundingBox::new(-34.0, -33.7, 151.0, 151.3));
        assert!(points.iter().all(|p| b.contains(*p)));
    }

    #[test]
    fn enclosing_box_of_nothing_is_none() {
        assert!(BoundingBox::enclosing(Vec::<Coordinate>::new()).is_none());
    }

    #[test]
    fn padded_single_point_has_area() {
        let b = BoundingBox::enclosing([Coordinate::new(-27.47, 153.02)])
            .unwrap()
            .padded(0.05);
        assert!(b.max_lat > b.min_lat);
        assert!(b.max_lng > b.min_lng);
        assert!(b.contains(Coordinate::new(-27.47, 153.02)));
    }

    #[test]
    fn inverted_box_is_invalid() {
        assert!(!BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_valid());
        assert!(BoundingBox::new(0.0, 1.0, 0.0, 1.0).is_valid());
    }
}
