//! Suburb index derived from venue rows.
//!
//! Suburbs are not stored; each request groups the venues it fetched by
//! suburb slug and computes a bounding box and mean centroid per group.

use super::{haversine_km, BoundingBox, Coordinate, Located};
use crate::utils::slug::slugify;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Bounding boxes are grown by this many degrees (~500 m) before a
/// containment test so single-venue suburbs still match nearby points.
const CONTAINMENT_PAD_DEG: f64 = 0.005;

pub trait Placed: Located {
    fn suburb(&self) -> &str;
    fn region(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Suburb {
    pub slug: String,
    pub name: String,
    pub region: String,
    pub venue_count: usize,
    pub bounds: Option<BoundingBox>,
    pub centroid: Option<Coordinate>,
}

pub fn index_suburbs<T: Placed>(venues: &[T]) -> Vec<Suburb> {
    struct Acc {
        name: String,
        region: String,
        count: usize,
        coords: Vec<Coordinate>,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for venue in venues {
        let name = venue.suburb().trim();
        let slug = slugify(name);
        if slug.is_empty() {
            continue;
        }
        let acc = groups.entry(slug).or_insert_with(|| Acc {
            name: name.to_string(),
            region: venue.region().trim().to_string(),
            count: 0,
            coords: Vec::new(),
        });
        acc.count += 1;
        if let Some(c) = venue.coordinate().filter(Coordinate::is_finite) {
            acc.coords.push(c);
        }
    }

    let mut suburbs: Vec<Suburb> = groups
        .into_iter()
        .map(|(slug, acc)| {
            let centroid = (!acc.coords.is_empty()).then(|| {
                let n = acc.coords.len() as f64;
                Coordinate::new(
                    acc.coords.iter().map(|c| c.lat).sum::<f64>() / n,
                    acc.coords.iter().map(|c| c.lng).sum::<f64>() / n,
                )
            });
            Suburb {
                slug,
                name: acc.name,
                region: acc.region,
                venue_count: acc.count,
                bounds: BoundingBox::enclosing(acc.coords),
                centroid,
            }
        })
        .collect();

    suburbs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    suburbs
}

/// Suburb whose (slightly padded) bounding box contains `point`; the nearest
/// centroid breaks ties. Falls back to the nearest centroid within
/// `fallback_km` when no box matches.
pub fn suburb_at(suburbs: &[Suburb], point: Coordinate, fallback_km: f64) -> Option<&Suburb> {
    let containing = suburbs.iter().filter(|s| {
        s.bounds.is_some_and(|b| {
            BoundingBox::new(
                b.min_lat - CONTAINMENT_PAD_DEG,
                b.max_lat + CONTAINMENT_PAD_DEG,
                b.min_lng - CONTAINMENT_PAD_DEG,
                b.max_lng + CONTAINMENT_PAD_DEG,
            )
            .contains(point)
        })
    });
    if let Some((suburb, _)) = nearest(point, containing) {
        return Some(suburb);
    }

    nearest(point, suburbs.iter())
        .filter(|(_, d)| *d <= fallback_km)
        .map(|(s, _)| s)
}

fn nearest<'a>(
    point: Coordinate,
    candidates: impl Iterator<Item = &'a Suburb>,
) -> Option<(&'a Suburb, f64)> {
    candidates
        .filter_map(|s| s.centroid.map(|c| (s, haversine_km(point, c))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Other suburbs ordered by centroid distance from `slug`'s centroid.
pub fn neighbours<'a>(suburbs: &'a [Suburb], slug: &str, limit: usize) -> Vec<(&'a Suburb, f64)> {
    let Some(origin) = suburbs
        .iter()
        .find(|s| s.slug == slug)
        .and_then(|s| s.centroid)
    else {
        return Vec::new();
    };

    let mut ranked: Vec<(&Suburb, f64)> = suburbs
        .iter()
        .filter(|s| s.slug != slug)
        .filter_map(|s| s.centroid.map(|c| (s, haversine_km(origin, c))))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    struct V {
        suburb: &'static str,
        coord: Option<Coordinate>,
    }

    impl Located for V {
        fn coordinate(&self) -> Option<Coordinate> {
            self.coord
        }
    }

    impl Placed for V {
        fn suburb(&self) -> &str {
            self.suburb
        }
        fn region(&self) -> &str {
            "NSW"
        }
    }

    fn v(suburb: &'static str, lat: f64, lng: f64) -> V {
        V {
            suburb,
            coord: Some(Coordinate::new(lat, lng)),
        }
    }

    fn fixture() -> Vec<V> {
        vec![
            v("Bondi", -33.891, 151.274),
            v("Bondi", -33.895, 151.270),
            v("Manly", -33.797, 151.285),
            v("Parramatta", -33.815, 151.003),
            V {
                suburb: "Newtown",
                coord: None,
            },
        ]
    }

    #[test]
    fn groups_by_suburb_with_counts() {
        let suburbs = index_suburbs(&fixture());
        let names: Vec<&str> = suburbs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bondi", "Manly", "Newtown", "Parramatta"]);

        let bondi = &suburbs[0];
        assert_eq!(bondi.slug, "bondi");
        assert_eq!(bondi.venue_count, 2);
        let c = bondi.centroid.unwrap();
        assert!((c.lat - -33.893).abs() < 1e-9);

        let newtown = &suburbs[2];
        assert_eq!(newtown.venue_count, 1);
        assert!(newtown.centroid.is_none());
        assert!(newtown.bounds.is_none());
    }

    #[test]
    fn lookup_by_bounding_box() {
        let suburbs = index_suburbs(&fixture());
        let hit = suburb_at(&suburbs, Coordinate::new(-33.893, 151.272), 0.0).unwrap();
        assert_eq!(hit.slug, "bondi");
    }

    #[test]
    fn lookup_falls_back_to_nearest_centroid() {
        let suburbs = index_suburbs(&fixture());
        let near_manly = Coordinate::new(-33.78, 151.28);
        assert_eq!(suburb_at(&suburbs, near_manly, 5.0).unwrap().slug, "manly");
        assert!(suburb_at(&suburbs, near_manly, 0.5).is_none());
    }

    #[test]
    fn neighbours_sorted_by_distance() {
        let suburbs = index_suburbs(&fixture());
        let near = neighbours(&suburbs, "bondi", 5);
        let slugs: Vec<&str> = near.iter().map(|(s, _)| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["manly", "parramatta"]);
    }

    #[test]
    fn neighbours_of_unknown_suburb_is_empty() {
        let suburbs = index_suburbs(&fixture());
        assert!(neighbours(&suburbs, "nowhere", 5).is_empty());
        assert!(neighbours(&suburbs, "newtown", 5).is_empty());
    }
}
