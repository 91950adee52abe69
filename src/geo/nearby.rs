use super::{haversine_km, Coordinate, Located};

pub const DEFAULT_RADIUS_KM: f64 = 25.0;
pub const MAX_RADIUS_KM: f64 = 500.0;

#[derive(Debug, Clone, Copy)]
pub struct Ranked<'a, T> {
    pub item: &'a T,
    pub distance_km: f64,
}

/// Items with coordinates, annotated with their distance from `origin`,
/// nearest first. With a radius, anything farther is dropped. Equal distances
/// keep input order.
pub fn rank_by_distance<'a, T: Located>(
    items: &'a [T],
    origin: Coordinate,
    radius_km: Option<f64>,
) -> Vec<Ranked<'a, T>> {
    let mut ranked: Vec<Ranked<'a, T>> = items
        .iter()
        .filter_map(|item| {
            let coord = item.coordinate()?;
            let distance_km = haversine_km(origin, coord);
            match radius_km {
                Some(r) if distance_km > r => None,
                _ => Some(Ranked { item, distance_km }),
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// 1-based page slice plus the total before slicing.
pub fn paginate<T>(items: Vec<T>, page: u64, per_page: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    if per_page == 0 {
        return (Vec::new(), total);
    }
    let skip = page.saturating_sub(1).saturating_mul(per_page) as usize;
    let page_items = items.into_iter().skip(skip).take(per_page as usize).collect();
    (page_items, total)
}
