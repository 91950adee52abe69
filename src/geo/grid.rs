//! Heat-map grid binning.
//!
//! The bounding box is split into `resolution × resolution` cells. Row indices
//! run along latitude (south to north), column indices along longitude (west
//! to east). Only occupied cells are kept.

use super::{BoundingBox, Coordinate, Located};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

pub const DEFAULT_RESOLUTION: usize = 20;
pub const MAX_RESOLUTION: usize = 100;

/// Ascending point-count thresholds, one per intensity tier.
pub const DEFAULT_TIER_THRESHOLDS: [usize; 4] = [1, 3, 6, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug)]
pub struct GridCell<'a, T> {
    pub index: CellIndex,
    /// Geometric centre of the cell.
    pub centroid: Coordinate,
    pub points: Vec<&'a T>,
}

impl<T> GridCell<'_, T> {
    pub fn count(&self) -> usize {
        self.points.len()
    }
}

#[derive(Debug)]
pub struct HeatGrid<'a, T> {
    pub bounds: BoundingBox,
    pub resolution: usize,
    pub cells: BTreeMap<CellIndex, GridCell<'a, T>>,
}

impl<'a, T> HeatGrid<'a, T> {
    pub fn occupied(&self) -> impl Iterator<Item = &GridCell<'a, T>> {
        self.cells.values()
    }

    pub fn total_points(&self) -> usize {
        self.cells.values().map(GridCell::count).sum()
    }
}

/// Cell for `coord`, or `None` when it falls outside `[0, resolution)` on
/// either axis. Points on the max edge map to `resolution` and are excluded.
pub fn cell_index(coord: Coordinate, bounds: &BoundingBox, resolution: usize) -> Option<CellIndex> {
    let lat_span = bounds.max_lat - bounds.min_lat;
    let lng_span = bounds.max_lng - bounds.min_lng;
    if resolution == 0 || !coord.is_finite() || lat_span <= 0.0 || lng_span <= 0.0 {
        return None;
    }

    let n = resolution as f64;
    let row = ((coord.lat - bounds.min_lat) / lat_span * n).floor();
    let col = ((coord.lng - bounds.min_lng) / lng_span * n).floor();

    if row < 0.0 || col < 0.0 || row >= n || col >= n {
        return None;
    }

    Some(CellIndex {
        row: row as usize,
        col: col as usize,
    })
}

pub fn cell_centroid(index: CellIndex, bounds: &BoundingBox, resolution: usize) -> Coordinate {
    let n = resolution as f64;
    let lat_step = (bounds.max_lat - bounds.min_lat) / n;
    let lng_step = (bounds.max_lng - bounds.min_lng) / n;
    Coordinate::new(
        bounds.min_lat + (index.row as f64 + 0.5) * lat_step,
        bounds.min_lng + (index.col as f64 + 0.5) * lng_step,
    )
}

pub fn bin_points<'a, T: Located>(
    points: &'a [T],
    bounds: &BoundingBox,
    resolution: usize,
) -> HeatGrid<'a, T> {
    let mut cells: BTreeMap<CellIndex, GridCell<'a, T>> = BTreeMap::new();

    for point in points {
        let Some(coord) = point.coordinate() else {
            continue;
        };
        let Some(index) = cell_index(coord, bounds, resolution) else {
            continue;
        };
        cells
            .entry(index)
            .or_insert_with(|| GridCell {
                index,
                centroid: cell_centroid(index, bounds, resolution),
                points: Vec::new(),
            })
            .points
            .push(point);
    }

    HeatGrid {
        bounds: *bounds,
        resolution,
        cells,
    }
}

/// Index of the highest threshold not exceeding `count`; tier 0 otherwise.
pub fn intensity_tier(count: usize, thresholds: &[usize]) -> usize {
    thresholds
        .iter()
        .rposition(|&t| t <= count)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: BoundingBox = BoundingBox::new(0.0, 10.0, 100.0, 110.0);

    #[test]
    fn every_inside_point_lands_in_exactly_one_cell() {
        let points: Vec<Coordinate> = (0..50)
            .map(|i| Coordinate::new(i as f64 * 0.19, 100.0 + i as f64 * 0.17))
            .collect();
        let grid = bin_points(&points, &BOX, 20);

        assert_eq!(grid.total_points(), points.len());
        for cell in grid.occupied() {
            for p in &cell.points {
                assert_eq!(cell_index(**p, &BOX, 20), Some(cell.index));
            }
        }
    }

    #[test]
    fn interpolates_and_floors() {
        assert_eq!(
            cell_index(Coordinate::new(0.0, 100.0), &BOX, 20),
            Some(CellIndex { row: 0, col: 0 })
        );
        assert_eq!(
            cell_index(Coordinate::new(9.99, 109.99), &BOX, 20),
            Some(CellIndex { row: 19, col: 19 })
        );
        assert_eq!(
            cell_index(Coordinate::new(5.2, 101.0), &BOX, 20),
            Some(CellIndex { row: 10, col: 2 })
        );
    }

    #[test]
    fn out_of_range_points_are_excluded() {
        let points = [
            Coordinate::new(-0.5, 105.0),
            Coordinate::new(5.0, 111.0),
            Coordinate::new(10.0, 105.0), // max edge maps to index N
            Coordinate::new(5.0, 105.0),
        ];
        let grid = bin_points(&points, &BOX, 20);
        assert_eq!(grid.total_points(), 1);
        assert_eq!(grid.cells.len(), 1);
    }

    #[test]
    fn points_without_coordinates_are_skipped() {
        struct Maybe(Option<Coordinate>);
        impl Located for Maybe {
            fn coordinate(&self) -> Option<Coordinate> {
                self.0
            }
        }
        let points = [Maybe(None), Maybe(Some(Coordinate::new(1.0, 101.0))), Maybe(None)];
        let grid = bin_points(&points, &BOX, 20);
        assert_eq!(grid.total_points(), 1);
    }

    #[test]
    fn shared_cell_accumulates() {
        let points = [
            Coordinate::new(1.01, 101.01),
            Coordinate::new(1.02, 101.02),
            Coordinate::new(1.03, 101.03),
        ];
        let grid = bin_points(&points, &BOX, 20);
        assert_eq!(grid.cells.len(), 1);
        let cell = grid.occupied().next().unwrap();
        assert_eq!(cell.count(), 3);
        assert_eq!(intensity_tier(cell.count(), &DEFAULT_TIER_THRESHOLDS), 1);
    }

    #[test]
    fn centroid_is_cell_centre() {
        let c = cell_centroid(CellIndex { row: 0, col: 0 }, &BOX, 20);
        assert!((c.lat - 0.25).abs() < 1e-9);
        assert!((c.lng - 100.25).abs() < 1e-9);
    }

    #[test]
    fn degenerate_box_yields_nothing() {
        let flat = BoundingBox::new(1.0, 1.0, 100.0, 110.0);
        let points = [Coordinate::new(1.0, 105.0)];
        assert!(bin_points(&points, &flat, 20).cells.is_empty());
    }

    #[test]
    fn tiers_follow_thresholds() {
        let t = &DEFAULT_TIER_THRESHOLDS;
        assert_eq!(intensity_tier(0, t), 0);
        assert_eq!(intensity_tier(1, t), 0);
        assert_eq!(intensity_tier(2, t), 0);
        assert_eq!(intensity_tier(3, t), 1);
        assert_eq!(intensity_tier(5, t), 1);
        assert_eq!(intensity_tier(6, t), 2);
        assert_eq!(intensity_tier(9, t), 2);
        assert_eq!(intensity_tier(10, t), 3);
        assert_eq!(intensity_tier(250, t), 3);
    }
}
