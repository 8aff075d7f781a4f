use std::collections::HashMap;

use crate::data::geometry::BBox;

/// Bounding-box grid over region extents.
/// Each region is inserted into every cell its bbox overlaps, so a point
/// query never misses a region; false positives are left to the caller's
/// exact polygon test.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Build from region bounding boxes, in index order
    pub fn build<'a>(bboxes: impl Iterator<Item = &'a BBox>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, bbox) in bboxes.enumerate() {
            let min_cell = grid.to_cell(bbox.min_lon, bbox.min_lat);
            let max_cell = grid.to_cell(bbox.max_lon, bbox.max_lat);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Candidate region indices whose bbox cell covers the point, ascending
    pub fn query_point(&self, lon: f64, lat: f64) -> &[usize] {
        self.cells
            .get(&self.to_cell(lon, lat))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_point_hits_overlapping_cells() {
        let boxes = [
            BBox::new(0.0, 0.0, 25.0, 5.0),
            BBox::new(-40.0, -40.0, -30.0, -30.0),
        ];
        let grid = FeatureGrid::build(boxes.iter(), 10.0);

        assert_eq!(grid.query_point(21.0, 1.0), &[0]);
        assert_eq!(grid.query_point(-35.0, -35.0), &[1]);
        assert!(grid.query_point(100.0, 50.0).is_empty());
    }
}
