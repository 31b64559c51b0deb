//! Point lattices used by the tile blender: a source grid of axis-aligned
//! rectangle corners, and the destination grid it maps to under a
//! [`crate::projector::PointProjector`].

use docwarp_core::{Point, Polygon};

use crate::projector::PointProjector;

/// An `rows x cols` lattice of points, stored row-major as `(x, y)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid {
    rows: usize,
    cols: usize,
    points: Vec<(f64, f64)>,
}

/// Builds the stepped coordinate list for one axis: `[0, step, 2*step,
/// ...]`, with the final entry replaced (if not already exactly `extent`)
/// or appended so the lattice always reaches the far edge.
fn stepped_axis(extent: u32, step: u32) -> Vec<f64> {
    let extent = extent as f64 - 1.0;
    let mut values = Vec::new();
    let mut v = 0.0;
    while v < extent {
        values.push(v);
        v += step as f64;
    }
    match values.last() {
        Some(&last) if last == extent => {}
        Some(_) => values.push(extent),
        None => values.push(extent),
    }
    values
}

impl ImageGrid {
    /// Number of lattice rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of lattice columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All lattice points, row-major, as `(x, y)` pairs.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    fn get(&self, r: usize, c: usize) -> (f64, f64) {
        self.points[r * self.cols + c]
    }

    /// Builds the MxN source lattice for a `height x width` raster with
    /// the given lattice step, per [`stepped_axis`].
    pub fn create_source_grid(height: u32, width: u32, step: u32) -> Self {
        let ys = stepped_axis(height, step);
        let xs = stepped_axis(width, step);
        let mut points = Vec::with_capacity(ys.len() * xs.len());
        for &y in &ys {
            for &x in &xs {
                points.push((x, y));
            }
        }
        Self {
            rows: ys.len(),
            cols: xs.len(),
            points,
        }
    }

    /// Projects this grid through `projector`, normalizes the result to
    /// the origin, and optionally rescales it so its extent matches
    /// `(src_h, src_w)`. Returns the destination grid plus the
    /// `(shift_x, shift_y, scale_x, scale_y)` applied, since MLS state
    /// construction needs to apply the identical adjustment to its
    /// handle points.
    pub fn project_and_normalize(
        &self,
        projector: &dyn PointProjector,
        src_h: u32,
        src_w: u32,
        rescale_as_src: bool,
    ) -> (Self, (f64, f64, f64, f64)) {
        let raw = projector.project_bulk(&self.points);

        let min_x = raw.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = raw.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_x = raw.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = raw.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let shift_x = -min_x;
        let shift_y = -min_y;

        let (scale_x, scale_y) = if rescale_as_src {
            let raw_w = (max_x - min_x).max(1e-9);
            let raw_h = (max_y - min_y).max(1e-9);
            (
                (src_w as f64 - 1.0) / raw_w,
                (src_h as f64 - 1.0) / raw_h,
            )
        } else {
            (1.0, 1.0)
        };

        let points = raw
            .into_iter()
            .map(|(x, y)| ((x + shift_x) * scale_x, (y + shift_y) * scale_y))
            .collect();

        (
            Self {
                rows: self.rows,
                cols: self.cols,
                points,
            },
            (shift_x, shift_y, scale_x, scale_y),
        )
    }

    /// Returns the four corners of tile `(r, c)` (its top-left lattice
    /// index), in consistent winding order `[top-left, top-right,
    /// bottom-right, bottom-left]`. Valid for `r < rows - 1, c < cols - 1`.
    pub fn tile_corners(&self, r: usize, c: usize) -> [(f64, f64); 4] {
        [
            self.get(r, c),
            self.get(r, c + 1),
            self.get(r + 1, c + 1),
            self.get(r + 1, c),
        ]
    }

    /// Iterates over every `(row, col)` tile index in row-major order.
    pub fn tile_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (rows, cols) = (self.rows, self.cols);
        (0..rows.saturating_sub(1)).flat_map(move |r| (0..cols.saturating_sub(1)).map(move |c| (r, c)))
    }

    /// The lattice's outer boundary as a single polygon: top row left to
    /// right, right column top to bottom, bottom row right to left, left
    /// column bottom to top, corners not repeated.
    pub fn border_polygon(&self) -> Polygon {
        let mut pts = Vec::new();
        for c in 0..self.cols {
            pts.push(self.get(0, c));
        }
        for r in 1..self.rows {
            pts.push(self.get(r, self.cols - 1));
        }
        for c in (0..self.cols.saturating_sub(1)).rev() {
            pts.push(self.get(self.rows - 1, c));
        }
        for r in (1..self.rows.saturating_sub(1)).rev() {
            pts.push(self.get(r, 0));
        }
        Polygon::new(
            pts.into_iter()
                .map(|(x, y)| Point::from_f64(y, x))
                .collect(),
        )
    }

    /// `(min_x, min_y, max_x, max_y)` over every lattice point.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let min_x = self.points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = self.points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_x = self.points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = self.points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        (min_x, min_y, max_x, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Identity;
    impl PointProjector for Identity {
        fn project_bulk(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
            points.to_vec()
        }
    }

    struct Shift(f64, f64);
    impl PointProjector for Shift {
        fn project_bulk(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
            points.iter().map(|&(x, y)| (x + self.0, y + self.1)).collect()
        }
    }

    #[test]
    fn source_grid_reaches_far_edges() {
        let grid = ImageGrid::create_source_grid(101, 101, 25);
        let (min_x, min_y, max_x, max_y) = grid.extent();
        assert_eq!((min_x, min_y), (0.0, 0.0));
        assert_eq!((max_x, max_y), (100.0, 100.0));
    }

    #[test]
    fn source_grid_is_cartesian_product_row_major() {
        let grid = ImageGrid::create_source_grid(51, 26, 25);
        assert_eq!(grid.rows() * grid.cols(), grid.points().len());
        assert_eq!(grid.get(0, 0), (0.0, 0.0));
    }

    #[test]
    fn identity_projector_normalizes_to_same_grid() {
        let src = ImageGrid::create_source_grid(100, 100, 50);
        let (dst, (sx, sy, _, _)) = src.project_and_normalize(&Identity, 100, 100, false);
        assert_eq!(sx, 0.0);
        assert_eq!(sy, 0.0);
        assert_eq!(dst.points(), src.points());
    }

    #[test]
    fn shifted_projector_normalizes_back_to_origin() {
        let src = ImageGrid::create_source_grid(100, 100, 50);
        let (dst, _) = src.project_and_normalize(&Shift(37.0, -12.0), 100, 100, false);
        let (min_x, min_y, _, _) = dst.extent();
        assert!(min_x.abs() < 1e-9);
        assert!(min_y.abs() < 1e-9);
    }

    #[test]
    fn border_polygon_has_no_duplicate_corners() {
        let grid = ImageGrid::create_source_grid(101, 101, 50);
        let border = grid.border_polygon();
        let perimeter = 2 * (grid.rows() + grid.cols()) - 4;
        assert_eq!(border.len(), perimeter);
    }

    #[test]
    fn tile_indices_cover_every_quad() {
        let grid = ImageGrid::create_source_grid(101, 51, 50);
        let count = grid.tile_indices().count();
        assert_eq!(count, (grid.rows() - 1) * (grid.cols() - 1));
    }

    #[test]
    fn tile_corners_form_axis_aligned_rectangle_for_source_grid() {
        let grid = ImageGrid::create_source_grid(101, 101, 50);
        let corners = grid.tile_corners(0, 0);
        assert_eq!(corners[0], (0.0, 0.0));
        assert_eq!(corners[1].1, corners[0].1);
        assert_eq!(corners[2].0, corners[1].0);
        assert_eq!(corners[3].1, corners[2].1);
    }
}
