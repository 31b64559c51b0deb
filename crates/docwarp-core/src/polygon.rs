//! Polygon type and the merge modes used when rasterizing polygons into a
//! [`crate::image::Mask`].

use crate::point::{bounding_box, Point};

/// A non-empty ordered ring of points. No implicit closing edge is added;
/// callers that need a closed ring repeat the first point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon from a non-empty point list.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty. Construction from untrusted input
    /// should go through [`Polygon::try_new`] instead.
    pub fn new(points: Vec<Point>) -> Self {
        Self::try_new(points).expect("polygon must have at least one point")
    }

    /// Builds a polygon from a point list, returning `None` if empty.
    pub fn try_new(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Returns the polygon's vertices in order.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A polygon is never empty by construction, but this is kept for
    /// parity with collection APIs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Axis-aligned bounding box as `(min_y, min_x, max_y, max_x)`.
    pub fn bounding_box(&self) -> (i64, i64, i64, i64) {
        bounding_box(&self.points).expect("polygon is non-empty")
    }

    /// Replaces this polygon's points with `new_points`, which must have
    /// the same length. Used by warp operations that transform vertices
    /// in a flattened batch and re-split the results.
    pub fn with_points(&self, new_points: Vec<Point>) -> Self {
        debug_assert_eq!(new_points.len(), self.points.len());
        Self { points: new_points }
    }
}

/// How overlapping polygons combine when rasterized into a [`crate::image::Mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonsMergeMode {
    /// Any pixel covered by at least one polygon is set.
    #[default]
    Union,
    /// Only pixels covered by exactly one polygon are set.
    Distinct,
    /// Only pixels covered by two or more polygons are set.
    Intersection,
}

/// Flattens a slice of polygons into one point batch, alongside the vertex
/// counts needed to re-split a transformed batch back into polygons.
///
/// Grounds the "flatten, transform once, re-split" rule that polygon warps
/// must follow to guarantee identical floating-point results whether
/// invoked with one polygon or many.
pub fn flatten_polygons(polygons: &[Polygon]) -> (Vec<Point>, Vec<usize>) {
    let counts: Vec<usize> = polygons.iter().map(Polygon::len).collect();
    let flat: Vec<Point> = polygons.iter().flat_map(|p| p.points().iter().copied()).collect();
    (flat, counts)
}

/// Inverse of [`flatten_polygons`]: re-splits a flat point batch into
/// polygons using the original per-polygon vertex counts.
pub fn unflatten_polygons(flat: Vec<Point>, counts: &[usize]) -> Vec<Polygon> {
    let mut out = Vec::with_capacity(counts.len());
    let mut iter = flat.into_iter();
    for &n in counts {
        let chunk: Vec<Point> = iter.by_ref().take(n).collect();
        out.push(Polygon::new(chunk));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_matches_vertices() {
        let poly = Polygon::new(vec![
            Point::new(100, 100),
            Point::new(100, 300),
            Point::new(300, 300),
            Point::new(300, 100),
        ]);
        assert_eq!(poly.bounding_box(), (100, 100, 300, 300));
    }

    #[test]
    fn flatten_and_unflatten_roundtrip() {
        let polys = vec![
            Polygon::new(vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1)]),
            Polygon::new(vec![Point::new(5, 5), Point::new(6, 6)]),
        ];
        let (flat, counts) = flatten_polygons(&polys);
        assert_eq!(flat.len(), 5);
        let rebuilt = unflatten_polygons(flat, &counts);
        assert_eq!(rebuilt, polys);
    }

    #[test]
    #[should_panic]
    fn empty_polygon_panics() {
        Polygon::new(vec![]);
    }
}
