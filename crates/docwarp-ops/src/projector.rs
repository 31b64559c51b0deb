//! The `PointProjector` trait: anything that maps 2D source points to 2D
//! destination points, used to build a destination [`crate::grid::ImageGrid`]
//! from a source one.
//!
//! Camera transforms ([`crate::camera`]) and the MLS warp
//! ([`crate::mls`]) both implement this trait; [`crate::grid`] is generic
//! over it rather than depending on either concrete type.

/// Maps source points to destination points. Implementors provide the
/// bulk form; [`PointProjector::project_one`] has a default that calls it
/// with a single-element slice, since every real implementation here
/// batches more efficiently than it iterates.
pub trait PointProjector {
    /// Projects every point in `points`, preserving order.
    fn project_bulk(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)>;

    /// Projects a single point.
    fn project_one(&self, point: (f64, f64)) -> (f64, f64) {
        self.project_bulk(&[point])[0]
    }
}
