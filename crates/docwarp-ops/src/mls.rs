//! Moving-Least-Squares similarity projector: warps points smoothly
//! through a sparse set of source/destination handle correspondences.

use docwarp_core::{Error, Point, Result};

use crate::projector::PointProjector;

/// A similarity-variant MLS projector built from handle point pairs.
///
/// At least 3 handle pairs are required; fewer give an under-determined
/// fit and are rejected at construction.
#[derive(Debug, Clone)]
pub struct SimilarityMls {
    src: Vec<(f64, f64)>,
    dst: Vec<(f64, f64)>,
}

impl SimilarityMls {
    /// Builds a projector from `(x, y)` handle correspondences.
    pub fn new(src: Vec<(f64, f64)>, dst: Vec<(f64, f64)>) -> Result<Self> {
        if src.len() != dst.len() {
            return Err(Error::shape_mismatch(format!(
                "MLS handle point count mismatch: {} src vs {} dst",
                src.len(),
                dst.len()
            )));
        }
        if src.len() < 3 {
            return Err(Error::invalid_config(format!(
                "MLS requires at least 3 handle points, got {}",
                src.len()
            )));
        }
        Ok(Self { src, dst })
    }

    /// Projects a single source point `v` through the similarity MLS
    /// formula, falling through the exact-match short-circuit first.
    pub fn project_point(&self, v: (f64, f64)) -> (f64, f64) {
        for (p, q) in self.src.iter().zip(&self.dst) {
            if *p == v {
                return *q;
            }
        }

        let weights: Vec<f64> = self
            .src
            .iter()
            .map(|p| {
                let dx = v.0 - p.0;
                let dy = v.1 - p.1;
                let dist_sq = dx * dx + dy * dy;
                debug_assert!(dist_sq > 0.0, "non-exact-match point with zero distance to a handle");
                1.0 / dist_sq
            })
            .collect();

        let w_sum: f64 = weights.iter().sum();
        let p_star = (
            self.src.iter().zip(&weights).map(|(p, w)| p.0 * w).sum::<f64>() / w_sum,
            self.src.iter().zip(&weights).map(|(p, w)| p.1 * w).sum::<f64>() / w_sum,
        );
        let q_star = (
            self.dst.iter().zip(&weights).map(|(q, w)| q.0 * w).sum::<f64>() / w_sum,
            self.dst.iter().zip(&weights).map(|(q, w)| q.1 * w).sum::<f64>() / w_sum,
        );

        let p_hats: Vec<(f64, f64)> = self.src.iter().map(|p| (p.0 - p_star.0, p.1 - p_star.1)).collect();
        let q_hats: Vec<(f64, f64)> = self.dst.iter().map(|q| (q.0 - q_star.0, q.1 - q_star.1)).collect();

        let mu: f64 = p_hats
            .iter()
            .zip(&weights)
            .map(|(p, w)| w * (p.0 * p.0 + p.1 * p.1))
            .sum();

        let vc = (v.0 - p_star.0, v.1 - p_star.1);

        // The similarity variant fits a single scale-rotation matrix
        // M = [[a, -b], [b, a]] minimizing the weighted residual
        // Σ w_i |M p_hat_i - q_hat_i|^2; this is linear in (a, b).
        let mut a_num = 0.0;
        let mut b_num = 0.0;
        for i in 0..self.src.len() {
            let w = weights[i];
            let ph = p_hats[i];
            let qh = q_hats[i];
            a_num += w * (qh.0 * ph.0 + qh.1 * ph.1);
            b_num += w * (qh.1 * ph.0 - qh.0 * ph.1);
        }

        if mu.abs() < 1e-12 {
            return q_star;
        }
        let a = a_num / mu;
        let b = b_num / mu;
        (a * vc.0 - b * vc.1 + q_star.0, b * vc.0 + a * vc.1 + q_star.1)
    }
}

impl PointProjector for SimilarityMls {
    fn project_bulk(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points.iter().map(|&p| self.project_point(p)).collect()
    }
}

/// Warps a single point through `mls`, rounding the result to an integer
/// pixel coordinate.
pub fn warp_point(mls: &SimilarityMls, p: Point) -> Point {
    let (x, y) = mls.project_point((p.x as f64, p.y as f64));
    Point::from_f64(y, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_fewer_than_three_handles() {
        assert!(SimilarityMls::new(vec![(0.0, 0.0), (1.0, 1.0)], vec![(0.0, 0.0), (2.0, 2.0)]).is_err());
    }

    #[test]
    fn rejects_mismatched_handle_counts() {
        assert!(SimilarityMls::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], vec![(0.0, 0.0), (1.0, 0.0)]).is_err());
    }

    #[test]
    fn identity_handle_mapping_leaves_handle_points_stationary() {
        let src = vec![(0.0, 0.0), (399.0, 0.0), (0.0, 399.0), (399.0, 399.0)];
        let dst = src.clone();
        let mls = SimilarityMls::new(src.clone(), dst).unwrap();
        for &p in &src {
            let out = mls.project_point(p);
            assert!((out.0 - p.0).abs() < 1.0);
            assert!((out.1 - p.1).abs() < 1.0);
        }
    }

    #[test]
    fn identity_handles_hold_the_whole_grid_near_identity() {
        let src = vec![(0.0, 0.0), (399.0, 0.0), (0.0, 399.0), (399.0, 399.0)];
        let mls = SimilarityMls::new(src.clone(), src.clone()).unwrap();
        for y in (0..400).step_by(20) {
            for x in (0..400).step_by(20) {
                let out = mls.project_point((x as f64, y as f64));
                assert!((out.0 - x as f64).abs() < 1.0, "x mismatch at {x},{y}");
                assert!((out.1 - y as f64).abs() < 1.0, "y mismatch at {x},{y}");
            }
        }
    }

    #[test]
    fn translates_non_handle_point_when_handles_shift() {
        let src = vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)];
        let dst = vec![(10.0, 0.0), (110.0, 0.0), (10.0, 100.0)];
        let mls = SimilarityMls::new(src, dst).unwrap();
        let out = mls.project_point((50.0, 50.0));
        assert!((out.0 - 60.0).abs() < 1e-6);
        assert!((out.1 - 50.0).abs() < 1e-6);
    }
}
