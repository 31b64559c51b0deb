//! Small dense linear-algebra solvers used by the perspective and camera
//! transforms: a general Gaussian-elimination solver, a four-point
//! homography fit, and Rodrigues' axis-angle rotation formula.

use crate::{Mat3, Vec3};

/// Solves `A x = b` for a square system via Gaussian elimination with
/// partial pivoting. Returns `None` if `A` is singular to working
/// precision.
pub fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    debug_assert!(a.len() == n && a.iter().all(|row| row.len() == n));

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().partial_cmp(&a[j][col].abs()).unwrap())
            .unwrap();
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

/// Fits the 3x3 perspective matrix `H` mapping each `src[i]` to `dst[i]`
/// (up to homogeneous scale, with `H[2][2] = 1`), given exactly four
/// point correspondences. This is the standard four-point DLT solve
/// behind both the horizontal/vertical skew transforms and the tile
/// blender's per-quad destination-to-source matrix.
///
/// Returns `None` if the four source points are degenerate (no unique
/// homography exists — e.g. three or more collinear).
pub fn solve_perspective_4point(src: [(f64, f64); 4], dst: [(f64, f64); 4]) -> Option<Mat3> {
    let mut a = vec![vec![0.0; 8]; 8];
    let mut b = vec![0.0; 8];

    for i in 0..4 {
        let (x, y) = src[i];
        let (px, py) = dst[i];

        a[2 * i] = vec![x, y, 1.0, 0.0, 0.0, 0.0, -x * px, -y * px];
        b[2 * i] = px;

        a[2 * i + 1] = vec![0.0, 0.0, 0.0, x, y, 1.0, -x * py, -y * py];
        b[2 * i + 1] = py;
    }

    let h = solve_linear_system(a, b)?;
    Some(Mat3::from_rows([
        [h[0] as f32, h[1] as f32, h[2] as f32],
        [h[3] as f32, h[4] as f32, h[5] as f32],
        [h[6] as f32, h[7] as f32, 1.0],
    ]))
}

/// Builds a rotation matrix from an axis-angle pair via Rodrigues'
/// formula: `R = I + sin(theta) K + (1 - cos(theta)) K^2`, where `K` is
/// the skew-symmetric cross-product matrix of the (normalized) axis.
pub fn rodrigues_rotation(axis: Vec3, theta_rad: f32) -> Mat3 {
    let k = axis.normalize();
    let kx = Mat3::from_rows([
        [0.0, -k.z, k.y],
        [k.z, 0.0, -k.x],
        [-k.y, k.x, 0.0],
    ]);
    let kx2 = kx * kx;
    Mat3::IDENTITY + kx * theta_rad.sin() + kx2 * (1.0 - theta_rad.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solves_identity_like_system() {
        let a = vec![vec![2.0, 0.0], vec![0.0, 2.0]];
        let b = vec![4.0, 6.0];
        let x = solve_linear_system(a, b).unwrap();
        assert_relative_eq!(x[0], 2.0);
        assert_relative_eq!(x[1], 3.0);
    }

    #[test]
    fn perspective_fit_recovers_identity() {
        let src = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let h = solve_perspective_4point(src, src).unwrap();
        for &(x, y) in &src {
            let p = h.transform(Vec3::new(x as f32, y as f32, 1.0));
            assert_relative_eq!(p.x / p.z, x as f32, epsilon = 1e-3);
            assert_relative_eq!(p.y / p.z, y as f32, epsilon = 1e-3);
        }
    }

    #[test]
    fn perspective_fit_maps_trapezoid() {
        let src = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let dst = [(2.0, 0.0), (8.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let h = solve_perspective_4point(src, dst).unwrap();
        for i in 0..4 {
            let (x, y) = src[i];
            let p = h.transform(Vec3::new(x as f32, y as f32, 1.0));
            assert_relative_eq!(p.x / p.z, dst[i].0 as f32, epsilon = 1e-2);
            assert_relative_eq!(p.y / p.z, dst[i].1 as f32, epsilon = 1e-2);
        }
    }

    #[test]
    fn rodrigues_identity_at_zero_angle() {
        let r = rodrigues_rotation(Vec3::Z, 0.0);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(r.m[i][j], expected, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn rodrigues_quarter_turn_about_z() {
        let r = rodrigues_rotation(Vec3::Z, std::f32::consts::FRAC_PI_2);
        let v = r.transform(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-5);
    }
}
