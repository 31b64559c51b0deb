//! Elevation strategies: rules lifting 2D source coordinates into 3D for
//! subsequent camera projection ([`crate::camera`]).

use docwarp_math::Vec3;

/// Lifts 2D source points into 3D camera-space-ready points.
pub trait ElevationStrategy {
    /// Lifts every point in `points`, preserving order.
    fn lift(&self, points: &[(f64, f64)]) -> Vec<Vec3>;
}

/// S/U-shaped cubic elevation along a rotated axis.
///
/// `alpha`/`beta` are in degrees, clamped to `[-80, 80]` at construction;
/// `direction` is the rotation angle in degrees, `[0, 180]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    /// Curve parameter alpha, in degrees.
    pub alpha_deg: f64,
    /// Curve parameter beta, in degrees.
    pub beta_deg: f64,
    /// Rotation direction, in degrees.
    pub direction_deg: f64,
    /// Output scale multiplier.
    pub scale: f64,
}

impl ElevationStrategy for CubicCurve {
    fn lift(&self, points: &[(f64, f64)]) -> Vec<Vec3> {
        let alpha = self.alpha_deg.clamp(-80.0, 80.0).to_radians();
        let beta = self.beta_deg.clamp(-80.0, 80.0).to_radians();
        let t_alpha = alpha.tan();
        let t_beta = beta.tan();
        let dir = self.direction_deg.to_radians();
        let (cos_d, sin_d) = (dir.cos(), dir.sin());

        // Rotate each point about the origin by `direction` and read off
        // the rotated x-coordinate; only that axis drives the curve.
        let rotated_x: Vec<f64> = points.iter().map(|&(x, y)| x * cos_d + y * sin_d).collect();
        let x_min = rotated_x.iter().cloned().fold(f64::INFINITY, f64::min);
        let x_max = rotated_x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let extent = (x_max - x_min).max(1e-9);

        points
            .iter()
            .zip(rotated_x)
            .map(|(&(x, y), rx)| {
                let s = (rx - x_min) / extent;
                let z = (t_alpha + t_beta) * s.powi(3) - (2.0 * t_alpha + t_beta) * s.powi(2) + t_alpha * s;
                let z = z * extent * self.scale;
                Vec3::new(x as f32, y as f32, z as f32)
            })
            .collect()
    }
}

/// A line in the source plane, given by a point and a direction, stored
/// as a normalized `(a, b, c)` such that `a*x + b*y + c = 0` on the line
/// and `a^2 + b^2 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Line {
    a: f64,
    b: f64,
    c: f64,
}

impl Line {
    fn from_point_direction(point: (f64, f64), direction_deg: f64) -> Self {
        let dir = direction_deg.to_radians();
        // Direction vector (cos, sin); normal is (-sin, cos), already unit length.
        let a = -dir.sin();
        let b = dir.cos();
        let c = -(a * point.0 + b * point.1);
        Self { a, b, c }
    }

    #[inline]
    fn distance(&self, x: f64, y: f64) -> f64 {
        (self.a * x + self.b * y + self.c).abs()
    }
}

/// Fold elevation: a reciprocal-falloff bump along a line, pushing points
/// by a fixed 3-vector weighted by proximity to the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneLineFold {
    /// A point the fold line passes through.
    pub point: (f64, f64),
    /// The fold line's direction, in degrees.
    pub direction_deg: f64,
    /// The 3-vector added (scaled by weight) at the line.
    pub perturb_vec: Vec3,
    /// Falloff sharpness; smaller values concentrate the fold tighter to the line.
    pub alpha: f64,
}

impl ElevationStrategy for PlaneLineFold {
    fn lift(&self, points: &[(f64, f64)]) -> Vec<Vec3> {
        let line = Line::from_point_direction(self.point, self.direction_deg);
        let (h, w) = extent_hw(points);
        let norm = (h * h + w * w).sqrt().max(1e-9);
        points
            .iter()
            .map(|&(x, y)| {
                let d_tilde = line.distance(x, y) / norm;
                let weight = self.alpha / (d_tilde + self.alpha);
                Vec3::new(
                    x as f32 + weight as f32 * self.perturb_vec.x,
                    y as f32 + weight as f32 * self.perturb_vec.y,
                    weight as f32 * self.perturb_vec.z,
                )
            })
            .collect()
    }
}

/// Curve elevation: a saddle/dome-shaped bump along a line, using a
/// power-law falloff clamped to non-negative weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneLineCurve {
    /// A point the curve line passes through.
    pub point: (f64, f64),
    /// The curve line's direction, in degrees.
    pub direction_deg: f64,
    /// The 3-vector added (scaled by weight) at the line.
    pub perturb_vec: Vec3,
    /// Falloff exponent.
    pub alpha: f64,
}

impl ElevationStrategy for PlaneLineCurve {
    fn lift(&self, points: &[(f64, f64)]) -> Vec<Vec3> {
        let line = Line::from_point_direction(self.point, self.direction_deg);
        let (h, w) = extent_hw(points);
        let norm = (h * h + w * w).sqrt().max(1e-9);
        points
            .iter()
            .map(|&(x, y)| {
                let d_tilde = line.distance(x, y) / norm;
                let weight = (1.0 - d_tilde.powf(self.alpha)).max(0.0);
                Vec3::new(
                    x as f32 + weight as f32 * self.perturb_vec.x,
                    y as f32 + weight as f32 * self.perturb_vec.y,
                    weight as f32 * self.perturb_vec.z,
                )
            })
            .collect()
    }
}

fn extent_hw(points: &[(f64, f64)]) -> (f64, f64) {
    let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    (max_y - min_y, max_x - min_x)
}
