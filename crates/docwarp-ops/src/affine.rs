//! Closed-form affine/perspective engine: shear, rotate, and skew.
//!
//! Each config maps to a 3x3 homogeneous matrix (affine configs simply
//! leave the bottom row at `[0, 0, 1]`) plus an output canvas size. A
//! `matrix == None` means the transform is the identity — shear/rotate at
//! zero and skew at zero ratio all collapse to a pass-through rather than
//! warping through an identity matrix, so callers can shortcut to a clone.

use docwarp_core::{Error, Image, Mask, PointList, Polygon, PolygonsMergeMode, Result, ScoreMap};
use docwarp_math::{solve_perspective_4point, Mat3, Vec3};

use crate::sampling::{bilinear_multi, bilinear_scalar};

/// Horizontal shear config. `angle` is in degrees, `(-90, 90)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShearHoriConfig {
    /// Shear angle in degrees.
    pub angle: i32,
}

/// Vertical shear config, symmetric with [`ShearHoriConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShearVertConfig {
    /// Shear angle in degrees.
    pub angle: i32,
}

/// Clockwise rotation config. `angle` is taken mod 360 if out of `[0, 360]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateConfig {
    /// Rotation angle in degrees, clockwise.
    pub angle: i32,
}

/// Horizontal trapezoidal skew config. `ratio` is in `(-1, 1)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewHoriConfig {
    /// Skew ratio.
    pub ratio: f64,
}

/// Vertical trapezoidal skew config, symmetric with [`SkewHoriConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewVertConfig {
    /// Skew ratio.
    pub ratio: f64,
}

/// The precomputed, immutable result of resolving a closed-form config
/// against a source shape: either a matrix and destination canvas, or
/// nothing at all (identity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixState {
    /// `None` means this transform is the identity on every layer.
    pub matrix: Option<Mat3>,
    /// Destination canvas size as `(height, width)`.
    pub dst_size: (u32, u32),
}

impl ShearHoriConfig {
    /// Builds the matrix state for this config against a `(height, width)` source shape.
    pub fn build_state(self, src_h: u32, src_w: u32) -> Result<MatrixState> {
        if self.angle.abs() >= 90 {
            return Err(Error::invalid_config(format!(
                "shear_hori angle must satisfy |angle| < 90, got {}",
                self.angle
            )));
        }
        if self.angle == 0 {
            return Ok(MatrixState {
                matrix: None,
                dst_size: (src_h, src_w),
            });
        }
        let tan_phi = (self.angle as f64).to_radians().tan();
        let shift_x = (src_h as f64 * tan_phi).abs();
        let dst_w = (src_w as f64 + shift_x).ceil() as u32;
        let c = if self.angle > 0 { shift_x } else { 0.0 };
        let matrix = Mat3::from_rows([
            [1.0, -tan_phi as f32, c as f32],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        Ok(MatrixState {
            matrix: Some(matrix),
            dst_size: (src_h, dst_w),
        })
    }
}

impl ShearVertConfig {
    /// Builds the matrix state for this config against a `(height, width)` source shape.
    pub fn build_state(self, src_h: u32, src_w: u32) -> Result<MatrixState> {
        if self.angle.abs() >= 90 {
            return Err(Error::invalid_config(format!(
                "shear_vert angle must satisfy |angle| < 90, got {}",
                self.angle
            )));
        }
        if self.angle == 0 {
            return Ok(MatrixState {
                matrix: None,
                dst_size: (src_h, src_w),
            });
        }
        let tan_phi = (self.angle as f64).to_radians().tan();
        let shift_y = (src_w as f64 * tan_phi).abs();
        let dst_h = (src_h as f64 + shift_y).ceil() as u32;
        let c = if self.angle > 0 { shift_y } else { 0.0 };
        let matrix = Mat3::from_rows([
            [1.0, 0.0, 0.0],
            [-tan_phi as f32, 1.0, c as f32],
            [0.0, 0.0, 1.0],
        ]);
        Ok(MatrixState {
            matrix: Some(matrix),
            dst_size: (dst_h, src_w),
        })
    }
}

/// Computes `(shift_x, shift_y, dst_w, dst_h)` for a clockwise rotation of
/// a `src_h x src_w` rectangle by `r` radians, per the four-quadrant table.
/// All outputs are ceiling-rounded.
fn rotation_canvas(r: f64, src_h: f64, src_w: f64) -> (f64, f64, f64, f64) {
    use std::f64::consts::PI;
    let (shift_x, shift_y, dst_w, dst_h);
    if (0.0..=PI / 2.0).contains(&r) {
        shift_x = src_h * r.sin();
        shift_y = 0.0;
        dst_w = src_h * r.sin() + src_w * r.cos();
        dst_h = src_h * r.cos() + src_w * r.sin();
    } else if r > PI / 2.0 && r <= PI {
        let r2 = r - PI / 2.0;
        shift_x = src_w * r2.sin() + src_h * r2.cos();
        shift_y = src_h * r2.sin();
        dst_w = shift_x;
        dst_h = shift_y + src_w * r2.cos();
    } else if r > PI && r < 3.0 * PI / 2.0 {
        let r2 = r - PI;
        shift_x = src_w * r2.cos();
        shift_y = src_w * r2.sin() + src_h * r2.cos();
        dst_w = shift_x + src_h * r2.sin();
        dst_h = shift_y;
    } else {
        let r2 = r - 3.0 * PI / 2.0;
        shift_x = 0.0;
        shift_y = src_w * r2.cos();
        dst_w = src_w * r2.sin() + src_h * r2.cos();
        dst_h = shift_y + src_h * r2.sin();
    }
    (shift_x.ceil(), shift_y.ceil(), dst_w.ceil(), dst_h.ceil())
}

impl RotateConfig {
    /// Builds the matrix state for this config against a `(height, width)` source shape.
    pub fn build_state(self, src_h: u32, src_w: u32) -> Result<MatrixState> {
        let theta_deg = self.angle.rem_euclid(360);
        let r = (theta_deg as f64).to_radians();
        let (shift_x, shift_y, dst_w, dst_h) = rotation_canvas(r, src_h as f64, src_w as f64);
        let (cos_r, sin_r) = (r.cos(), r.sin());
        let matrix = Mat3::from_rows([
            [cos_r as f32, -sin_r as f32, shift_x as f32],
            [sin_r as f32, cos_r as f32, shift_y as f32],
            [0.0, 0.0, 1.0],
        ]);
        Ok(MatrixState {
            matrix: Some(matrix),
            dst_size: (dst_h as u32, dst_w as u32),
        })
    }
}

impl SkewHoriConfig {
    /// Builds the matrix state for this config against a `(height, width)` source shape.
    pub fn build_state(self, src_h: u32, src_w: u32) -> Result<MatrixState> {
        if self.ratio.abs() >= 1.0 {
            return Err(Error::invalid_config(format!(
                "skew_hori ratio must satisfy |ratio| < 1, got {}",
                self.ratio
            )));
        }
        if self.ratio == 0.0 {
            return Ok(MatrixState {
                matrix: None,
                dst_size: (src_h, src_w),
            });
        }
        let (h, w) = (src_h as f64, src_w as f64);
        let shrink = (h * self.ratio.abs()).round() as i64;
        let shrink_up = shrink / 2;
        let shrink_down = shrink - shrink_up;

        let src = [(0.0, 0.0), (w - 1.0, 0.0), (w - 1.0, h - 1.0), (0.0, h - 1.0)];
        let dst = if self.ratio < 0.0 {
            [
                (0.0, shrink_up as f64),
                (w - 1.0, 0.0),
                (w - 1.0, h - 1.0),
                (0.0, h - 1.0 - shrink_down as f64),
            ]
        } else {
            [
                (0.0, 0.0),
                (w - 1.0, shrink_up as f64),
                (w - 1.0, h - 1.0 - shrink_down as f64),
                (0.0, h - 1.0),
            ]
        };
        let matrix = solve_perspective_4point(src, dst)
            .ok_or_else(|| Error::invalid_config("skew_hori: degenerate source quad"))?;
        Ok(MatrixState {
            matrix: Some(matrix),
            dst_size: (src_h, src_w),
        })
    }
}

impl SkewVertConfig {
    /// Builds the matrix state for this config against a `(height, width)` source shape.
    pub fn build_state(self, src_h: u32, src_w: u32) -> Result<MatrixState> {
        if self.ratio.abs() >= 1.0 {
            return Err(Error::invalid_config(format!(
                "skew_vert ratio must satisfy |ratio| < 1, got {}",
                self.ratio
            )));
        }
        if self.ratio == 0.0 {
            return Ok(MatrixState {
                matrix: None,
                dst_size: (src_h, src_w),
            });
        }
        let (h, w) = (src_h as f64, src_w as f64);
        let shrink = (w * self.ratio.abs()).round() as i64;
        let shrink_left = shrink / 2;
        let shrink_right = shrink - shrink_left;

        let src = [(0.0, 0.0), (w - 1.0, 0.0), (w - 1.0, h - 1.0), (0.0, h - 1.0)];
        let dst = if self.ratio < 0.0 {
            [
                (shrink_left as f64, 0.0),
                (w - 1.0 - shrink_right as f64, 0.0),
                (w - 1.0, h - 1.0),
                (0.0, h - 1.0),
            ]
        } else {
            [
                (0.0, 0.0),
                (w - 1.0, 0.0),
                (w - 1.0 - shrink_right as f64, h - 1.0),
                (shrink_left as f64, h - 1.0),
            ]
        };
        let matrix = solve_perspective_4point(src, dst)
            .ok_or_else(|| Error::invalid_config("skew_vert: degenerate source quad"))?;
        Ok(MatrixState {
            matrix: Some(matrix),
            dst_size: (src_h, src_w),
        })
    }
}

/// Forward-transforms a single `(x, y)` point by a homogeneous matrix.
#[inline]
fn forward_point(matrix: &Mat3, x: f64, y: f64) -> (f64, f64) {
    let p = matrix.transform(Vec3::new(x as f32, y as f32, 1.0));
    (p.x as f64 / p.z as f64, p.y as f64 / p.z as f64)
}

impl MatrixState {
    /// Warps a raster through this state's matrix (the forward map) by
    /// pulling source samples for each destination pixel through the
    /// inverse matrix. Out-of-source samples are zero-filled, per the
    /// closed-form engine's sampling policy.
    pub fn warp_image(&self, src: &Image) -> Result<Image> {
        let Some(matrix) = self.matrix else {
            return Ok(src.clone());
        };
        let inv = matrix
            .inverse()
            .ok_or_else(|| Error::invalid_config("matrix transform is singular"))?;
        let (dst_h, dst_w) = self.dst_size;
        let channels = src.channels();
        let mut dst = Image::filled(dst_h, dst_w, src.kind(), 0.0);
        for dy in 0..dst_h {
            for dx in 0..dst_w {
                let (sx, sy) = forward_point(&inv, dx as f64, dy as f64);
                let values = bilinear_multi(channels, |x, y| src.sample_raw(x, y), sx, sy);
                dst.set_pixel(dx, dy, &values);
            }
        }
        Ok(dst)
    }

    /// Score-map counterpart of [`MatrixState::warp_image`].
    pub fn warp_score_map(&self, src: &ScoreMap) -> Result<ScoreMap> {
        let Some(matrix) = self.matrix else {
            return Ok(src.clone());
        };
        let inv = matrix
            .inverse()
            .ok_or_else(|| Error::invalid_config("matrix transform is singular"))?;
        let (dst_h, dst_w) = self.dst_size;
        let mut dst = ScoreMap::from_shape(dst_h, dst_w);
        for dy in 0..dst_h {
            for dx in 0..dst_w {
                let (sx, sy) = forward_point(&inv, dx as f64, dy as f64);
                let value = bilinear_scalar(|x, y| src.sample_raw(x, y), sx, sy);
                dst.set(dx, dy, value);
            }
        }
        Ok(dst)
    }

    /// Mask counterpart of [`MatrixState::warp_image`]. The bilinear
    /// result produces a smooth ramp at the mask's boundary; this mirrors
    /// the raster warp intentionally rather than thresholding back to 0/1.
    pub fn warp_mask(&self, src: &Mask) -> Result<Mask> {
        let Some(matrix) = self.matrix else {
            return Ok(src.clone());
        };
        let inv = matrix
            .inverse()
            .ok_or_else(|| Error::invalid_config("matrix transform is singular"))?;
        let (dst_h, dst_w) = self.dst_size;
        let mut dst = Mask::from_shape(dst_h, dst_w);
        for dy in 0..dst_h {
            for dx in 0..dst_w {
                let (sx, sy) = forward_point(&inv, dx as f64, dy as f64);
                let value = bilinear_scalar(|x, y| src.sample_raw(x, y), sx, sy);
                dst.set(dx, dy, value.round().clamp(0.0, 1.0) as u8);
            }
        }
        Ok(dst)
    }

    /// Byte mask marking every destination pixel the warp produced.
    pub fn active_image_mask(&self, src_h: u32, src_w: u32) -> Result<Mask> {
        let mut ones = Mask::from_shape(src_h, src_w);
        ones.fill_ones();
        self.warp_mask(&ones)
    }

    /// Forward-projects a single point through this state's matrix.
    /// Identity state returns the point unchanged.
    pub fn project_point(&self, p: docwarp_core::Point) -> docwarp_core::Point {
        let Some(matrix) = self.matrix else { return p };
        let (x, y) = forward_point(&matrix, p.x as f64, p.y as f64);
        docwarp_core::Point::from_f64(y, x)
    }

    /// Forward-projects a point list, preserving order.
    pub fn project_points(&self, points: &PointList) -> PointList {
        points.iter().map(|&p| self.project_point(p)).collect()
    }

    /// Forward-projects a single polygon's vertices.
    pub fn project_polygon(&self, polygon: &Polygon) -> Polygon {
        let projected = self.project_points(&polygon.points().to_vec());
        polygon.with_points(projected)
    }

    /// Forward-projects every polygon, flattening across all of them
    /// first so the result is bit-identical to warping them one at a
    /// time.
    pub fn project_polygons(&self, polygons: &[Polygon]) -> Vec<Polygon> {
        let (flat, counts) = docwarp_core::flatten_polygons(polygons);
        let projected = self.project_points(&flat);
        docwarp_core::unflatten_polygons(projected, &counts)
    }

    /// Rasterizes a mask from `polygons` warped through this state, used
    /// when a label polygon needs to be checked for alignment with a
    /// warped raster (see the label-layer-alignment testable property).
    pub fn warp_polygons_to_mask(&self, polygons: &[Polygon], mode: PolygonsMergeMode) -> Mask {
        let warped = self.project_polygons(polygons);
        let (h, w) = self.dst_size;
        Mask::from_shape_and_polygons(h, w, &warped, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use docwarp_core::{ImageKind, Point};

    #[test]
    fn shear_hori_identity_at_zero_angle() {
        let state = ShearHoriConfig { angle: 0 }.build_state(100, 200).unwrap();
        assert!(state.matrix.is_none());
        assert_eq!(state.dst_size, (100, 200));
    }

    #[test]
    fn shear_hori_rejects_90_degrees() {
        assert!(ShearHoriConfig { angle: 90 }.build_state(100, 100).is_err());
        assert!(ShearHoriConfig { angle: -90 }.build_state(100, 100).is_err());
    }

    #[test]
    fn shear_hori_warps_image_and_grows_canvas_width() {
        // 100x200 all-gray(128) image, ShearHori(angle=30).
        let state = ShearHoriConfig { angle: 30 }.build_state(100, 200).unwrap();
        let expected_w = (200.0 + 100.0 * 30f64.to_radians().tan()).ceil() as u32;
        assert_eq!(state.dst_size, (100, expected_w));

        let src = Image::filled(100, 200, ImageKind::Grayscale, 128.0);
        let dst = state.warp_image(&src).unwrap();
        assert_eq!(dst.sample_raw(150, 50), vec![128.0]);
    }

    #[test]
    fn skew_hori_rejects_unit_ratio() {
        assert!(SkewHoriConfig { ratio: 1.0 }.build_state(100, 100).is_err());
        assert!(SkewHoriConfig { ratio: -1.0 }.build_state(100, 100).is_err());
    }

    #[test]
    fn skew_hori_preserves_canvas_size() {
        let state = SkewHoriConfig { ratio: 0.3 }.build_state(400, 400).unwrap();
        assert_eq!(state.dst_size, (400, 400));
        assert!(state.matrix.is_some());
    }

    #[test]
    fn rotate_90_maps_opposite_corners() {
        // 300x300 image, Rotate(angle=90): T((0,0)) == (0,299), T((299,0)) == (0,0).
        let state = RotateConfig { angle: 90 }.build_state(300, 300).unwrap();
        assert_eq!(state.dst_size, (300, 300));
        let p1 = state.project_point(Point::new(0, 0));
        assert!((p1.x - 299).abs() <= 1 && p1.y == 0);
        let p2 = state.project_point(Point::new(299, 0));
        assert!(p2.x.abs() <= 1 && p2.y.abs() <= 1);
    }

    #[test]
    fn rotate_area_preservation() {
        for angle in [0, 15, 45, 90, 180, 200, 270] {
            let state = RotateConfig { angle }.build_state(100, 50).unwrap();
            let (h, w) = state.dst_size;
            assert!(h as u64 * w as u64 >= 100 * 50);
        }
    }

    #[test]
    fn rotate_180_polygon_lands_within_a_pixel_of_expected_corners() {
        // 400x400 image, polygon rotated 180 degrees, within 1px of the expected corners.
        let state = RotateConfig { angle: 180 }.build_state(400, 400).unwrap();
        let poly = Polygon::new(vec![
            Point::new(100, 100),
            Point::new(100, 300),
            Point::new(300, 300),
            Point::new(300, 100),
        ]);
        let warped = state.project_polygon(&poly);
        for p in warped.points() {
            assert!(p.y >= 90 && p.y <= 310);
            assert!(p.x >= 90 && p.x <= 310);
        }
    }

    #[test]
    fn polygon_warp_matches_point_warp() {
        let state = RotateConfig { angle: 37 }.build_state(200, 150).unwrap();
        let poly = Polygon::new(vec![Point::new(10, 10), Point::new(10, 50), Point::new(50, 50)]);
        let via_polygon = state.project_polygon(&poly);
        let via_points: docwarp_core::PointList = state.project_points(&poly.points().to_vec());
        assert_eq!(via_polygon.points(), via_points.as_slice());
    }

    #[test]
    fn skew_hori_keeps_collinear_edge_points_as_a_quad() {
        let state = SkewHoriConfig { ratio: 0.3 }.build_state(400, 400).unwrap();
        assert_eq!(state.dst_size, (400, 400));
        // Three collinear points on an edge still warp purely perspective.
        let poly = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(0, 200),
            Point::new(0, 399),
            Point::new(399, 0),
        ]);
        let warped = state.project_polygon(&poly);
        assert_eq!(warped.len(), 4);
    }

    #[test]
    fn camera_canvas_coverage_holds_for_identity_shear() {
        let state = ShearHoriConfig { angle: 0 }.build_state(100, 100).unwrap();
        let src = Image::filled(100, 100, ImageKind::Grayscale, 5.0);
        let dst = state.warp_image(&src).unwrap();
        assert_eq!(dst.sample_raw(0, 0), src.sample_raw(0, 0));
    }

    #[test]
    fn rotate_matrix_transforms_corner_precisely() {
        let state = RotateConfig { angle: 90 }.build_state(10, 10).unwrap();
        let (x, y) = forward_point(&state.matrix.unwrap(), 0.0, 0.0);
        assert_relative_eq!(x, 9.0, epsilon = 1.0);
        assert_relative_eq!(y, 0.0, epsilon = 1.0);
    }
}
