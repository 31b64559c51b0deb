//! The distortion dispatcher: ties every transform into one config/state
//! surface with a uniform set of per-layer operations.
//!
//! Matrix-based transforms ([`crate::affine`]) and grid-based ones
//! ([`crate::camera`], [`crate::mls`], tiled through [`crate::blend`])
//! are unified behind [`State`] so a caller never has to branch on which
//! kind of transform they picked. [`distort`] is the one-shot entry point;
//! the `distort_*` functions underneath it are also public for callers
//! who want to build [`State`] once and reuse it across many layers.

use rand::{rngs::StdRng, RngCore, SeedableRng};

use docwarp_core::{flatten_polygons, unflatten_polygons, Image, Mask, Point, Polygon, Result, ScoreMap};

use crate::affine::{MatrixState, RotateConfig, ShearHoriConfig, ShearVertConfig, SkewHoriConfig, SkewVertConfig};
use crate::blend;
use crate::camera::{build_camera_model, CameraModelConfig, CameraProjector};
use crate::elevation::{CubicCurve, PlaneLineCurve, PlaneLineFold};
use crate::grid::ImageGrid;
use crate::mls::SimilarityMls;
use crate::projector::PointProjector;

/// The source raster's shape, passed to config generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Source height in pixels.
    pub height: u32,
    /// Source width in pixels.
    pub width: u32,
}

/// Every transform this crate exposes, as one tagged record. A `Config`
/// is cheap to clone and carries no raster data, only parameters.
#[derive(Debug, Clone)]
pub enum Config {
    /// Horizontal shear.
    ShearHori(ShearHoriConfig),
    /// Vertical shear.
    ShearVert(ShearVertConfig),
    /// Clockwise rotation.
    Rotate(RotateConfig),
    /// Horizontal trapezoidal skew.
    SkewHori(SkewHoriConfig),
    /// Vertical trapezoidal skew.
    SkewVert(SkewVertConfig),
    /// Camera projection with S/U-shaped cubic elevation.
    CameraCubicCurve {
        /// The underlying camera model.
        camera: CameraModelConfig,
        /// Curve parameter alpha, in degrees.
        curve_alpha: f64,
        /// Curve parameter beta, in degrees.
        curve_beta: f64,
        /// Rotation direction for the curve axis, in degrees.
        curve_direction: f64,
        /// Output elevation scale multiplier.
        curve_scale: f64,
        /// Source grid lattice step.
        grid_size: u32,
    },
    /// Camera projection with a reciprocal-falloff fold along a line.
    CameraPlaneLineFold {
        /// The underlying camera model.
        camera: CameraModelConfig,
        /// A point the fold line passes through.
        fold_point: (f64, f64),
        /// The fold line's direction, in degrees.
        fold_direction: f64,
        /// The 3-vector added (scaled by weight) at the line.
        fold_perturb_vec: (f64, f64, f64),
        /// Falloff sharpness.
        fold_alpha: f64,
        /// Source grid lattice step.
        grid_size: u32,
    },
    /// Camera projection with a power-law falloff bump along a line.
    CameraPlaneLineCurve {
        /// The underlying camera model.
        camera: CameraModelConfig,
        /// A point the curve line passes through.
        curve_point: (f64, f64),
        /// The curve line's direction, in degrees.
        curve_direction: f64,
        /// The 3-vector added (scaled by weight) at the line.
        curve_perturb_vec: (f64, f64, f64),
        /// Falloff exponent.
        curve_alpha: f64,
        /// Source grid lattice step.
        grid_size: u32,
    },
    /// Similarity-variant moving-least-squares warp through sparse handles.
    SimilarityMls {
        /// Source handle points.
        src_handle_points: Vec<Point>,
        /// Destination handle points, same length and order as `src_handle_points`.
        dst_handle_points: Vec<Point>,
        /// Source grid lattice step.
        grid_size: u32,
        /// Whether the projected grid is rescaled back to the source extent.
        rescale_as_src: bool,
    },
}

/// The resolved, immutable result of building a [`Config`] against a
/// source shape: either a closed-form matrix, or a pair of lattices plus
/// the projector that maps between them.
pub enum State {
    /// Closed-form affine/perspective transform.
    Matrix(MatrixState),
    /// Tile-blended transform driven by a source/destination lattice pair.
    Grid {
        /// The unprojected source lattice.
        src_grid: ImageGrid,
        /// The projected, normalized destination lattice.
        dst_grid: ImageGrid,
        /// Destination canvas size as `(height, width)`.
        dst_size: (u32, u32),
        /// The projector used to build `dst_grid`, reused for single-point
        /// and polygon-vertex projection outside the lattice.
        projector: Box<dyn PointProjector + Send + Sync>,
        /// The `(shift_x, shift_y, scale_x, scale_y)` normalization applied
        /// to every projected grid point, reapplied to ad-hoc points so
        /// they land in the same frame as `dst_grid`.
        adjust: (f64, f64, f64, f64),
    },
}

fn build_grid_state(
    src_grid: ImageGrid,
    projector: impl PointProjector + Send + Sync + 'static,
    src_h: u32,
    src_w: u32,
    rescale_as_src: bool,
) -> State {
    let (dst_grid, adjust) = src_grid.project_and_normalize(&projector, src_h, src_w, rescale_as_src);
    let (_, _, max_x, max_y) = dst_grid.extent();
    let dst_w = (max_x.ceil() as i64 + 1).max(1) as u32;
    let dst_h = (max_y.ceil() as i64 + 1).max(1) as u32;
    State::Grid {
        src_grid,
        dst_grid,
        dst_size: (dst_h, dst_w),
        projector: Box::new(projector),
        adjust,
    }
}

fn apply_adjust(adjust: (f64, f64, f64, f64), p: (f64, f64)) -> (f64, f64) {
    let (shift_x, shift_y, scale_x, scale_y) = adjust;
    ((p.0 + shift_x) * scale_x, (p.1 + shift_y) * scale_y)
}

/// Builds a [`State`] for `config` against a `(src_h, src_w)` source
/// shape. This is the one place every transform's construction funnels
/// through; callers who want to reuse a state across many layers build
/// it once here and pass it to the `distort_*` functions below.
pub fn build_state(config: &Config, src_h: u32, src_w: u32) -> Result<State> {
    match config {
        Config::ShearHori(c) => Ok(State::Matrix(c.build_state(src_h, src_w)?)),
        Config::ShearVert(c) => Ok(State::Matrix(c.build_state(src_h, src_w)?)),
        Config::Rotate(c) => Ok(State::Matrix(c.build_state(src_h, src_w)?)),
        Config::SkewHori(c) => Ok(State::Matrix(c.build_state(src_h, src_w)?)),
        Config::SkewVert(c) => Ok(State::Matrix(c.build_state(src_h, src_w)?)),
        Config::CameraCubicCurve {
            camera,
            curve_alpha,
            curve_beta,
            curve_direction,
            curve_scale,
            grid_size,
        } => {
            let src_grid = ImageGrid::create_source_grid(src_h, src_w, *grid_size);
            let elevation = CubicCurve {
                alpha_deg: *curve_alpha,
                beta_deg: *curve_beta,
                direction_deg: *curve_direction,
                scale: *curve_scale,
            };
            let model = build_camera_model(*camera, &elevation, src_h, src_w, src_grid.points())?;
            let projector = CameraProjector { elevation, camera: model };
            Ok(build_grid_state(src_grid, projector, src_h, src_w, false))
        }
        Config::CameraPlaneLineFold {
            camera,
            fold_point,
            fold_direction,
            fold_perturb_vec,
            fold_alpha,
            grid_size,
        } => {
            let src_grid = ImageGrid::create_source_grid(src_h, src_w, *grid_size);
            let elevation = PlaneLineFold {
                point: *fold_point,
                direction_deg: *fold_direction,
                perturb_vec: docwarp_math::Vec3::new(fold_perturb_vec.0 as f32, fold_perturb_vec.1 as f32, fold_perturb_vec.2 as f32),
                alpha: *fold_alpha,
            };
            let model = build_camera_model(*camera, &elevation, src_h, src_w, src_grid.points())?;
            let projector = CameraProjector { elevation, camera: model };
            Ok(build_grid_state(src_grid, projector, src_h, src_w, false))
        }
        Config::CameraPlaneLineCurve {
            camera,
            curve_point,
            curve_direction,
            curve_perturb_vec,
            curve_alpha,
            grid_size,
        } => {
            let src_grid = ImageGrid::create_source_grid(src_h, src_w, *grid_size);
            let elevation = PlaneLineCurve {
                point: *curve_point,
                direction_deg: *curve_direction,
                perturb_vec: docwarp_math::Vec3::new(curve_perturb_vec.0 as f32, curve_perturb_vec.1 as f32, curve_perturb_vec.2 as f32),
                alpha: *curve_alpha,
            };
            let model = build_camera_model(*camera, &elevation, src_h, src_w, src_grid.points())?;
            let projector = CameraProjector { elevation, camera: model };
            Ok(build_grid_state(src_grid, projector, src_h, src_w, false))
        }
        Config::SimilarityMls {
            src_handle_points,
            dst_handle_points,
            grid_size,
            rescale_as_src,
        } => {
            let src_xy: Vec<(f64, f64)> = src_handle_points.iter().map(|p| p.to_xy()).collect();
            let dst_xy: Vec<(f64, f64)> = dst_handle_points.iter().map(|p| p.to_xy()).collect();
            let mls = SimilarityMls::new(src_xy, dst_xy)?;
            let src_grid = ImageGrid::create_source_grid(src_h, src_w, *grid_size);
            Ok(build_grid_state(src_grid, mls, src_h, src_w, *rescale_as_src))
        }
    }
}

/// Warps a raster. Preserves the source's kind/channel count.
pub fn distort_image(state: &State, src: &Image) -> Result<Image> {
    match state {
        State::Matrix(m) => m.warp_image(src),
        State::Grid { src_grid, dst_grid, dst_size, .. } => {
            let (h, w) = *dst_size;
            Ok(blend::blend_image(src, src_grid, dst_grid, h, w))
        }
    }
}

/// Warps a byte mask layer.
pub fn distort_mask(state: &State, src: &Mask) -> Result<Mask> {
    match state {
        State::Matrix(m) => m.warp_mask(src),
        State::Grid { src_grid, dst_grid, dst_size, .. } => {
            let (h, w) = *dst_size;
            Ok(blend::blend_mask(src, src_grid, dst_grid, h, w))
        }
    }
}

/// Warps a float score-map layer.
pub fn distort_score_map(state: &State, src: &ScoreMap) -> Result<ScoreMap> {
    match state {
        State::Matrix(m) => m.warp_score_map(src),
        State::Grid { src_grid, dst_grid, dst_size, .. } => {
            let (h, w) = *dst_size;
            Ok(blend::blend_score_map(src, src_grid, dst_grid, h, w))
        }
    }
}

/// Byte mask of the same size as [`distort_image`]'s output, marking
/// every pixel the warp actually wrote.
pub fn active_image_mask(state: &State, src_h: u32, src_w: u32) -> Result<Mask> {
    match state {
        State::Matrix(m) => m.active_image_mask(src_h, src_w),
        State::Grid { src_grid, dst_grid, dst_size, .. } => {
            let (h, w) = *dst_size;
            Ok(blend::active_image_mask(src_grid, dst_grid, src_h, src_w, h, w))
        }
    }
}

/// Forward-warps a single point.
pub fn distort_point(state: &State, p: Point) -> Point {
    match state {
        State::Matrix(m) => m.project_point(p),
        State::Grid { projector, adjust, .. } => {
            let (x, y) = apply_adjust(*adjust, projector.project_one(p.to_xy()));
            Point::from_f64(y, x)
        }
    }
}

/// Forward-warps a point list, preserving order.
pub fn distort_points(state: &State, points: &[Point]) -> Vec<Point> {
    match state {
        State::Matrix(m) => m.project_points(&points.to_vec()),
        State::Grid { projector, adjust, .. } => {
            let xy: Vec<(f64, f64)> = points.iter().map(|p| p.to_xy()).collect();
            projector
                .project_bulk(&xy)
                .into_iter()
                .map(|p| {
                    let (x, y) = apply_adjust(*adjust, p);
                    Point::from_f64(y, x)
                })
                .collect()
        }
    }
}

/// Forward-warps a single polygon's vertices. Prefers the state's native
/// polygon-level operation (`MatrixState::project_polygon`) when one
/// exists, falling back to the points-level operation for grid states,
/// which have none.
pub fn distort_polygon(state: &State, polygon: &Polygon) -> Polygon {
    match state {
        State::Matrix(m) => m.project_polygon(polygon),
        State::Grid { .. } => {
            let warped = distort_points(state, polygon.points());
            polygon.with_points(warped)
        }
    }
}

/// Forward-warps every polygon. Prefers the state's native batched
/// polygon operation (`MatrixState::project_polygons`); grid states fall
/// back to flattening across all polygons and warping as one point list,
/// so the result is bit-identical to warping them one at a time (the
/// order preservation invariant).
pub fn distort_polygons(state: &State, polygons: &[Polygon]) -> Vec<Polygon> {
    match state {
        State::Matrix(m) => m.project_polygons(polygons),
        State::Grid { .. } => {
            let (flat, counts) = flatten_polygons(polygons);
            let warped = distort_points(state, &flat);
            unflatten_polygons(warped, &counts)
        }
    }
}

/// Supplied layers for a one-shot [`distort`] call. Any field left `None`
/// is skipped.
#[derive(Debug, Clone, Default)]
pub struct DistortInputs {
    /// The raster to warp.
    pub image: Option<Image>,
    /// A byte mask to warp alongside the raster.
    pub mask: Option<Mask>,
    /// A float score map to warp alongside the raster.
    pub score_map: Option<ScoreMap>,
    /// Label polygons to warp alongside the raster.
    pub polygons: Option<Vec<Polygon>>,
    /// Whether to also compute the active-pixel mask.
    pub want_active_mask: bool,
}

/// Every layer [`distort`] can produce, mirroring [`DistortInputs`].
#[derive(Debug, Clone, Default)]
pub struct DistortResult {
    /// The warped raster, present iff [`DistortInputs::image`] was supplied.
    pub image: Option<Image>,
    /// The warped mask, present iff [`DistortInputs::mask`] was supplied.
    pub mask: Option<Mask>,
    /// The warped score map, present iff [`DistortInputs::score_map`] was supplied.
    pub score_map: Option<ScoreMap>,
    /// The byte mask of pixels the warp wrote, present iff requested.
    pub active_mask: Option<Mask>,
    /// The warped polygons, present iff [`DistortInputs::polygons`] was supplied.
    pub polygons: Option<Vec<Polygon>>,
}

/// One-shot convenience: builds state exactly once and warps every
/// supplied layer through it (the state-reuse invariant).
pub fn distort(config: &Config, src_h: u32, src_w: u32, inputs: DistortInputs) -> Result<DistortResult> {
    let state = build_state(config, src_h, src_w)?;
    Ok(DistortResult {
        image: inputs.image.as_ref().map(|img| distort_image(&state, img)).transpose()?,
        mask: inputs.mask.as_ref().map(|m| distort_mask(&state, m)).transpose()?,
        score_map: inputs
            .score_map
            .as_ref()
            .map(|s| distort_score_map(&state, s))
            .transpose()?,
        polygons: inputs.polygons.as_ref().map(|p| distort_polygons(&state, p)),
        active_mask: if inputs.want_active_mask {
            Some(active_image_mask(&state, src_h, src_w)?)
        } else {
            None
        },
    })
}

/// Resolves a config-generator against a source shape and an optional
/// captured RNG seed, returning both the resolved [`Config`] and the
/// seed used so a caller can persist it for deterministic replay.
///
/// Passing `rng_seed` replays a prior draw exactly; passing `None` draws
/// a fresh seed from OS entropy and hands it back captured, mirroring the
/// "either seed from saved state, or capture current state" contract.
pub fn resolve_config(
    generator: impl Fn(&Shape, &mut StdRng) -> Config,
    shape: Shape,
    rng_seed: Option<[u8; 32]>,
) -> (Config, [u8; 32]) {
    let seed = rng_seed.unwrap_or_else(|| {
        let mut bytes = [0u8; 32];
        StdRng::from_os_rng().fill_bytes(&mut bytes);
        bytes
    });
    let mut rng = StdRng::from_seed(seed);
    (generator(&shape, &mut rng), seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docwarp_core::ImageKind;

    fn gray(h: u32, w: u32, v: f32) -> Image {
        Image::filled(h, w, ImageKind::Grayscale, v)
    }

    #[test]
    fn identity_shear_config_is_identity_on_every_layer() {
        let config = Config::ShearHori(ShearHoriConfig { angle: 0 });
        let src = gray(50, 80, 42.0);
        let result = distort(
            &config,
            50,
            80,
            DistortInputs {
                image: Some(src.clone()),
                want_active_mask: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(result.image.unwrap().sample_raw(10, 10), src.sample_raw(10, 10));
        assert_eq!(result.active_mask.unwrap().sample_raw(10, 10), 1.0);
    }

    #[test]
    fn polygons_warp_matches_single_polygon_warp() {
        let config = Config::Rotate(RotateConfig { angle: 37 });
        let state = build_state(&config, 200, 150).unwrap();
        let poly_a = Polygon::new(vec![Point::new(10, 10), Point::new(10, 50), Point::new(50, 50)]);
        let poly_b = Polygon::new(vec![Point::new(20, 20), Point::new(20, 60)]);
        let via_batch = distort_polygons(&state, &[poly_a.clone(), poly_b.clone()]);
        let via_single_a = distort_polygon(&state, &poly_a);
        let via_single_b = distort_polygon(&state, &poly_b);
        assert_eq!(via_batch[0].points(), via_single_a.points());
        assert_eq!(via_batch[1].points(), via_single_b.points());
    }

    #[test]
    fn mls_warp_leaves_fixed_handle_points_near_stationary() {
        let src = vec![
            Point::new(0, 0),
            Point::new(399, 0),
            Point::new(0, 399),
            Point::new(399, 399),
        ];
        let dst = src.clone();
        let config = Config::SimilarityMls {
            src_handle_points: src.clone(),
            dst_handle_points: dst,
            grid_size: 20,
            rescale_as_src: false,
        };
        let state = build_state(&config, 400, 400).unwrap();
        for p in &src {
            let out = distort_point(&state, *p);
            assert!((out.x - p.x).abs() <= 1);
            assert!((out.y - p.y).abs() <= 1);
        }
    }

    #[test]
    fn camera_distort_image_stays_inside_active_mask() {
        let config = Config::CameraCubicCurve {
            camera: CameraModelConfig {
                rotation_unit_vec: docwarp_math::Vec3::Z,
                rotation_theta_deg: 10.0,
                principal_point: None,
                focal_length: None,
                camera_distance: None,
            },
            curve_alpha: 60.0,
            curve_beta: -60.0,
            curve_direction: 0.0,
            curve_scale: 1.0,
            grid_size: 10,
        };
        let (src_h, src_w) = (400, 400);
        let src = gray(src_h, src_w, 200.0);
        let result = distort(
            &config,
            src_h,
            src_w,
            DistortInputs {
                image: Some(src),
                want_active_mask: true,
                ..Default::default()
            },
        )
        .unwrap();
        let image = result.image.unwrap();
        let active = result.active_mask.unwrap();
        assert_eq!(image.height(), active.height());
        assert_eq!(image.width(), active.width());
        for y in 0..image.height() as i64 {
            for x in 0..image.width() as i64 {
                if active.sample_raw(x, y) == 0.0 {
                    assert_eq!(image.sample_raw(x, y), vec![0.0]);
                }
            }
        }
    }

    #[test]
    fn resolve_config_replays_identical_seed() {
        let shape = Shape { height: 100, width: 100 };
        let make_config = |_: &Shape, rng: &mut StdRng| Config::Rotate(RotateConfig {
            angle: (rng.next_u32() % 360) as i32,
        });
        let (first, seed) = resolve_config(make_config, shape, None);
        let (second, _) = resolve_config(make_config, shape, Some(seed));
        let Config::Rotate(a) = first else { panic!("expected Rotate") };
        let Config::Rotate(b) = second else { panic!("expected Rotate") };
        assert_eq!(a.angle, b.angle);
    }
}
