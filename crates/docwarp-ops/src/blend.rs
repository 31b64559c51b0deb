//! The tile blender: paints a destination raster tile-by-tile from a pair
//! of same-shape source/destination lattices, each tile's inverse
//! perspective matrix solved independently from its four corners.
//!
//! Unlike [`crate::affine`]'s closed-form warp, out-of-source samples here
//! are *clipped* to the source bounds rather than zero-filled — the grid
//! only ever asks for a sample near a mapped quad corner, so clipping
//! avoids a visible black seam at the raster edge that a single global
//! matrix warp doesn't have to worry about.

use docwarp_core::{rasterize_polygon, Image, Mask, Polygon, ScoreMap};
use docwarp_math::solve_perspective_4point;

use crate::grid::ImageGrid;
use crate::sampling::{bilinear_multi, bilinear_scalar};

/// Clips a real-valued source coordinate pair to `[0, w-1] x [0, h-1]`.
#[inline]
fn clip_to_bounds(sx: f64, sy: f64, src_h: u32, src_w: u32) -> (f64, f64) {
    (
        sx.clamp(0.0, (src_w - 1) as f64),
        sy.clamp(0.0, (src_h - 1) as f64),
    )
}

/// For each destination pixel covered by quad `dst_corners`, yields
/// `(dx, dy, sx, sy)` where `(sx, sy)` is the (bounds-clipped) source
/// coordinate the inverse perspective matrix maps it to. Skips pixels
/// whose homogeneous divisor `sw` is exactly zero, per the blender's
/// degenerate-tile policy.
fn tile_pixel_map(
    src_corners: [(f64, f64); 4],
    dst_corners: [(f64, f64); 4],
    src_h: u32,
    src_w: u32,
) -> Vec<(u32, u32, f64, f64)> {
    let Some(m) = solve_perspective_4point(dst_corners, src_corners) else {
        return Vec::new();
    };
    let poly = Polygon::new(
        dst_corners
            .iter()
            .map(|&(x, y)| docwarp_core::Point::from_f64(y, x))
            .collect(),
    );
    rasterize_polygon(&poly)
        .into_iter()
        .filter_map(|(dy, dx)| {
            if dy < 0 || dx < 0 {
                return None;
            }
            let p = m.transform(docwarp_math::Vec3::new(dx as f32, dy as f32, 1.0));
            if p.z == 0.0 {
                return None;
            }
            let (sx, sy) = clip_to_bounds((p.x / p.z) as f64, (p.y / p.z) as f64, src_h, src_w);
            Some((dx as u32, dy as u32, sx, sy))
        })
        .collect()
}

/// Warps `src` tile-by-tile from `src_grid` into `dst_grid`'s shape,
/// producing a raster sized to `dst_grid`'s extent (`dst_h x dst_w`).
/// Pixels not covered by any destination tile are left at zero.
pub fn blend_image(src: &Image, src_grid: &ImageGrid, dst_grid: &ImageGrid, dst_h: u32, dst_w: u32) -> Image {
    let mut dst = Image::filled(dst_h, dst_w, src.kind(), 0.0);
    let channels = src.channels();
    let (src_h, src_w) = (src.height(), src.width());
    for (r, c) in src_grid.tile_indices() {
        let src_corners = src_grid.tile_corners(r, c);
        let dst_corners = dst_grid.tile_corners(r, c);
        for (dx, dy, sx, sy) in tile_pixel_map(src_corners, dst_corners, src_h, src_w) {
            let values = bilinear_multi(channels, |x, y| src.sample_raw(x, y), sx, sy);
            dst.set_pixel(dx, dy, &values);
        }
    }
    dst
}

/// [`blend_image`]'s counterpart for [`ScoreMap`] layers: no output
/// clipping, since scores are unconstrained floats.
pub fn blend_score_map(
    src: &ScoreMap,
    src_grid: &ImageGrid,
    dst_grid: &ImageGrid,
    dst_h: u32,
    dst_w: u32,
) -> ScoreMap {
    let mut dst = ScoreMap::from_shape(dst_h, dst_w);
    let (src_h, src_w) = (src.height(), src.width());
    for (r, c) in src_grid.tile_indices() {
        let src_corners = src_grid.tile_corners(r, c);
        let dst_corners = dst_grid.tile_corners(r, c);
        for (dx, dy, sx, sy) in tile_pixel_map(src_corners, dst_corners, src_h, src_w) {
            let value = bilinear_scalar(|x, y| src.sample_raw(x, y), sx, sy);
            dst.set(dx, dy, value);
        }
    }
    dst
}

/// [`blend_image`]'s counterpart for [`Mask`] layers. Bilinear
/// interpolation across a 0/255 boundary produces a smooth ramp rather
/// than a hard edge; this matches the raster warp and is intentional.
pub fn blend_mask(src: &Mask, src_grid: &ImageGrid, dst_grid: &ImageGrid, dst_h: u32, dst_w: u32) -> Mask {
    let mut dst = Mask::from_shape(dst_h, dst_w);
    let (src_h, src_w) = (src.height(), src.width());
    for (r, c) in src_grid.tile_indices() {
        let src_corners = src_grid.tile_corners(r, c);
        let dst_corners = dst_grid.tile_corners(r, c);
        for (dx, dy, sx, sy) in tile_pixel_map(src_corners, dst_corners, src_h, src_w) {
            let value = bilinear_scalar(|x, y| src.sample_raw(x, y), sx, sy);
            dst.set(dx, dy, value.round().clamp(0.0, 1.0) as u8);
        }
    }
    dst
}

/// Marks every pixel the blend actually wrote, as opposed to pixels left
/// at the zero fill: blends an all-ones mask through the same tile
/// pipeline [`blend_image`] uses, rather than rasterizing the grid's
/// outer boundary directly. A boundary-polygon shortcut would disagree
/// with the real per-tile coverage whenever the warp folds a tile
/// outside the lattice's nominal outer ring (steep camera/elevation
/// warps can do this), so this mirrors the actual write pattern exactly.
pub fn active_image_mask(src_grid: &ImageGrid, dst_grid: &ImageGrid, src_h: u32, src_w: u32, dst_h: u32, dst_w: u32) -> Mask {
    let mut ones = Mask::from_shape(src_h, src_w);
    ones.fill_ones();
    blend_mask(&ones, src_grid, dst_grid, dst_h, dst_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docwarp_core::ImageKind;

    struct Identity;
    impl crate::projector::PointProjector for Identity {
        fn project_bulk(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
            points.to_vec()
        }
    }

    #[test]
    fn identity_grid_reproduces_source_within_bilinear_tolerance() {
        let (h, w) = (100, 100);
        let src_grid = ImageGrid::create_source_grid(h, w, 25);
        let (dst_grid, _) = src_grid.project_and_normalize(&Identity, h, w, false);

        let src = Image::filled(h, w, ImageKind::Grayscale, 77.0);
        let dst = blend_image(&src, &src_grid, &dst_grid, h, w);
        assert_eq!(dst.sample_raw(50, 50), vec![77.0]);
    }

    #[test]
    fn blend_never_writes_outside_border_polygon() {
        let (h, w) = (80, 80);
        let src_grid = ImageGrid::create_source_grid(h, w, 20);
        let (dst_grid, _) = src_grid.project_and_normalize(&Identity, h, w, false);
        let mask = active_image_mask(&src_grid, &dst_grid, h, w, h + 40, w + 40);
        // points far outside the (unshifted) grid extent were never written
        assert_eq!(mask.sample_raw(h as i64 + 20, w as i64 + 20), 0.0);
    }

    #[test]
    fn active_mask_covers_full_identity_grid() {
        let (h, w) = (60, 60);
        let src_grid = ImageGrid::create_source_grid(h, w, 20);
        let (dst_grid, _) = src_grid.project_and_normalize(&Identity, h, w, false);
        let mask = active_image_mask(&src_grid, &dst_grid, h, w, h, w);
        assert_eq!(mask.sample_raw(30, 30), 1.0);
    }
}
