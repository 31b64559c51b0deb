//! Shared bilinear resampling, used by both the closed-form matrix warp
//! ([`crate::affine`]) and the mesh tile blender ([`crate::blend`]).
//!
//! `v = (1-u)[(1-t)v00 + t*v01] + u[(1-t)v10 + t*v11]`, `t = sy - floor(sy)`,
//! `u = sx - floor(sx)`.

/// Bilinearly samples a multi-channel source at real coordinates `(sx, sy)`,
/// given a callback returning the raw channel values at an integer pixel
/// (expected to return zeros outside the source, as
/// [`docwarp_core::Image::sample_raw`] does).
pub fn bilinear_multi(channels: usize, sample: impl Fn(i64, i64) -> Vec<f32>, sx: f64, sy: f64) -> Vec<f32> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let u = (sx - x0) as f32;
    let t = (sy - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (x1, y1) = (x0 + 1, y0 + 1);

    let v00 = sample(x0, y0);
    let v01 = sample(x1, y0);
    let v10 = sample(x0, y1);
    let v11 = sample(x1, y1);

    (0..channels)
        .map(|c| {
            let top = (1.0 - u) * v00[c] + u * v01[c];
            let bot = (1.0 - u) * v10[c] + u * v11[c];
            (1.0 - t) * top + t * bot
        })
        .collect()
}

/// Single-channel counterpart of [`bilinear_multi`], used by
/// [`docwarp_core::ScoreMap`] and [`docwarp_core::Mask`].
pub fn bilinear_scalar(sample: impl Fn(i64, i64) -> f32, sx: f64, sy: f64) -> f32 {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let u = (sx - x0) as f32;
    let t = (sy - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);
    let (x1, y1) = (x0 + 1, y0 + 1);

    let v00 = sample(x0, y0);
    let v01 = sample(x1, y0);
    let v10 = sample(x0, y1);
    let v11 = sample(x1, y1);

    let top = (1.0 - u) * v00 + u * v01;
    let bot = (1.0 - u) * v10 + u * v11;
    (1.0 - t) * top + t * bot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_multi_at_integer_coords_matches_source() {
        let grid = vec![vec![0.0f32, 10.0], vec![20.0, 30.0]];
        let sample = |x: i64, y: i64| vec![grid[y.clamp(0, 1) as usize][x.clamp(0, 1) as usize]];
        assert_eq!(bilinear_multi(1, sample, 0.0, 0.0), vec![0.0]);
        assert_eq!(bilinear_multi(1, sample, 1.0, 1.0), vec![30.0]);
    }

    #[test]
    fn bilinear_scalar_interpolates_midpoint() {
        let sample = |x: i64, _y: i64| if x == 0 { 0.0 } else { 10.0 };
        assert_eq!(bilinear_scalar(sample, 0.5, 0.0), 5.0);
    }
}
