//! Raster primitives: [`Image`], [`ScoreMap`], [`Mask`].
//!
//! Channel count and dtype are both runtime properties here, not
//! compile-time generics: a warp operates on whatever raster it is handed,
//! and the dispatcher must be able to hold an `Image` of unknown kind
//! alongside a `ScoreMap` and a `Mask` in the same call. Each type stores
//! its buffer behind an `Arc` so cloning a raster before a warp (the
//! common "keep the original, warp a copy" pattern) is cheap until the
//! clone is actually written to.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::polygon::{Polygon, PolygonsMergeMode};

/// The declared set of image kinds and their GCN (globally-contrast-
/// normalized) float variants.
///
/// Dtype is inferred from kind: the three base kinds are byte images, the
/// `*Gcn` variants are 32-bit float. Conversion between a base kind and
/// its `Gcn` variant is a normalization, implemented directly on
/// [`Image`]; conversion between unrelated kinds (e.g. RGB to HSV) is a
/// colorimetric transform and is intentionally not implemented here — it
/// belongs to an external collaborator and is reported as
/// [`Error::UnsupportedKind`] if requested through [`Image::convert_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// 3-channel RGB, byte.
    Rgb,
    /// 4-channel RGBA, byte.
    Rgba,
    /// 3-channel HSV, byte.
    Hsv,
    /// 1-channel grayscale, byte.
    Grayscale,
    /// Globally-contrast-normalized float variant of [`ImageKind::Rgb`].
    RgbGcn,
    /// Globally-contrast-normalized float variant of [`ImageKind::Hsv`].
    HsvGcn,
    /// Globally-contrast-normalized float variant of [`ImageKind::Grayscale`].
    GrayscaleGcn,
}

impl ImageKind {
    /// Number of channels for this kind.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb | Self::RgbGcn | Self::Hsv | Self::HsvGcn => 3,
            Self::Rgba => 4,
            Self::Grayscale | Self::GrayscaleGcn => 1,
        }
    }

    /// Whether this kind stores 32-bit float samples (GCN variants) as
    /// opposed to byte samples.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::RgbGcn | Self::HsvGcn | Self::GrayscaleGcn)
    }

    /// The GCN counterpart of a byte kind, if one exists.
    #[inline]
    pub const fn to_gcn(self) -> Option<Self> {
        match self {
            Self::Rgb => Some(Self::RgbGcn),
            Self::Hsv => Some(Self::HsvGcn),
            Self::Grayscale => Some(Self::GrayscaleGcn),
            _ => None,
        }
    }

    /// The byte counterpart of a GCN kind, if one exists.
    #[inline]
    pub const fn to_non_gcn(self) -> Option<Self> {
        match self {
            Self::RgbGcn => Some(Self::Rgb),
            Self::HsvGcn => Some(Self::Hsv),
            Self::GrayscaleGcn => Some(Self::Grayscale),
            _ => None,
        }
    }
}

/// A pixel matrix with a declared [`ImageKind`].
#[derive(Debug, Clone)]
pub struct Image {
    height: u32,
    width: u32,
    kind: ImageKind,
    bytes: Arc<Vec<u8>>,
    floats: Arc<Vec<f32>>,
}

impl Image {
    /// Creates an image filled with a single value, repeated across every
    /// channel of every pixel.
    pub fn filled(height: u32, width: u32, kind: ImageKind, value: f32) -> Self {
        let len = height as usize * width as usize * kind.channels();
        if kind.is_float() {
            Self {
                height,
                width,
                kind,
                bytes: Arc::new(Vec::new()),
                floats: Arc::new(vec![value; len]),
            }
        } else {
            Self {
                height,
                width,
                kind,
                bytes: Arc::new(vec![value.round().clamp(0.0, 255.0) as u8; len]),
                floats: Arc::new(Vec::new()),
            }
        }
    }

    /// Creates an image from raw byte data. Errors if `kind` is a float
    /// kind or the buffer length doesn't match `height * width * channels`.
    pub fn from_bytes(height: u32, width: u32, kind: ImageKind, data: Vec<u8>) -> Result<Self> {
        if kind.is_float() {
            return Err(Error::invalid_config(format!(
                "{kind:?} is a float kind; use from_floats"
            )));
        }
        let expected = height as usize * width as usize * kind.channels();
        if data.len() != expected {
            return Err(Error::shape_mismatch(format!(
                "expected {expected} bytes for {height}x{width}x{}, got {}",
                kind.channels(),
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            kind,
            bytes: Arc::new(data),
            floats: Arc::new(Vec::new()),
        })
    }

    /// Creates an image from raw float data. Errors if `kind` is a byte
    /// kind or the buffer length doesn't match `height * width * channels`.
    pub fn from_floats(height: u32, width: u32, kind: ImageKind, data: Vec<f32>) -> Result<Self> {
        if !kind.is_float() {
            return Err(Error::invalid_config(format!(
                "{kind:?} is a byte kind; use from_bytes"
            )));
        }
        let expected = height as usize * width as usize * kind.channels();
        if data.len() != expected {
            return Err(Error::shape_mismatch(format!(
                "expected {expected} floats for {height}x{width}x{}, got {}",
                kind.channels(),
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            kind,
            bytes: Arc::new(Vec::new()),
            floats: Arc::new(data),
        })
    }

    /// Image height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Image width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// The image's declared kind.
    #[inline]
    pub const fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Number of channels, derived from [`ImageKind`].
    #[inline]
    pub const fn channels(&self) -> usize {
        self.kind.channels()
    }

    /// Returns this pixel's channel values as `f32`, regardless of the
    /// underlying byte/float storage. Coordinates outside the image
    /// return a zero vector rather than panicking — the tile blender
    /// relies on this to fill untouched destination pixels.
    pub fn sample_raw(&self, x: i64, y: i64) -> Vec<f32> {
        let c = self.channels();
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return vec![0.0; c];
        }
        let idx = (y as usize * self.width as usize + x as usize) * c;
        if self.kind.is_float() {
            self.floats[idx..idx + c].to_vec()
        } else {
            self.bytes[idx..idx + c].iter().map(|&b| b as f32).collect()
        }
    }

    /// Writes `values` (one per channel) to pixel `(x, y)`. Byte kinds
    /// round and clip each value to `[0, 255]` before storing.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image or `values.len()` doesn't
    /// match the channel count; callers that enumerate destination pixels
    /// from a rasterized polygon never violate this.
    pub fn set_pixel(&mut self, x: u32, y: u32, values: &[f32]) {
        let c = self.channels();
        assert_eq!(values.len(), c);
        assert!(x < self.width && y < self.height);
        let idx = (y as usize * self.width as usize + x as usize) * c;
        if self.kind.is_float() {
            let buf = Arc::make_mut(&mut self.floats);
            buf[idx..idx + c].copy_from_slice(values);
        } else {
            let buf = Arc::make_mut(&mut self.bytes);
            for (slot, v) in buf[idx..idx + c].iter_mut().zip(values) {
                *slot = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Applies global contrast normalization, producing the GCN float
    /// variant of this image's kind: subtract the mean, divide by
    /// `max(eps, sqrt(lambda + mean(x^2)))`, then scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKind`] if this image has no GCN
    /// counterpart (it is already a GCN kind).
    pub fn to_gcn(&self, lambda: f32, eps: f32, scale: f32) -> Result<Image> {
        let gcn_kind = self
            .kind
            .to_gcn()
            .ok_or_else(|| Error::unsupported_kind(format!("{:?} has no GCN variant", self.kind)))?;
        let c = self.channels();
        let n = self.height as usize * self.width as usize * c;
        let raw: Vec<f32> = if self.kind.is_float() {
            self.floats.as_ref().clone()
        } else {
            self.bytes.iter().map(|&b| b as f32).collect()
        };
        let mean = raw.iter().sum::<f32>() / n as f32;
        let centered: Vec<f32> = raw.iter().map(|&v| v - mean).collect();
        let mean_sq = centered.iter().map(|v| v * v).sum::<f32>() / n as f32;
        let denom = (lambda + mean_sq).sqrt().max(eps);
        let out: Vec<f32> = centered.iter().map(|&v| v / denom * scale).collect();
        Image::from_floats(self.height, self.width, gcn_kind, out)
    }

    /// Inverse of [`Image::to_gcn`]: min-max rescales into `[0, 255]` and
    /// rounds to the byte counterpart of this image's kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedKind`] if this image is not a GCN kind.
    pub fn to_non_gcn(&self) -> Result<Image> {
        let byte_kind = self
            .kind
            .to_non_gcn()
            .ok_or_else(|| Error::unsupported_kind(format!("{:?} is not a GCN kind", self.kind)))?;
        let data = self.floats.as_ref();
        let (min, max) = data.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(mn, mx), &v| {
            (mn.min(v), mx.max(v))
        });
        let range = (max - min).max(1e-8);
        let out: Vec<u8> = data
            .iter()
            .map(|&v| (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        Image::from_bytes(self.height, self.width, byte_kind, out)
    }

    /// Converts to another kind, currently only supporting the GCN
    /// round-trip. Any other pair is outside the declared conversion
    /// graph and returns [`Error::UnsupportedKind`].
    pub fn convert_kind(&self, target: ImageKind) -> Result<Image> {
        if target == self.kind {
            return Ok(self.clone());
        }
        if self.kind.to_gcn() == Some(target) {
            return self.to_gcn(0.0, 1e-8, 1.0);
        }
        if self.kind.to_non_gcn() == Some(target) {
            return self.to_non_gcn();
        }
        Err(Error::unsupported_kind(format!(
            "no declared conversion from {:?} to {:?}",
            self.kind, target
        )))
    }
}

/// An H×W single-channel float buffer with no kind tag, used for smooth
/// real-valued labels such as per-instance scale.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    height: u32,
    width: u32,
    data: Arc<Vec<f32>>,
}

impl ScoreMap {
    /// Creates a zero-filled score map.
    pub fn from_shape(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            data: Arc::new(vec![0.0; height as usize * width as usize]),
        }
    }

    /// Creates a score map by filling each polygon's covered pixels with
    /// its associated value. Later polygons in the list overwrite earlier
    /// ones where they overlap.
    pub fn from_polygon_value_pairs(height: u32, width: u32, pairs: &[(Polygon, f32)]) -> Self {
        let mut map = Self::from_shape(height, width);
        for (poly, value) in pairs {
            for (y, x) in rasterize_polygon(poly) {
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    map.set(x as u32, y as u32, *value);
                }
            }
        }
        map
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Reads the value at `(x, y)`, or `0.0` if outside bounds.
    pub fn sample_raw(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Writes a value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the map.
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        assert!(x < self.width && y < self.height);
        Arc::make_mut(&mut self.data)[y as usize * self.width as usize + x as usize] = value;
    }
}

/// An H×W single-channel byte buffer with values in `{0, 1, ...}`.
#[derive(Debug, Clone)]
pub struct Mask {
    height: u32,
    width: u32,
    data: Arc<Vec<u8>>,
}

impl Mask {
    /// Creates a zero-filled mask.
    pub fn from_shape(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            data: Arc::new(vec![0u8; height as usize * width as usize]),
        }
    }

    /// Creates a mask from a polygon list under the given merge mode.
    pub fn from_shape_and_polygons(height: u32, width: u32, polygons: &[Polygon], mode: PolygonsMergeMode) -> Self {
        let w = width as usize;
        let h = height as usize;
        match mode {
            PolygonsMergeMode::Union => {
                let mut mask = Self::from_shape(height, width);
                for poly in polygons {
                    for (y, x) in rasterize_polygon(poly) {
                        if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                            mask.set(x as u32, y as u32, 1);
                        }
                    }
                }
                mask
            }
            PolygonsMergeMode::Distinct | PolygonsMergeMode::Intersection => {
                let mut counts = vec![0u32; w * h];
                for poly in polygons {
                    for (y, x) in rasterize_polygon(poly) {
                        if x >= 0 && y >= 0 && (x as usize) < w && (y as usize) < h {
                            counts[y as usize * w + x as usize] += 1;
                        }
                    }
                }
                let threshold_met = |n: u32| match mode {
                    PolygonsMergeMode::Distinct => n == 1,
                    PolygonsMergeMode::Intersection => n > 1,
                    PolygonsMergeMode::Union => unreachable!(),
                };
                let data: Vec<u8> = counts.into_iter().map(|n| threshold_met(n) as u8).collect();
                Self {
                    height,
                    width,
                    data: Arc::new(data),
                }
            }
        }
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Reads the value at `(x, y)`, or `0` if outside bounds.
    pub fn sample_raw(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize] as f32
    }

    /// Writes a value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the mask.
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        assert!(x < self.width && y < self.height);
        Arc::make_mut(&mut self.data)[y as usize * self.width as usize + x as usize] = value;
    }

    /// Fills every pixel with `1`. Used to build the all-ones mask that
    /// matrix-based transforms warp to derive an active-region mask.
    pub fn fill_ones(&mut self) {
        Arc::make_mut(&mut self.data).fill(1);
    }
}

/// Rasterizes a polygon's interior into integer `(y, x)` pixel
/// coordinates using an even-odd scanline fill, restricted to the
/// polygon's own bounding box.
///
/// Shared by [`Mask::from_shape_and_polygons`], [`ScoreMap::from_polygon_value_pairs`],
/// and the tile blender's destination-quad pixel enumeration.
pub fn rasterize_polygon(poly: &Polygon) -> Vec<(i64, i64)> {
    let pts = poly.points();
    let n = pts.len();
    if n < 3 {
        return pts.iter().map(|p| (p.y, p.x)).collect();
    }
    let (min_y, _, max_y, _) = poly.bounding_box();
    let mut out = Vec::new();
    for y in min_y..=max_y {
        let yf = y as f64;
        let mut xs: Vec<f64> = Vec::new();
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let (ay, by) = (a.y as f64, b.y as f64);
            // Horizontal edges never bound a row on their own; the two
            // non-horizontal edges meeting at their endpoints already
            // close the interval. Using an inclusive test on both ends
            // (rather than the usual half-open scanline rule) is what
            // makes an axis-aligned rectangle rasterize to every row and
            // column it touches instead of dropping its far edge.
            if ay == by {
                continue;
            }
            if (ay <= yf && by >= yf) || (by <= yf && ay >= yf) {
                let t = (yf - ay) / (by - ay);
                xs.push(a.x as f64 + t * (b.x as f64 - a.x as f64));
            }
        }
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in xs.chunks(2) {
            if let [x0, x1] = pair {
                let (lo, hi) = (x0.ceil() as i64, x1.floor() as i64);
                for x in lo..=hi {
                    out.push((y, x));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    #[test]
    fn image_sample_out_of_bounds_is_zero() {
        let img = Image::filled(4, 4, ImageKind::Grayscale, 200.0);
        assert_eq!(img.sample_raw(-1, 0), vec![0.0]);
        assert_eq!(img.sample_raw(0, 0), vec![200.0]);
    }

    #[test]
    fn set_pixel_clips_byte_kind() {
        let mut img = Image::filled(2, 2, ImageKind::Grayscale, 0.0);
        img.set_pixel(0, 0, &[300.0]);
        assert_eq!(img.sample_raw(0, 0), vec![255.0]);
        img.set_pixel(0, 0, &[-10.0]);
        assert_eq!(img.sample_raw(0, 0), vec![0.0]);
    }

    #[test]
    fn gcn_roundtrip_preserves_kind() {
        let img = Image::from_bytes(2, 2, ImageKind::Grayscale, vec![10, 20, 30, 40]).unwrap();
        let gcn = img.to_gcn(0.0, 1e-8, 1.0).unwrap();
        assert_eq!(gcn.kind(), ImageKind::GrayscaleGcn);
        let back = gcn.to_non_gcn().unwrap();
        assert_eq!(back.kind(), ImageKind::Grayscale);
    }

    #[test]
    fn unsupported_kind_conversion_errors() {
        let img = Image::filled(2, 2, ImageKind::Rgb, 0.0);
        assert!(img.convert_kind(ImageKind::Hsv).is_err());
    }

    #[test]
    fn rasterize_square_polygon() {
        let poly = Polygon::new(vec![
            Point::new(0, 0),
            Point::new(0, 2),
            Point::new(2, 2),
            Point::new(2, 0),
        ]);
        let pts = rasterize_polygon(&poly);
        assert!(pts.contains(&(1, 1)));
        assert_eq!(pts.len(), 9);
    }

    #[test]
    fn mask_union_vs_distinct_vs_intersection() {
        let a = Polygon::new(vec![Point::new(0, 0), Point::new(0, 3), Point::new(3, 3), Point::new(3, 0)]);
        let b = Polygon::new(vec![Point::new(0, 2), Point::new(0, 5), Point::new(3, 5), Point::new(3, 2)]);
        let union = Mask::from_shape_and_polygons(4, 6, &[a.clone(), b.clone()], PolygonsMergeMode::Union);
        let distinct = Mask::from_shape_and_polygons(4, 6, &[a.clone(), b.clone()], PolygonsMergeMode::Distinct);
        let intersection = Mask::from_shape_and_polygons(4, 6, &[a, b], PolygonsMergeMode::Intersection);
        // column 2 is the overlap between the two 0..=2 and 2..=4 x-ranges
        assert_eq!(union.sample_raw(2, 1), 1.0);
        assert_eq!(distinct.sample_raw(2, 1), 0.0);
        assert_eq!(intersection.sample_raw(2, 1), 1.0);
        assert_eq!(distinct.sample_raw(0, 1), 1.0);
    }
}
