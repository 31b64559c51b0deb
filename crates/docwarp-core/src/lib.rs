//! # docwarp-core
//!
//! Geometry and raster primitives for document-image warping.
//!
//! This crate provides the foundational types shared by every distortion
//! in `docwarp-ops`:
//!
//! - [`Point`], [`PointList`] — integer pixel coordinates and ordered lists
//! - [`Polygon`], [`PolygonsMergeMode`] — vertex rings and mask merge policy
//! - [`Image`], [`ImageKind`] — a pixel matrix with a runtime kind/channel tag
//! - [`ScoreMap`] — a single-channel float label layer
//! - [`Mask`] — a single-channel byte label layer
//! - [`Rect`], [`Roi`] — axis-aligned regions
//!
//! ## Design Philosophy
//!
//! Channel count and dtype are runtime properties of [`Image`] rather than
//! compile-time generics: the distortion dispatcher warps a raster plus
//! zero or more label layers of heterogeneous, only-known-at-runtime
//! shape through one shared state. Pushing the kind tag to the type level
//! would force every transform to be generic over it for no benefit —
//! nothing in the warp path branches on color space, only on channel
//! count and byte-vs-float storage, both exposed as plain fields.
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. `docwarp-math` and
//! `docwarp-ops` both depend on it:
//!
//! ```text
//! docwarp-core (this crate)
//!    ^
//!    |
//!    +-- docwarp-math (matrices, perspective solves)
//!    +-- docwarp-ops  (affine/camera/MLS distortions, dispatcher)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod point;
pub mod polygon;
pub mod rect;

pub use error::{Error, Result};
pub use image::{rasterize_polygon, Image, ImageKind, Mask, ScoreMap};
pub use point::{bounding_box, Point, PointList};
pub use polygon::{flatten_polygons, unflatten_polygons, Polygon, PolygonsMergeMode};
pub use rect::{Rect, Roi};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use docwarp_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{Image, ImageKind, Mask, ScoreMap};
    pub use crate::point::{Point, PointList};
    pub use crate::polygon::{Polygon, PolygonsMergeMode};
    pub use crate::rect::{Rect, Roi};
}
