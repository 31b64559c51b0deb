//! # docwarp-ops
//!
//! Mesh-based forward-warping geometric distortions for document images.
//!
//! This crate builds the warps themselves on top of `docwarp-core`'s
//! raster/geometry primitives and `docwarp-math`'s matrix solvers:
//!
//! - [`affine`] - closed-form shear/rotate/skew matrix transforms
//! - [`grid`] - the source/destination point lattices the tile blender warps between
//! - [`blend`] - the tile blender, painting a raster tile-by-tile through a lattice pair
//! - [`projector`] - the `PointProjector` trait shared by camera and MLS warps
//! - [`camera`] - pinhole camera model and its auto distance solve
//! - [`elevation`] - strategies lifting a flat source grid into 3D before projection
//! - [`mls`] - similarity-variant moving-least-squares point warp
//! - [`dispatch`] - the unified config/state surface tying every transform together
//!
//! # Example
//!
//! ```rust
//! use docwarp_core::{Image, ImageKind};
//! use docwarp_ops::affine::RotateConfig;
//!
//! let src = Image::filled(100, 200, ImageKind::Grayscale, 128.0);
//! let state = RotateConfig { angle: 90 }.build_state(100, 200).unwrap();
//! let dst = state.warp_image(&src).unwrap();
//! assert_eq!(dst.height(), 200);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod sampling;
pub mod affine;
pub mod blend;
pub mod camera;
pub mod dispatch;
pub mod elevation;
pub mod grid;
pub mod mls;
pub mod projector;

pub use dispatch::{distort, build_state, Config, DistortInputs, DistortResult, Shape, State};
pub use docwarp_core::{Error, Result};
