//! # docwarp-math
//!
//! Matrix and vector math shared by the affine/perspective engine and the
//! camera model.
//!
//! This crate provides the mathematical primitives a geometric warp needs:
//!
//! - [`Mat3`] - 3x3 matrices: perspective transforms and camera rotations
//! - [`Vec3`] - homogeneous 2D points and camera-frame 3D points
//! - [`solve_perspective_4point`] - four-point-correspondence homography fit
//! - [`rodrigues_rotation`] - axis-angle rotation matrix construction
//! - Scalar interpolation utilities (lerp, smoothstep)
//!
//! # Design
//!
//! This crate wraps plain row-major matrices rather than reaching for a
//! full linear-algebra crate: every matrix here is exactly 3x3, and the
//! one non-trivial solve (perspective fit) is a fixed 8x8 system, so a
//! general-purpose solver would buy nothing. [`glam`] is used underneath
//! for the vector-heavy parallel paths in `docwarp-ops`.
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Usage
//!
//! ```rust
//! use docwarp_math::{solve_perspective_4point, Vec3};
//!
//! let src = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
//! let dst = [(2.0, 0.0), (8.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
//! let h = solve_perspective_4point(src, dst).unwrap();
//! let p = h.transform(Vec3::new(0.0, 0.0, 1.0));
//! assert!((p.x / p.z - 2.0).abs() < 1e-3);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - SIMD-accelerated vector math
//! - `docwarp-core` - core geometry types ([`docwarp_core::Point`])

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod mat3;
mod vec3;
mod interp;
mod solve;

pub use mat3::*;
pub use vec3::*;
pub use interp::*;
pub use solve::{rodrigues_rotation, solve_linear_system, solve_perspective_4point};

/// Re-export glam types for direct use.
pub mod glam {
    pub use ::glam::{Mat3 as GlamMat3, Vec3 as GlamVec3, Vec3A};
}
