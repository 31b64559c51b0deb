//! Error types for docwarp-core geometry and raster operations.
//!
//! The taxonomy is deliberately small: every failure mode in the warping
//! pipeline reduces to one of five kinds. Degenerate cases that have an
//! obvious silent policy (skip a pixel, skip a tile, short-circuit an
//! exact match) are never reported as errors — see the variant docs.
//!
//! # Usage
//!
//! ```rust
//! use docwarp_core::{Error, Result};
//!
//! fn check_angle(angle: f64) -> Result<()> {
//!     if !(-90.0..=90.0).contains(&angle) || angle.abs() >= 90.0 {
//!         return Err(Error::invalid_config("shear angle must be in (-90, 90)"));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a geometric distortion.
#[derive(Debug, Error)]
pub enum Error {
    /// A config field is out of its documented range, or structurally
    /// invalid (empty polygon, too few handle points, negative scale).
    ///
    /// Reported immediately at state construction; there is never a
    /// partial result for an invalid config.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Source and destination grids (or two buffers expected to share a
    /// shape) disagree in dimensions. This is always a programmer error,
    /// never a matter of user input.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A color-space or kind conversion was requested that has no entry
    /// in the declared conversion graph.
    #[error("unsupported kind conversion: {0}")]
    UnsupportedKind(String),

    /// Pixel coordinates are outside raster bounds.
    ///
    /// Sampling out of bounds is normally clipped silently by policy (see
    /// the tile blender); this variant exists for APIs that choose to
    /// surface it explicitly, such as direct pixel accessors.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds.
        x: i64,
        /// Y coordinate that was out of bounds.
        y: i64,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
}

impl Error {
    /// Creates an [`Error::InvalidConfig`].
    #[inline]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates an [`Error::ShapeMismatch`].
    #[inline]
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Creates an [`Error::UnsupportedKind`].
    #[inline]
    pub fn unsupported_kind(msg: impl Into<String>) -> Self {
        Self::UnsupportedKind(msg.into())
    }

    /// Creates an [`Error::OutOfBounds`].
    #[inline]
    pub fn out_of_bounds(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if this is an [`Error::InvalidConfig`].
    #[inline]
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message() {
        let err = Error::invalid_config("angle out of range");
        assert!(err.to_string().contains("angle out of range"));
        assert!(err.is_invalid_config());
    }

    #[test]
    fn out_of_bounds_message() {
        let err = Error::out_of_bounds(-5, 10, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("-5"));
        assert!(msg.contains("80x60"));
        assert!(err.is_bounds_error());
    }
}
