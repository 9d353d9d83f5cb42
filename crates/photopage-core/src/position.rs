//! Data model for photos placed on a page.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner of the page canvas
//! - `x`/`y` are the top-left corner of the photo's unrotated frame, in canvas pixels
//! - Rotation is in radians around the frame center, positive = clockwise on screen
//! - Rotation is unbounded; values differing by 2π render identically

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;

/// Identifier of a photo on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PhotoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Placement of a photo on the page canvas.
///
/// Serialized with the host's camelCase field names (`zIndex`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPosition {
    /// Left edge in canvas pixels.
    pub x: f64,
    /// Top edge in canvas pixels.
    pub y: f64,
    /// Frame width in canvas pixels (always > 0).
    pub width: f64,
    /// Frame height in canvas pixels (always > 0).
    pub height: f64,
    /// Rotation in radians. Missing means unrotated.
    #[serde(default)]
    pub rotation: f64,
    /// Stacking order on the page; higher draws on top.
    #[serde(default, alias = "z_index")]
    pub z_index: i32,
}

impl PhotoPosition {
    /// Create an unrotated position at the bottom of the stack.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
            z_index: 0,
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Height over width. Locked for the lifetime of the photo.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.height / self.width
    }

    /// Center of the frame in canvas pixels.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Rotation folded into `[0, 2π)`.
    pub fn normalized_rotation(&self) -> f64 {
        self.rotation.rem_euclid(TAU)
    }

    /// Check that this position can serve as a gesture baseline.
    ///
    /// Width and height must be finite and positive; coordinates and rotation
    /// must be finite.
    pub fn validate(&self, id: &PhotoId) -> EngineResult<()> {
        let what = || format!("baseline for {}", id);

        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(EngineError::validation(
                what(),
                format!("width must be positive, got {}", self.width),
            ));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(EngineError::validation(
                what(),
                format!("height must be positive, got {}", self.height),
            ));
        }
        if !(self.x.is_finite() && self.y.is_finite() && self.rotation.is_finite()) {
            return Err(EngineError::validation(
                what(),
                "coordinates and rotation must be finite",
            ));
        }
        Ok(())
    }

    /// Hit test a canvas point against the rotated frame.
    ///
    /// The point is rotated into the frame's local space around its center,
    /// then tested against the unrotated rectangle.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        let (cx, cy) = self.center();
        let (sin, cos) = (-self.rotation).sin_cos();
        let dx = px - cx;
        let dy = py - cy;
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;

        local_x.abs() <= self.width / 2.0 && local_y.abs() <= self.height / 2.0
    }
}

/// A photo freely placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreePhoto {
    pub id: PhotoId,
    /// Opaque reference to the image (URI or asset key). Never decoded here.
    #[serde(alias = "uri")]
    pub image_ref: String,
    pub position: PhotoPosition,
}

impl FreePhoto {
    pub fn new(id: impl Into<PhotoId>, image_ref: impl Into<String>, position: PhotoPosition) -> Self {
        Self {
            id: id.into(),
            image_ref: image_ref.into(),
            position,
        }
    }
}
