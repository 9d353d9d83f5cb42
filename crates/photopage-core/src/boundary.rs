//! Canvas containment for committed positions.
//!
//! While a gesture is live a photo may be dragged partly off the canvas. On
//! release the proposed position is clamped so the committed frame lies
//! inside `[0, canvas_width - width] × [0, canvas_height - height]`. The
//! visual move from the overshoot to the clamped spot is described by a
//! [`Settle`] and is purely presentational.
//!
//! A photo wider (or taller) than the canvas has no valid range on that axis;
//! it is pinned to 0.

use crate::config::EngineConfig;
use crate::position::PhotoPosition;
use serde::{Deserialize, Serialize};

/// Smootherstep interpolation function.
///
/// Returns values from 0.0 to 1.0 with zero velocity and acceleration at boundaries.
///
/// Formula: `6t^5 - 15t^4 + 10t^3`
#[inline]
pub fn smootherstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Clamps proposed final positions into the page canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPolicy {
    canvas_width: f64,
    canvas_height: f64,
}

impl BoundaryPolicy {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.canvas_width, config.canvas_height)
    }

    #[inline]
    fn clamp_axis(value: f64, extent: f64, canvas: f64) -> f64 {
        // max() last so a negative upper bound pins to 0
        value.min(canvas - extent).max(0.0)
    }

    /// Clamp `x`/`y` of a proposed position. Size and rotation pass through.
    pub fn clamp(&self, proposed: &PhotoPosition) -> PhotoPosition {
        PhotoPosition {
            x: Self::clamp_axis(proposed.x, proposed.width, self.canvas_width),
            y: Self::clamp_axis(proposed.y, proposed.height, self.canvas_height),
            ..*proposed
        }
    }

    /// Returns true if the position needs no correction.
    pub fn contains(&self, position: &PhotoPosition) -> bool {
        self.clamp(position) == *position
    }
}

/// Visual settle from an overshot release point to the committed position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settle {
    pub from_x: f64,
    pub from_y: f64,
    pub to_x: f64,
    pub to_y: f64,
    pub duration_ms: f64,
}

impl Settle {
    pub fn new(released: &PhotoPosition, committed: &PhotoPosition, duration_ms: f64) -> Self {
        Self {
            from_x: released.x,
            from_y: released.y,
            to_x: committed.x,
            to_y: committed.y,
            duration_ms,
        }
    }

    /// Returns true if the release point was already in bounds.
    pub fn is_noop(&self) -> bool {
        self.from_x == self.to_x && self.from_y == self.to_y
    }

    /// Eased position `elapsed_ms` after release.
    pub fn sample(&self, elapsed_ms: f64) -> (f64, f64) {
        if self.duration_ms <= 0.0 {
            return (self.to_x, self.to_y);
        }
        let t = smootherstep(elapsed_ms / self.duration_ms);
        (
            self.from_x + (self.to_x - self.from_x) * t,
            self.from_y + (self.to_y - self.from_y) * t,
        )
    }

    pub fn is_finished(&self, elapsed_ms: f64) -> bool {
        elapsed_ms >= self.duration_ms
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
