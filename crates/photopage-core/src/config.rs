//! Engine configuration.
//!
//! Size bounds are absolute canvas pixels rather than a ratio of the current
//! size, so repeated pinches on the same photo never compound rounding error.
//! `nominal_size` is the reference edge length new photos are placed at and
//! from which the default bounds are derived (0.5x and 3x).

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Default page canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 300.0;
/// Default page canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;
/// Reference edge length of a freshly placed photo.
pub const DEFAULT_NOMINAL_SIZE: f64 = 150.0;
/// Smallest scale relative to the nominal size.
pub const DEFAULT_MIN_SCALE: f64 = 0.5;
/// Largest scale relative to the nominal size.
pub const DEFAULT_MAX_SCALE: f64 = 3.0;
/// Duration of the visual settle-back after release.
pub const DEFAULT_SETTLE_DURATION_MS: f64 = 300.0;

/// Configuration for one page's manipulation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Page canvas width in pixels.
    pub canvas_width: f64,
    /// Page canvas height in pixels.
    pub canvas_height: f64,
    /// Minimum photo width in pixels.
    pub min_size: f64,
    /// Maximum photo width in pixels.
    pub max_size: f64,
    /// Reference edge length for newly placed photos.
    pub nominal_size: f64,
    /// Settle animation duration in milliseconds (presentation only).
    pub settle_duration_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_nominal(
            DEFAULT_CANVAS_WIDTH,
            DEFAULT_CANVAS_HEIGHT,
            DEFAULT_NOMINAL_SIZE,
            DEFAULT_MIN_SCALE,
            DEFAULT_MAX_SCALE,
        )
    }
}

impl EngineConfig {
    /// Create a config with default size bounds for the given canvas.
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            ..Self::default()
        }
    }

    /// Derive absolute size bounds from a nominal edge length and scale limits.
    pub fn from_nominal(
        canvas_width: f64,
        canvas_height: f64,
        nominal_size: f64,
        min_scale: f64,
        max_scale: f64,
    ) -> Self {
        Self {
            canvas_width,
            canvas_height,
            min_size: nominal_size * min_scale,
            max_size: nominal_size * max_scale,
            nominal_size,
            settle_duration_ms: DEFAULT_SETTLE_DURATION_MS,
        }
    }

    pub fn with_size_bounds(mut self, min_size: f64, max_size: f64) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Clamp a proposed width into `[min_size, max_size]`.
    #[inline]
    pub fn clamp_width(&self, width: f64) -> f64 {
        width.clamp(self.min_size, self.max_size)
    }

    /// Scale of a width relative to the nominal size.
    #[inline]
    pub fn nominal_scale(&self, width: f64) -> f64 {
        width / self.nominal_size
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("min_size", self.min_size),
            ("max_size", self.max_size),
            ("nominal_size", self.nominal_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::validation(
                    "config",
                    format!("{} must be positive, got {}", name, value),
                ));
            }
        }
        if self.min_size > self.max_size {
            return Err(EngineError::validation(
                "config",
                format!(
                    "min_size {} exceeds max_size {}",
                    self.min_size, self.max_size
                ),
            ));
        }
        if !(self.settle_duration_ms.is_finite() && self.settle_duration_ms >= 0.0) {
            return Err(EngineError::validation(
                "config",
                "settle_duration_ms must be non-negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds_from_nominal() {
        let config = EngineConfig::default();
        assert_eq!(config.canvas_width, 300.0);
        assert_eq!(config.canvas_height, 600.0);
        assert_eq!(config.min_size, 75.0);
        assert_eq!(config.max_size, 450.0);
        assert_eq!(config.nominal_size, 150.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_width() {
        let config = EngineConfig::default();
        assert_eq!(config.clamp_width(10.0), 75.0);
        assert_eq!(config.clamp_width(200.0), 200.0);
        assert_eq!(config.clamp_width(600.0), 450.0);
    }

    #[test]
    fn test_nominal_scale() {
        let config = EngineConfig::default();
        assert!((config.nominal_scale(225.0) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let config = EngineConfig::default().with_size_bounds(500.0, 100.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_canvas() {
        let config = EngineConfig::new(0.0, 600.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let json = r#"{"canvasWidth": 400.0, "maxSize": 380.0}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.canvas_width, 400.0);
        assert_eq!(config.canvas_height, 600.0);
        assert_eq!(config.min_size, 75.0);
        assert_eq!(config.max_size, 380.0);
        assert!(config.validate().is_ok());
    }
}
