//! Live transform state for photos under manipulation.
//!
//! The render path needs a fresh transform every frame while a gesture is
//! live, but must never wait on the collaborator's persistence. This module
//! keeps that value in a small shared slot per photo:
//!
//! - exactly one [`TransformWriter`] may exist per slot at a time (held by the
//!   open gesture session)
//! - any number of [`TransformReader`]s may observe it
//!
//! When the writer is dropped the slot empties, which tells readers to fall
//! back to the committed position.
//!
//! # Composition
//!
//! Every live value is recomputed from the session baseline and the net
//! accumulators, never from the previous frame:
//!
//! ```text
//! width'    = clamp(baseline.width * scale_factor, min_size, max_size)
//! height'   = width' * baseline.height / baseline.width
//! x', y'    = baseline.x + translate_x, baseline.y + translate_y
//! rotation' = baseline.rotation + rotation_delta
//! ```
//!
//! Each output depends on one accumulator only, so the order in which
//! recognizers reported their deltas within a frame cannot change the result.

use crate::config::EngineConfig;
use crate::position::PhotoPosition;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Net gesture deltas accumulated over a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accumulators {
    pub translate_x: f64,
    pub translate_y: f64,
    /// Multiplicative; 1.0 means unchanged.
    pub scale_factor: f64,
    /// Radians.
    pub rotation_delta: f64,
}

impl Default for Accumulators {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale_factor: 1.0,
            rotation_delta: 0.0,
        }
    }
}

impl Accumulators {
    /// Returns true if no recognizer has moved anything.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Compose a position from a baseline and net accumulators.
///
/// `z_index` is carried over from the baseline unchanged.
pub fn compose(
    baseline: &PhotoPosition,
    acc: &Accumulators,
    config: &EngineConfig,
) -> PhotoPosition {
    let width = config.clamp_width(baseline.width * acc.scale_factor);
    let height = width * baseline.aspect_ratio();

    PhotoPosition {
        x: baseline.x + acc.translate_x,
        y: baseline.y + acc.translate_y,
        width,
        height,
        rotation: baseline.rotation + acc.rotation_delta,
        z_index: baseline.z_index,
    }
}

/// Values the render path needs to draw a photo mid-gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTransform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    /// Effective scale relative to the baseline width, for hosts that draw at
    /// the committed size and apply a scale transform on top.
    pub scale: f64,
}

impl RenderTransform {
    pub fn from_position(position: &PhotoPosition, baseline: &PhotoPosition) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: position.width,
            height: position.height,
            rotation: position.rotation,
            scale: position.width / baseline.width,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    value: RwLock<Option<RenderTransform>>,
    writer_alive: AtomicBool,
}

/// Per-photo slot holding the live render transform.
#[derive(Debug, Clone, Default)]
pub struct TransformState {
    shared: Arc<Shared>,
}

impl TransformState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single writer handle.
    ///
    /// Returns `None` while another writer for this slot is alive.
    pub(crate) fn writer(&self) -> Option<TransformWriter> {
        self.shared
            .writer_alive
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TransformWriter {
                shared: Arc::clone(&self.shared),
            })
    }

    pub fn reader(&self) -> TransformReader {
        TransformReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Returns true while a gesture session holds the writer.
    pub fn has_writer(&self) -> bool {
        self.shared.writer_alive.load(Ordering::Acquire)
    }
}

/// Exclusive write handle owned by an open gesture session.
#[derive(Debug)]
pub struct TransformWriter {
    shared: Arc<Shared>,
}

impl TransformWriter {
    pub fn publish(&self, transform: RenderTransform) {
        *self.shared.value.write() = Some(transform);
    }
}

impl Drop for TransformWriter {
    fn drop(&mut self) {
        *self.shared.value.write() = None;
        self.shared.writer_alive.store(false, Ordering::Release);
    }
}

/// Read handle for the render path.
#[derive(Debug, Clone)]
pub struct TransformReader {
    shared: Arc<Shared>,
}

impl TransformReader {
    /// The live transform, or `None` when no gesture is running and the
    /// committed position should be drawn.
    pub fn current(&self) -> Option<RenderTransform> {
        *self.shared.value.read()
    }

    pub fn is_live(&self) -> bool {
        self.shared.value.read().is_some()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
