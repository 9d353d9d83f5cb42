//! Per-photo gesture session state machine.
//!
//! A session is opened by the first recognizer that starts on a photo and is
//! closed when the last running recognizer ends. It captures the baseline
//! exactly once and keeps one accumulator per recognizer kind.
//!
//! Recognizers report cumulative values relative to their own start. When a
//! recognizer ends while the session stays open (one finger lifted from a
//! pinch while the drag continues) its contribution is folded into `folded`,
//! so a later restart of the same recognizer continues from there instead of
//! snapping back to the baseline.

use crate::error::{EngineError, EngineResult};
use crate::gesture::{GestureKind, GestureUpdate};
use crate::position::{PhotoId, PhotoPosition};
use crate::transform::{Accumulators, TransformWriter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunningSet([bool; 3]);

impl RunningSet {
    fn slot(kind: GestureKind) -> usize {
        match kind {
            GestureKind::Translate => 0,
            GestureKind::Scale => 1,
            GestureKind::Rotate => 2,
        }
    }

    fn contains(&self, kind: GestureKind) -> bool {
        self.0[Self::slot(kind)]
    }

    fn set(&mut self, kind: GestureKind, running: bool) {
        self.0[Self::slot(kind)] = running;
    }

    fn is_empty(&self) -> bool {
        self.0.iter().all(|running| !running)
    }
}

/// Ephemeral manipulation state for one photo.
#[derive(Debug)]
pub struct GestureSession {
    id: PhotoId,
    baseline: PhotoPosition,
    running: RunningSet,
    /// Contributions of recognizer runs that already ended.
    folded: Accumulators,
    /// Contributions of the runs in progress.
    live: Accumulators,
    writer: TransformWriter,
}

impl GestureSession {
    /// Open a session. The baseline must already be validated.
    pub(crate) fn open(id: PhotoId, baseline: PhotoPosition, writer: TransformWriter) -> Self {
        Self {
            id,
            baseline,
            running: RunningSet::default(),
            folded: Accumulators::default(),
            live: Accumulators::default(),
            writer,
        }
    }

    pub fn id(&self) -> &PhotoId {
        &self.id
    }

    pub fn baseline(&self) -> &PhotoPosition {
        &self.baseline
    }

    pub fn is_running(&self, kind: GestureKind) -> bool {
        self.running.contains(kind)
    }

    /// Returns true when no recognizer is running.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub(crate) fn writer(&self) -> &TransformWriter {
        &self.writer
    }

    /// Net accumulators over all runs so far.
    pub fn net(&self) -> Accumulators {
        Accumulators {
            translate_x: self.folded.translate_x + self.live.translate_x,
            translate_y: self.folded.translate_y + self.live.translate_y,
            scale_factor: self.folded.scale_factor * self.live.scale_factor,
            rotation_delta: self.folded.rotation_delta + self.live.rotation_delta,
        }
    }

    /// Start (or restart) a recognizer.
    pub fn begin(&mut self, kind: GestureKind) {
        if self.running.contains(kind) {
            self.fold(kind);
        }
        self.running.set(kind, true);
    }

    /// Record a recognizer's cumulative value.
    ///
    /// Non-finite values and non-positive scale ratios are rejected and leave
    /// the accumulators untouched.
    pub fn apply(&mut self, update: GestureUpdate) -> EngineResult<()> {
        if !self.running.contains(update.kind()) {
            return Err(EngineError::StaleSession(self.id.clone()));
        }

        let what = || format!("{} update for {}", update.kind(), self.id);
        match update {
            GestureUpdate::Translate { dx, dy } => {
                if !(dx.is_finite() && dy.is_finite()) {
                    return Err(EngineError::validation(what(), "offset must be finite"));
                }
                self.live.translate_x = dx;
                self.live.translate_y = dy;
            }
            GestureUpdate::Scale { ratio } => {
                if !(ratio.is_finite() && ratio > 0.0) {
                    return Err(EngineError::validation(
                        what(),
                        format!("ratio must be positive, got {}", ratio),
                    ));
                }
                self.live.scale_factor = ratio;
            }
            GestureUpdate::Rotate { angle } => {
                if !angle.is_finite() {
                    return Err(EngineError::validation(what(), "angle must be finite"));
                }
                self.live.rotation_delta = angle;
            }
        }
        Ok(())
    }

    /// End a recognizer. Returns true if the session is now idle.
    pub fn end(&mut self, kind: GestureKind) -> EngineResult<bool> {
        if !self.running.contains(kind) {
            return Err(EngineError::StaleSession(self.id.clone()));
        }
        self.fold(kind);
        self.running.set(kind, false);
        Ok(self.is_idle())
    }

    fn fold(&mut self, kind: GestureKind) {
        match kind {
            GestureKind::Translate => {
                self.folded.translate_x += self.live.translate_x;
                self.folded.translate_y += self.live.translate_y;
                self.live.translate_x = 0.0;
                self.live.translate_y = 0.0;
            }
            GestureKind::Scale => {
                self.folded.scale_factor *= self.live.scale_factor;
                self.live.scale_factor = 1.0;
            }
            GestureKind::Rotate => {
                self.folded.rotation_delta += self.live.rotation_delta;
                self.live.rotation_delta = 0.0;
            }
        }
    }
}
