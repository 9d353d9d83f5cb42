//! Gesture recognition from raw multi-touch pointer input.
//!
//! Three recognizers may run concurrently on one photo:
//!
//! - **Translate**: one or more pointers; reports the cumulative centroid offset
//! - **Scale**: two pointers; reports the ratio of current to initial distance
//! - **Rotate**: two pointers; reports the cumulative change of the angle
//!   between them
//!
//! Every recognizer reports relative to its own start. A [`PointerTracker`]
//! turns pointer down/move/up into [`GestureEvent`]s; hosts with their own
//! platform recognizers can skip it and feed events directly.
//!
//! # State Transitions
//!
//! ```text
//! 0 -> 1 pointers   Began(Translate)
//! 1 -> 2 pointers   Began(Scale), Began(Rotate); translate re-anchors
//! 2 -> 1 pointers   Ended(Scale), Ended(Rotate); translate re-anchors
//! 1 -> 0 pointers   Ended(Translate)
//! cancel            Cancelled(..) for every running recognizer
//! ```
//!
//! Re-anchoring keeps the reported translation continuous when a finger joins
//! or leaves, so the photo does not jump toward the new centroid.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;

/// Minimum distance between two pointers for a pinch to be measurable.
pub const MIN_PINCH_DISTANCE: f64 = 10.0;

/// Kind of gesture recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Translate,
    Scale,
    Rotate,
}

impl GestureKind {
    pub const ALL: [GestureKind; 3] = [GestureKind::Translate, GestureKind::Scale, GestureKind::Rotate];

    pub fn as_str(self) -> &'static str {
        match self {
            GestureKind::Translate => "translate",
            GestureKind::Scale => "scale",
            GestureKind::Rotate => "rotate",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translate" | "pan" => Ok(GestureKind::Translate),
            "scale" | "pinch" => Ok(GestureKind::Scale),
            "rotate" | "rotation" => Ok(GestureKind::Rotate),
            other => Err(format!("Unknown gesture kind: {}", other)),
        }
    }
}

/// Cumulative value reported by a running recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GestureUpdate {
    Translate { dx: f64, dy: f64 },
    Scale { ratio: f64 },
    Rotate { angle: f64 },
}

impl GestureUpdate {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureUpdate::Translate { .. } => GestureKind::Translate,
            GestureUpdate::Scale { .. } => GestureKind::Scale,
            GestureUpdate::Rotate { .. } => GestureKind::Rotate,
        }
    }
}

/// Event emitted by a recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Began(GestureKind),
    Changed(GestureUpdate),
    Ended(GestureKind),
    Cancelled(GestureKind),
}

impl GestureEvent {
    pub fn kind(&self) -> GestureKind {
        match self {
            GestureEvent::Began(kind) | GestureEvent::Ended(kind) | GestureEvent::Cancelled(kind) => {
                *kind
            }
            GestureEvent::Changed(update) => update.kind(),
        }
    }
}

/// Host-assigned pointer identifier (touch identifier or pointerId).
pub type PointerId = u32;

#[derive(Debug, Clone, Copy)]
struct Pointer {
    id: PointerId,
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy)]
struct PanState {
    /// Centroid at the last re-anchor.
    anchor: (f64, f64),
    /// Translation accumulated before the last re-anchor.
    carry: (f64, f64),
    /// Last reported translation.
    current: (f64, f64),
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    first: PointerId,
    second: PointerId,
    initial_dist: f64,
    last_angle: f64,
    /// Unwrapped rotation since the pinch began.
    rotation: f64,
}

/// Turns raw pointer input on one photo into recognizer events.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    pointers: Vec<Pointer>,
    pan: Option<PanState>,
    pinch: Option<PinchState>,
}

/// Wrap an angle difference into `(-π, π]`.
fn wrap_angle(delta: f64) -> f64 {
    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn tracks(&self, pointer: PointerId) -> bool {
        self.pointers.iter().any(|p| p.id == pointer)
    }

    fn centroid(&self) -> (f64, f64) {
        let n = self.pointers.len().max(1) as f64;
        let (sx, sy) = self
            .pointers
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        (sx / n, sy / n)
    }

    fn find(&self, id: PointerId) -> Option<Pointer> {
        self.pointers.iter().copied().find(|p| p.id == id)
    }

    fn pair_geometry(&self, first: PointerId, second: PointerId) -> Option<(f64, f64)> {
        let a = self.find(first)?;
        let b = self.find(second)?;
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        Some(((dx * dx + dy * dy).sqrt(), dy.atan2(dx)))
    }

    fn reanchor_pan(&mut self) {
        let centroid = self.centroid();
        if let Some(pan) = &mut self.pan {
            pan.carry = pan.current;
            pan.anchor = centroid;
        }
    }

    fn start_pinch(&mut self, events: &mut Vec<GestureEvent>) {
        if self.pinch.is_some() || self.pointers.len() < 2 {
            return;
        }
        let (first, second) = (self.pointers[0].id, self.pointers[1].id);
        if let Some((dist, angle)) = self.pair_geometry(first, second) {
            self.pinch = Some(PinchState {
                first,
                second,
                initial_dist: dist,
                last_angle: angle,
                rotation: 0.0,
            });
            events.push(GestureEvent::Began(GestureKind::Scale));
            events.push(GestureEvent::Began(GestureKind::Rotate));
        }
    }

    fn end_pinch(&mut self, events: &mut Vec<GestureEvent>) {
        if self.pinch.take().is_some() {
            events.push(GestureEvent::Ended(GestureKind::Scale));
            events.push(GestureEvent::Ended(GestureKind::Rotate));
        }
    }

    /// A pointer touched down on this photo. Non-finite coordinates are ignored.
    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if self.tracks(id) || !(x.is_finite() && y.is_finite()) {
            return events;
        }
        self.pointers.push(Pointer { id, x, y });

        match self.pan {
            None => {
                self.pan = Some(PanState {
                    anchor: (x, y),
                    carry: (0.0, 0.0),
                    current: (0.0, 0.0),
                });
                events.push(GestureEvent::Began(GestureKind::Translate));
            }
            Some(_) => self.reanchor_pan(),
        }

        self.start_pinch(&mut events);
        events
    }

    /// A tracked pointer moved. Untracked pointers and non-finite coordinates
    /// are ignored; the pointer keeps its last valid location.
    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if !(x.is_finite() && y.is_finite()) {
            return events;
        }
        let Some(pointer) = self.pointers.iter_mut().find(|p| p.id == id) else {
            return events;
        };
        pointer.x = x;
        pointer.y = y;

        let centroid = self.centroid();
        if let Some(pan) = &mut self.pan {
            pan.current = (
                pan.carry.0 + centroid.0 - pan.anchor.0,
                pan.carry.1 + centroid.1 - pan.anchor.1,
            );
            events.push(GestureEvent::Changed(GestureUpdate::Translate {
                dx: pan.current.0,
                dy: pan.current.1,
            }));
        }

        if let Some(pinch) = self.pinch {
            if pinch.first == id || pinch.second == id {
                if let Some((dist, angle)) = self.pair_geometry(pinch.first, pinch.second) {
                    let rotation = pinch.rotation + wrap_angle(angle - pinch.last_angle);
                    self.pinch = Some(PinchState {
                        last_angle: angle,
                        rotation,
                        ..pinch
                    });
                    if pinch.initial_dist >= MIN_PINCH_DISTANCE {
                        events.push(GestureEvent::Changed(GestureUpdate::Scale {
                            ratio: dist / pinch.initial_dist,
                        }));
                    }
                    events.push(GestureEvent::Changed(GestureUpdate::Rotate { angle: rotation }));
                }
            }
        }
        events
    }

    /// A tracked pointer lifted.
    pub fn pointer_up(&mut self, id: PointerId) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if !self.tracks(id) {
            return events;
        }
        self.pointers.retain(|p| p.id != id);

        if let Some(pinch) = self.pinch {
            if pinch.first == id || pinch.second == id {
                self.end_pinch(&mut events);
                // A third finger still down takes over as a fresh pinch
                self.start_pinch(&mut events);
            }
        }

        if self.pointers.is_empty() {
            if self.pan.take().is_some() {
                events.push(GestureEvent::Ended(GestureKind::Translate));
            }
        } else {
            self.reanchor_pan();
        }
        events
    }

    /// Input was interrupted by the platform. Every running recognizer is cancelled.
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if self.pan.take().is_some() {
            events.push(GestureEvent::Cancelled(GestureKind::Translate));
        }
        if self.pinch.take().is_some() {
            events.push(GestureEvent::Cancelled(GestureKind::Scale));
            events.push(GestureEvent::Cancelled(GestureKind::Rotate));
        }
        self.pointers.clear();
        events
    }
}
