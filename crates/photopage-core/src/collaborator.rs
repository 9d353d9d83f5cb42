//! Interfaces between the engine and the page/project layer.
//!
//! The page layer owns the canonical photo positions ([`PhotoStore`]) and
//! wants to hear about gesture progress ([`GestureListener`]). Neither call
//! may block: the engine runs on the interaction loop.

use crate::boundary::Settle;
use crate::position::{PhotoId, PhotoPosition};
use crate::transform::RenderTransform;

/// Canonical storage of photo positions on one page.
pub trait PhotoStore {
    /// Last committed position, read once per session open.
    fn position(&self, id: &PhotoId) -> Option<PhotoPosition>;

    /// Persist a final position. Called at most once per gesture end.
    ///
    /// Must be idempotent: committing the value already stored has no effect.
    /// Fire-and-forget; the engine does not wait for the write to land.
    fn commit_position(&mut self, id: &PhotoId, position: PhotoPosition);

    /// Remove a photo from the page.
    fn remove_photo(&mut self, id: &PhotoId);

    /// Ids of photos currently on the page, bottom of the stack first.
    fn photo_ids(&self) -> Vec<PhotoId>;
}

/// Notifications emitted by the engine. All methods default to no-ops.
pub trait GestureListener {
    fn on_gesture_start(&mut self, _id: &PhotoId) {}

    /// High frequency; for redraw only.
    fn on_gesture_update(&mut self, _id: &PhotoId, _transform: &RenderTransform) {}

    /// `position` is the boundary-corrected value that was committed.
    fn on_gesture_end(&mut self, _id: &PhotoId, _position: &PhotoPosition) {}

    /// Visual settle from the release point to the committed position.
    fn on_settle(&mut self, _id: &PhotoId, _settle: &Settle) {}

    fn on_select(&mut self, _id: &PhotoId) {}

    fn on_deselect(&mut self) {}
}

impl GestureListener for () {}
