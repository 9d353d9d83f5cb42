//! Gesture compositor: sessions, selection and commit for one page.
//!
//! The compositor is the single entry point for manipulation input. It can be
//! driven at two levels:
//!
//! - **Recognizer events** ([`GestureCompositor::handle`]) when the host has
//!   its own pan/pinch/rotate recognizers
//! - **Raw pointers** ([`GestureCompositor::pointer_down`] and friends), which
//!   are hit-tested, routed to one photo and run through a [`PointerTracker`]
//!
//! ## Session Lifecycle
//!
//! ```text
//! (none) --Began(k)--> open: capture baseline, select photo, on_gesture_start
//! open   --Began(k)--> open: recognizer joins, baseline reused
//! open   --Changed---> open: recompose from baseline, publish, on_gesture_update
//! open   --Ended(k)--> open while other recognizers run
//! open   --Ended(last)-> (none): clamp, commit once, on_gesture_end
//! open   --Cancelled / remove / unmount / other photo opens--> (none), no commit
//! ```
//!
//! Events for a photo without an open session are stale and dropped.

use crate::boundary::{BoundaryPolicy, Settle};
use crate::collaborator::{GestureListener, PhotoStore};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::gesture::{GestureEvent, GestureKind, GestureUpdate, PointerId, PointerTracker};
use crate::position::{PhotoId, PhotoPosition};
use crate::selection::{SelectionChange, SelectionManager};
use crate::session::GestureSession;
use crate::transform::{compose, RenderTransform, TransformReader, TransformState};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Result of closing a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    /// Position at release, before boundary correction.
    pub released: PhotoPosition,
    /// Position written to the store.
    pub committed: PhotoPosition,
    pub settle: Settle,
}

/// What a single event did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// A session was opened.
    Started,
    /// A recognizer joined an open session.
    Joined,
    /// The live transform changed.
    Updated(RenderTransform),
    /// A recognizer ended; others keep the session open.
    Released,
    /// The last recognizer ended and the position was committed.
    Committed(Commit),
    /// The session was discarded without commit.
    Cancelled,
    /// The event was stale and dropped.
    Ignored,
}

/// Merges concurrent gestures into one transform per photo.
pub struct GestureCompositor<S, L = ()> {
    config: EngineConfig,
    boundary: BoundaryPolicy,
    selection: SelectionManager,
    sessions: HashMap<PhotoId, GestureSession>,
    states: HashMap<PhotoId, TransformState>,
    trackers: HashMap<PhotoId, PointerTracker>,
    pointer_owner: HashMap<PointerId, PhotoId>,
    store: S,
    listener: L,
}

impl<S: PhotoStore> GestureCompositor<S, ()> {
    /// Create a compositor without a listener.
    pub fn with_store(config: EngineConfig, store: S) -> EngineResult<Self> {
        Self::new(config, store, ())
    }
}

impl<S: PhotoStore, L: GestureListener> GestureCompositor<S, L> {
    /// Mount a compositor on a page.
    pub fn new(config: EngineConfig, store: S, listener: L) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            boundary: BoundaryPolicy::from_config(&config),
            config,
            selection: SelectionManager::new(),
            sessions: HashMap::new(),
            states: HashMap::new(),
            trackers: HashMap::new(),
            pointer_owner: HashMap::new(),
            store,
            listener,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the store. Call [`Self::reconcile`] after removing
    /// photos behind the compositor's back.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn active_id(&self) -> Option<&PhotoId> {
        self.selection.active()
    }

    pub fn has_session(&self, id: &PhotoId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Baseline captured by the open session, if any.
    pub fn session_baseline(&self, id: &PhotoId) -> Option<PhotoPosition> {
        self.sessions.get(id).map(|s| *s.baseline())
    }

    // ------------------------------------------------------------------
    // Recognizer events
    // ------------------------------------------------------------------

    /// Start a recognizer on a photo, opening a session if needed.
    pub fn begin(&mut self, id: &PhotoId, kind: GestureKind) -> EngineResult<GestureOutcome> {
        if let Some(session) = self.sessions.get_mut(id) {
            session.begin(kind);
            debug!(photo = %id, %kind, "Recognizer joined open session");
            return Ok(GestureOutcome::Joined);
        }

        let Some(baseline) = self.store.position(id) else {
            warn!(photo = %id, %kind, "Refusing gesture session for unknown photo");
            return Err(EngineError::UnknownPhoto(id.clone()));
        };
        if let Err(err) = baseline.validate(id) {
            warn!(photo = %id, "Refusing gesture session: {}", err);
            return Err(err);
        }

        self.discard_other_sessions(id);

        let writer = self
            .states
            .entry(id.clone())
            .or_default()
            .writer()
            .ok_or_else(|| {
                EngineError::validation(
                    format!("transform state for {}", id),
                    "already owned by another writer",
                )
            })?;

        self.select_inner(id);

        let mut session = GestureSession::open(id.clone(), baseline, writer);
        session.begin(kind);
        session
            .writer()
            .publish(RenderTransform::from_position(&baseline, &baseline));
        self.sessions.insert(id.clone(), session);

        debug!(photo = %id, %kind, "Gesture session opened");
        self.listener.on_gesture_start(id);
        Ok(GestureOutcome::Started)
    }

    /// Record a recognizer's cumulative value and republish the live transform.
    pub fn update(&mut self, id: &PhotoId, update: GestureUpdate) -> EngineResult<GestureOutcome> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::StaleSession(id.clone()))?;
        session.apply(update)?;

        let position = compose(session.baseline(), &session.net(), &self.config);
        let transform = RenderTransform::from_position(&position, session.baseline());
        session.writer().publish(transform);

        trace!(photo = %id, x = transform.x, y = transform.y, width = transform.width, "Live transform");
        self.listener.on_gesture_update(id, &transform);
        Ok(GestureOutcome::Updated(transform))
    }

    /// End a recognizer. Closing the last one commits the position.
    pub fn end(&mut self, id: &PhotoId, kind: GestureKind) -> EngineResult<GestureOutcome> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::StaleSession(id.clone()))?;
        if !session.end(kind)? {
            debug!(photo = %id, %kind, "Recognizer ended, session stays open");
            return Ok(GestureOutcome::Released);
        }

        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| EngineError::StaleSession(id.clone()))?;
        let released = compose(session.baseline(), &session.net(), &self.config);
        let committed = self.boundary.clamp(&released);

        self.store.commit_position(id, committed);
        // Writer released after the commit so readers fall back to the new value
        drop(session);

        let settle = Settle::new(&released, &committed, self.config.settle_duration_ms);
        debug!(
            photo = %id,
            x = committed.x,
            y = committed.y,
            width = committed.width,
            corrected = !settle.is_noop(),
            "Gesture session committed"
        );
        self.listener.on_gesture_end(id, &committed);
        if !settle.is_noop() {
            self.listener.on_settle(id, &settle);
        }

        Ok(GestureOutcome::Committed(Commit {
            released,
            committed,
            settle,
        }))
    }

    /// Discard a photo's session without committing.
    ///
    /// Returns true if a session was open.
    pub fn cancel(&mut self, id: &PhotoId) -> bool {
        self.discard(id, "cancelled")
    }

    /// Apply one recognizer event. Stale events are logged and dropped.
    pub fn handle(&mut self, id: &PhotoId, event: GestureEvent) -> EngineResult<GestureOutcome> {
        let result = match event {
            GestureEvent::Began(kind) => self.begin(id, kind),
            GestureEvent::Changed(update) => self.update(id, update),
            GestureEvent::Ended(kind) => self.end(id, kind),
            GestureEvent::Cancelled(kind) => {
                if self.discard(id, kind.as_str()) {
                    Ok(GestureOutcome::Cancelled)
                } else {
                    Err(EngineError::StaleSession(id.clone()))
                }
            }
        };

        match result {
            Err(err) if err.is_stale() => {
                debug!(photo = %id, ?event, "Dropping stale gesture event");
                Ok(GestureOutcome::Ignored)
            }
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Selection and page lifecycle
    // ------------------------------------------------------------------

    /// Make a photo the active selection.
    ///
    /// Any session open on another photo is discarded.
    pub fn select(&mut self, id: &PhotoId) -> EngineResult<SelectionChange> {
        if self.store.position(id).is_none() {
            return Err(EngineError::UnknownPhoto(id.clone()));
        }
        self.discard_other_sessions(id);
        Ok(self.select_inner(id))
    }

    fn select_inner(&mut self, id: &PhotoId) -> SelectionChange {
        let change = self.selection.select(id);
        if let SelectionChange::Selected { previous } = &change {
            debug!(photo = %id, previous = ?previous, "Photo selected");
            self.listener.on_select(id);
        }
        change
    }

    /// Clear the selection. Open sessions are discarded.
    pub fn deselect_all(&mut self) {
        self.discard_all("deselected");
        if let Some(previous) = self.selection.deselect_all() {
            debug!(photo = %previous, "Selection cleared");
            self.listener.on_deselect();
        }
    }

    /// Remove a photo from the page together with its selection and session.
    pub fn remove_photo(&mut self, id: &PhotoId) {
        self.discard(id, "photo removed");
        self.states.remove(id);
        let was_active = self.selection.remove(id);
        self.store.remove_photo(id);
        debug!(photo = %id, was_active, "Photo removed");
        if was_active {
            self.listener.on_deselect();
        }
    }

    /// Tear down on page exit: discard all sessions and clear selection.
    pub fn unmount(&mut self) {
        self.discard_all("page unmounted");
        self.trackers.clear();
        self.pointer_owner.clear();
        self.states.clear();
        let had_active = self.selection.active().is_some();
        self.selection = SelectionManager::new();
        if had_active {
            self.listener.on_deselect();
        }
    }

    /// Drop sessions and selection for photos no longer in the store.
    pub fn reconcile(&mut self) {
        let present = self.store.photo_ids();
        let missing: Vec<PhotoId> = self
            .states
            .keys()
            .chain(self.trackers.keys())
            .filter(|id| !present.contains(*id))
            .cloned()
            .collect();
        for id in missing {
            self.discard(&id, "photo missing from page");
            self.states.remove(&id);
        }
        if self.selection.reconcile(&present) {
            debug!("Active photo left the page, selection cleared");
            self.listener.on_deselect();
        }
    }

    fn discard(&mut self, id: &PhotoId, reason: &str) -> bool {
        self.trackers.remove(id);
        self.pointer_owner.retain(|_, owner| owner != id);
        match self.sessions.remove(id) {
            Some(_) => {
                debug!(photo = %id, reason, "Gesture session discarded without commit");
                true
            }
            None => false,
        }
    }

    fn discard_other_sessions(&mut self, keep: &PhotoId) {
        let others: Vec<PhotoId> = self
            .sessions
            .keys()
            .chain(self.trackers.keys())
            .filter(|id| *id != keep)
            .cloned()
            .collect();
        for id in others {
            self.discard(&id, "another photo took the gesture");
        }
    }

    fn discard_all(&mut self, reason: &str) {
        let ids: Vec<PhotoId> = self
            .sessions
            .keys()
            .chain(self.trackers.keys())
            .cloned()
            .collect();
        for id in ids {
            self.discard(&id, reason);
        }
    }

    // ------------------------------------------------------------------
    // Render path
    // ------------------------------------------------------------------

    /// Subscribe the render path to a photo's live transform.
    pub fn transform_reader(&mut self, id: &PhotoId) -> TransformReader {
        self.states.entry(id.clone()).or_default().reader()
    }

    /// Live transform while a session is open.
    pub fn render_transform(&self, id: &PhotoId) -> Option<RenderTransform> {
        self.states.get(id).and_then(|s| s.reader().current())
    }

    /// Live position while a session is open, else the committed one.
    pub fn display_position(&self, id: &PhotoId) -> Option<PhotoPosition> {
        match self.sessions.get(id) {
            Some(session) => Some(compose(session.baseline(), &session.net(), &self.config)),
            None => self.store.position(id),
        }
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Photos under a canvas point, topmost first.
    pub fn hit_test(&self, x: f64, y: f64) -> Vec<PhotoId> {
        let mut hits: Vec<(i32, usize, PhotoId)> = self
            .store
            .photo_ids()
            .into_iter()
            .enumerate()
            .filter_map(|(order, id)| {
                let position = self.display_position(&id)?;
                position
                    .contains_point(x, y)
                    .then_some((position.z_index, order, id))
            })
            .collect();
        hits.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        hits.into_iter().map(|(_, _, id)| id).collect()
    }

    /// Pick the owner among overlapping candidates (topmost first).
    ///
    /// Active photo, then most recently selected, then topmost.
    pub fn route(&self, candidates: &[PhotoId]) -> Option<PhotoId> {
        self.selection
            .resolve(candidates)
            .or_else(|| candidates.first())
            .cloned()
    }

    /// Active photo with pointers currently down on it.
    fn engaged_photo(&self) -> Option<PhotoId> {
        let active = self.selection.active()?;
        self.trackers
            .get(active)
            .filter(|t| !t.is_idle())
            .map(|_| active.clone())
    }

    /// A pointer touched the canvas.
    ///
    /// A pointer that misses every photo joins a manipulation in progress, or
    /// clears the selection when there is none.
    pub fn pointer_down(&mut self, pointer: PointerId, x: f64, y: f64) -> EngineResult<Vec<GestureOutcome>> {
        if self.pointer_owner.contains_key(&pointer) {
            return Ok(Vec::new());
        }

        let candidates = self.hit_test(x, y);
        let target = match self.route(&candidates).or_else(|| self.engaged_photo()) {
            Some(target) => target,
            None => {
                debug!(pointer, x, y, "Pointer down on empty canvas");
                self.deselect_all();
                return Ok(Vec::new());
            }
        };

        let events = self
            .trackers
            .entry(target.clone())
            .or_default()
            .pointer_down(pointer, x, y);
        self.pointer_owner.insert(pointer, target.clone());
        self.dispatch(&target, events)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64) -> EngineResult<Vec<GestureOutcome>> {
        let Some(owner) = self.pointer_owner.get(&pointer).cloned() else {
            return Ok(Vec::new());
        };
        let events = match self.trackers.get_mut(&owner) {
            Some(tracker) => tracker.pointer_move(pointer, x, y),
            None => Vec::new(),
        };
        self.dispatch(&owner, events)
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> EngineResult<Vec<GestureOutcome>> {
        let Some(owner) = self.pointer_owner.remove(&pointer) else {
            return Ok(Vec::new());
        };
        let events = match self.trackers.get_mut(&owner) {
            Some(tracker) => {
                let events = tracker.pointer_up(pointer);
                if tracker.is_idle() {
                    self.trackers.remove(&owner);
                }
                events
            }
            None => Vec::new(),
        };
        self.dispatch(&owner, events)
    }

    /// The platform interrupted a pointer. The whole manipulation is discarded.
    pub fn pointer_cancel(&mut self, pointer: PointerId) -> EngineResult<Vec<GestureOutcome>> {
        let Some(owner) = self.pointer_owner.remove(&pointer) else {
            return Ok(Vec::new());
        };
        let events = match self.trackers.remove(&owner) {
            Some(mut tracker) => tracker.cancel(),
            None => Vec::new(),
        };
        self.pointer_owner.retain(|_, o| *o != owner);
        self.dispatch(&owner, events)
    }

    fn dispatch(&mut self, id: &PhotoId, events: Vec<GestureEvent>) -> EngineResult<Vec<GestureOutcome>> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            match self.handle(id, event) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) if matches!(event, GestureEvent::Began(_)) => {
                    self.discard(id, "refused");
                    return Err(err);
                }
                Err(err) => {
                    // Session keeps its last valid accumulators
                    warn!(photo = %id, ?event, "Dropping invalid gesture event: {}", err);
                }
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PhotoPage;
    use crate::position::FreePhoto;

    #[derive(Debug, Clone, PartialEq)]
    enum Heard {
        Start(PhotoId),
        Update(PhotoId),
        End(PhotoId, PhotoPosition),
        Settle(PhotoId),
        Select(PhotoId),
        Deselect,
    }

    #[derive(Debug, Default)]
    struct Recorder {
        heard: Vec<Heard>,
    }

    impl Recorder {
        fn ends(&self) -> Vec<&Heard> {
            self.heard
                .iter()
                .filter(|h| matches!(h, Heard::End(..)))
                .collect()
        }

        fn selects(&self) -> usize {
            self.heard
                .iter()
                .filter(|h| matches!(h, Heard::Select(_)))
                .count()
        }
    }

    impl GestureListener for Recorder {
        fn on_gesture_start(&mut self, id: &PhotoId) {
            self.heard.push(Heard::Start(id.clone()));
        }
        fn on_gesture_update(&mut self, id: &PhotoId, _transform: &RenderTransform) {
            self.heard.push(Heard::Update(id.clone()));
        }
        fn on_gesture_end(&mut self, id: &PhotoId, position: &PhotoPosition) {
            self.heard.push(Heard::End(id.clone(), *position));
        }
        fn on_settle(&mut self, id: &PhotoId, _settle: &Settle) {
            self.heard.push(Heard::Settle(id.clone()));
        }
        fn on_select(&mut self, id: &PhotoId) {
            self.heard.push(Heard::Select(id.clone()));
        }
        fn on_deselect(&mut self) {
            self.heard.push(Heard::Deselect);
        }
    }

    fn id(s: &str) -> PhotoId {
        PhotoId::from(s)
    }

    fn page() -> PhotoPage {
        PhotoPage::from_photos(vec![
            FreePhoto::new("a", "a.jpg", PhotoPosition::new(100.0, 100.0, 150.0, 150.0)),
            FreePhoto::new(
                "b",
                "b.jpg",
                PhotoPosition::new(0.0, 400.0, 100.0, 50.0).with_z_index(1),
            ),
        ])
    }

    fn compositor() -> GestureCompositor<PhotoPage, Recorder> {
        GestureCompositor::new(EngineConfig::default(), page(), Recorder::default()).unwrap()
    }

    fn run_full_gesture(c: &mut GestureCompositor<PhotoPage, Recorder>, photo: &PhotoId) -> GestureOutcome {
        c.begin(photo, GestureKind::Translate).unwrap();
        c.begin(photo, GestureKind::Scale).unwrap();
        c.begin(photo, GestureKind::Rotate).unwrap();
        c.update(photo, GestureUpdate::Translate { dx: 50.0, dy: 20.0 }).unwrap();
        c.update(photo, GestureUpdate::Scale { ratio: 1.5 }).unwrap();
        c.update(photo, GestureUpdate::Rotate { angle: 0.2 }).unwrap();
        c.end(photo, GestureKind::Rotate).unwrap();
        c.end(photo, GestureKind::Scale).unwrap();
        c.end(photo, GestureKind::Translate).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EngineConfig::default().with_size_bounds(0.0, 10.0);
        assert!(GestureCompositor::with_store(config, page()).is_err());
    }

    #[test]
    fn test_combined_gesture_scenario() {
        let mut c = compositor();
        let a = id("a");
        let outcome = run_full_gesture(&mut c, &a);

        let GestureOutcome::Committed(commit) = outcome else {
            panic!("expected commit, got {:?}", outcome);
        };
        assert_eq!(commit.released.x, 150.0);
        assert_eq!(commit.released.y, 120.0);
        assert_eq!(commit.released.width, 225.0);
        assert_eq!(commit.released.height, 225.0);
        assert!((commit.released.rotation - 0.2).abs() < 1e-12);

        assert_eq!(commit.committed.x, 75.0);
        assert_eq!(commit.committed.y, 120.0);
        assert_eq!(c.store().position(&a), Some(commit.committed));
        assert!(!c.has_session(&a));
    }

    #[test]
    fn test_scale_clamped_to_max_size() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Scale).unwrap();
        c.update(&a, GestureUpdate::Scale { ratio: 4.0 }).unwrap();
        let GestureOutcome::Committed(commit) = c.end(&a, GestureKind::Scale).unwrap() else {
            panic!("expected commit");
        };
        assert_eq!(commit.committed.width, 450.0);
        assert_eq!(commit.committed.height, 450.0);
    }

    #[test]
    fn test_baseline_captured_once() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.update(&a, GestureUpdate::Translate { dx: 10.0, dy: 0.0 }).unwrap();

        // Collaborator position changes mid-session; second finger must not re-read it
        c.store_mut()
            .commit_position(&a, PhotoPosition::new(0.0, 0.0, 150.0, 150.0));
        assert_eq!(c.begin(&a, GestureKind::Scale).unwrap(), GestureOutcome::Joined);
        assert_eq!(c.session_baseline(&a).unwrap().x, 100.0);

        let GestureOutcome::Updated(t) = c.update(&a, GestureUpdate::Scale { ratio: 1.0 }).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(t.x, 110.0);
    }

    #[test]
    fn test_session_open_selects_once() {
        let mut c = compositor();
        let a = id("a");
        run_full_gesture(&mut c, &a);
        assert_eq!(c.listener().selects(), 1);
        assert_eq!(c.active_id(), Some(&a));

        // Already active: a second gesture does not reselect
        run_full_gesture(&mut c, &a);
        assert_eq!(c.listener().selects(), 1);
    }

    #[test]
    fn test_listener_sequence() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.update(&a, GestureUpdate::Translate { dx: 5.0, dy: 5.0 }).unwrap();
        c.end(&a, GestureKind::Translate).unwrap();

        assert_eq!(
            c.listener().heard,
            vec![
                Heard::Select(a.clone()),
                Heard::Start(a.clone()),
                Heard::Update(a.clone()),
                Heard::End(a.clone(), PhotoPosition::new(105.0, 105.0, 150.0, 150.0)),
            ]
        );
    }

    #[test]
    fn test_settle_reported_when_corrected() {
        let mut c = compositor();
        let a = id("a");
        run_full_gesture(&mut c, &a);
        assert!(c.listener().heard.contains(&Heard::Settle(a)));
    }

    #[test]
    fn test_commit_happens_once_per_gesture() {
        let mut c = compositor();
        let a = id("a");
        run_full_gesture(&mut c, &a);
        assert_eq!(c.listener().ends().len(), 1);

        // A late end for the closed session is stale
        assert_eq!(
            c.handle(&a, GestureEvent::Ended(GestureKind::Translate)).unwrap(),
            GestureOutcome::Ignored
        );
        assert_eq!(c.listener().ends().len(), 1);
    }

    #[test]
    fn test_stale_event_after_cancel_changes_nothing() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.update(&a, GestureUpdate::Translate { dx: 40.0, dy: 0.0 }).unwrap();
        assert!(c.cancel(&a));

        let revision = c.store().revision();
        let outcome = c
            .handle(&a, GestureEvent::Changed(GestureUpdate::Translate { dx: 80.0, dy: 0.0 }))
            .unwrap();
        assert_eq!(outcome, GestureOutcome::Ignored);
        let outcome = c.handle(&a, GestureEvent::Ended(GestureKind::Translate)).unwrap();
        assert_eq!(outcome, GestureOutcome::Ignored);

        assert_eq!(c.store().revision(), revision);
        assert_eq!(c.store().position(&a).unwrap().x, 100.0);
        assert!(c.render_transform(&a).is_none());
        assert!(c.listener().ends().is_empty());
    }

    #[test]
    fn test_direct_calls_surface_stale_error() {
        let mut c = compositor();
        let err = c
            .update(&id("a"), GestureUpdate::Translate { dx: 1.0, dy: 1.0 })
            .unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_invalid_baseline_refused() {
        let mut bad = page();
        bad.insert(FreePhoto::new("z", "z.jpg", PhotoPosition::new(0.0, 0.0, 0.0, 100.0)));
        let mut c = GestureCompositor::new(EngineConfig::default(), bad, Recorder::default()).unwrap();
        let z = id("z");

        let err = c.begin(&z, GestureKind::Translate).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(!c.has_session(&z));
        assert!(c.active_id().is_none());
        assert!(c.listener().heard.is_empty());
        assert_eq!(c.store().position(&z).unwrap().width, 0.0);
    }

    #[test]
    fn test_unknown_photo_refused() {
        let mut c = compositor();
        let err = c.begin(&id("ghost"), GestureKind::Scale).unwrap_err();
        assert_eq!(err, EngineError::UnknownPhoto(id("ghost")));
    }

    #[test]
    fn test_invalid_update_keeps_session() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Scale).unwrap();
        c.update(&a, GestureUpdate::Scale { ratio: 2.0 }).unwrap();
        assert!(c.update(&a, GestureUpdate::Scale { ratio: -3.0 }).is_err());
        assert!(c.has_session(&a));
        assert_eq!(c.render_transform(&a).unwrap().width, 300.0);
    }

    #[test]
    fn test_render_transform_live_then_cleared() {
        let mut c = compositor();
        let a = id("a");
        let reader = c.transform_reader(&a);
        assert!(reader.current().is_none());

        c.begin(&a, GestureKind::Translate).unwrap();
        assert_eq!(reader.current().unwrap().x, 100.0);
        c.update(&a, GestureUpdate::Translate { dx: -300.0, dy: 0.0 }).unwrap();
        // Overshoot visible while live
        assert_eq!(reader.current().unwrap().x, -200.0);

        c.end(&a, GestureKind::Translate).unwrap();
        assert!(reader.current().is_none());
        assert_eq!(c.store().position(&a).unwrap().x, 0.0);
    }

    #[test]
    fn test_selection_exclusive_across_photos() {
        let mut c = compositor();
        c.select(&id("a")).unwrap();
        c.select(&id("b")).unwrap();
        assert!(!c.selection().is_active(&id("a")));
        assert_eq!(c.active_id(), Some(&id("b")));
    }

    #[test]
    fn test_select_unknown_photo() {
        let mut c = compositor();
        assert!(c.select(&id("ghost")).is_err());
        assert!(c.active_id().is_none());
    }

    #[test]
    fn test_opening_other_session_discards_first() {
        let mut c = compositor();
        let (a, b) = (id("a"), id("b"));
        c.begin(&a, GestureKind::Translate).unwrap();
        c.update(&a, GestureUpdate::Translate { dx: 30.0, dy: 0.0 }).unwrap();

        c.begin(&b, GestureKind::Translate).unwrap();
        assert!(!c.has_session(&a));
        assert_eq!(c.active_id(), Some(&b));
        assert_eq!(c.store().position(&a).unwrap().x, 100.0);
        assert!(c.render_transform(&a).is_none());

        assert_eq!(
            c.handle(&a, GestureEvent::Ended(GestureKind::Translate)).unwrap(),
            GestureOutcome::Ignored
        );
    }

    #[test]
    fn test_remove_active_photo_mid_gesture() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.update(&a, GestureUpdate::Translate { dx: 30.0, dy: 0.0 }).unwrap();

        c.remove_photo(&a);
        assert!(c.active_id().is_none());
        assert!(!c.has_session(&a));
        assert!(c.store().position(&a).is_none());
        assert_eq!(c.listener().heard.last(), Some(&Heard::Deselect));
        assert!(c.listener().ends().is_empty());

        assert_eq!(
            c.handle(&a, GestureEvent::Ended(GestureKind::Translate)).unwrap(),
            GestureOutcome::Ignored
        );
    }

    #[test]
    fn test_remove_inactive_photo_keeps_selection() {
        let mut c = compositor();
        c.select(&id("a")).unwrap();
        c.remove_photo(&id("b"));
        assert_eq!(c.active_id(), Some(&id("a")));
        assert_ne!(c.listener().heard.last(), Some(&Heard::Deselect));
    }

    #[test]
    fn test_unmount_discards_without_commit() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Rotate).unwrap();
        c.update(&a, GestureUpdate::Rotate { angle: 1.0 }).unwrap();
        let revision = c.store().revision();

        c.unmount();
        assert!(!c.has_session(&a));
        assert!(c.active_id().is_none());
        assert_eq!(c.store().revision(), revision);
        assert_eq!(c.listener().heard.last(), Some(&Heard::Deselect));
    }

    #[test]
    fn test_recognizer_cancel_discards_session() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.begin(&a, GestureKind::Scale).unwrap();
        c.update(&a, GestureUpdate::Scale { ratio: 2.0 }).unwrap();

        let outcome = c.handle(&a, GestureEvent::Cancelled(GestureKind::Scale)).unwrap();
        assert_eq!(outcome, GestureOutcome::Cancelled);
        assert!(!c.has_session(&a));
        assert_eq!(c.store().position(&a).unwrap().width, 150.0);
    }

    #[test]
    fn test_reconcile_after_external_removal() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.store_mut().remove_photo(&a);

        c.reconcile();
        assert!(!c.has_session(&a));
        assert!(c.active_id().is_none());
    }

    #[test]
    fn test_deselect_all_fires_once() {
        let mut c = compositor();
        c.select(&id("a")).unwrap();
        c.deselect_all();
        c.deselect_all();
        let deselects = c
            .listener()
            .heard
            .iter()
            .filter(|h| **h == Heard::Deselect)
            .count();
        assert_eq!(deselects, 1);
    }

    #[test]
    fn test_hit_test_orders_topmost_first() {
        let mut store = page();
        store.insert(FreePhoto::new(
            "c",
            "c.jpg",
            PhotoPosition::new(120.0, 120.0, 100.0, 100.0).with_z_index(5),
        ));
        let c = GestureCompositor::with_store(EngineConfig::default(), store).unwrap();
        assert_eq!(c.hit_test(150.0, 150.0), vec![id("c"), id("a")]);
        assert_eq!(c.hit_test(105.0, 105.0), vec![id("a")]);
        assert!(c.hit_test(5.0, 5.0).is_empty());
    }

    #[test]
    fn test_route_prefers_most_recently_selected() {
        let mut store = page();
        store.insert(FreePhoto::new(
            "c",
            "c.jpg",
            PhotoPosition::new(120.0, 120.0, 100.0, 100.0).with_z_index(5),
        ));
        let mut c = GestureCompositor::with_store(EngineConfig::default(), store).unwrap();
        let candidates = c.hit_test(150.0, 150.0);

        assert_eq!(c.route(&candidates), Some(id("c")));
        c.select(&id("a")).unwrap();
        assert_eq!(c.route(&candidates), Some(id("a")));
        c.select(&id("b")).unwrap();
        // b not hit; a was selected more recently than c
        assert_eq!(c.route(&candidates), Some(id("a")));
    }

    #[test]
    fn test_pointer_drag_commits_clamped() {
        let mut c = compositor();
        let a = id("a");

        let outcomes = c.pointer_down(1, 150.0, 150.0).unwrap();
        assert_eq!(outcomes, vec![GestureOutcome::Started]);
        c.pointer_move(1, 350.0, 170.0).unwrap();
        assert_eq!(c.render_transform(&a).unwrap().x, 300.0);

        let outcomes = c.pointer_up(1).unwrap();
        let Some(GestureOutcome::Committed(commit)) = outcomes.last() else {
            panic!("expected commit, got {:?}", outcomes);
        };
        assert_eq!(commit.committed.x, 150.0);
        assert_eq!(commit.committed.y, 120.0);
    }

    #[test]
    fn test_pointer_pinch_and_twist() {
        let mut c = compositor();
        let a = id("a");

        c.pointer_down(1, 110.0, 175.0).unwrap();
        // Second finger lands off the photo but joins the manipulation in progress
        let outcomes = c.pointer_down(2, 260.0, 175.0).unwrap();
        assert_eq!(outcomes, vec![GestureOutcome::Joined, GestureOutcome::Joined]);

        // Spread to 1.5x distance symmetrically: centroid stays put
        c.pointer_move(1, 72.5, 175.0).unwrap();
        c.pointer_move(2, 297.5, 175.0).unwrap();
        let live = c.render_transform(&a).unwrap();
        assert!((live.width - 225.0).abs() < 1e-9);
        assert!(live.rotation.abs() < 1e-12);

        c.pointer_up(2).unwrap();
        let outcomes = c.pointer_up(1).unwrap();
        let Some(GestureOutcome::Committed(commit)) = outcomes.last() else {
            panic!("expected commit, got {:?}", outcomes);
        };
        assert!((commit.committed.width - 225.0).abs() < 1e-9);
        assert_eq!(commit.committed.x, 75.0);
    }

    #[test]
    fn test_tap_on_empty_canvas_deselects() {
        let mut c = compositor();
        c.select(&id("a")).unwrap();
        assert!(c.pointer_down(1, 5.0, 5.0).unwrap().is_empty());
        assert!(c.active_id().is_none());
        assert!(c.pointer_move(1, 6.0, 6.0).unwrap().is_empty());
        assert!(c.pointer_up(1).unwrap().is_empty());
    }

    #[test]
    fn test_pointer_cancel_discards() {
        let mut c = compositor();
        let a = id("a");
        c.pointer_down(1, 150.0, 150.0).unwrap();
        c.pointer_move(1, 200.0, 150.0).unwrap();

        let outcomes = c.pointer_cancel(1).unwrap();
        assert_eq!(outcomes[0], GestureOutcome::Cancelled);
        assert!(!c.has_session(&a));
        assert_eq!(c.store().position(&a).unwrap().x, 100.0);
    }

    #[test]
    fn test_non_finite_pointer_move_keeps_drag() {
        let mut c = compositor();
        let a = id("a");
        c.pointer_down(1, 150.0, 150.0).unwrap();
        c.pointer_move(1, 160.0, 150.0).unwrap();

        assert!(c.pointer_move(1, f64::NAN, 150.0).unwrap().is_empty());
        assert!(c.has_session(&a));
        assert_eq!(c.render_transform(&a).unwrap().x, 110.0);

        c.pointer_move(1, 170.0, 150.0).unwrap();
        let outcomes = c.pointer_up(1).unwrap();
        let Some(GestureOutcome::Committed(commit)) = outcomes.last() else {
            panic!("expected commit, got {:?}", outcomes);
        };
        assert_eq!(commit.committed.x, 120.0);
        assert_eq!(c.store().position(&a).unwrap().x, 120.0);
    }

    #[test]
    fn test_invalid_update_in_batch_is_dropped() {
        let mut c = compositor();
        let a = id("a");
        c.begin(&a, GestureKind::Translate).unwrap();
        c.begin(&a, GestureKind::Scale).unwrap();

        let outcomes = c
            .dispatch(
                &a,
                vec![
                    GestureEvent::Changed(GestureUpdate::Translate { dx: 10.0, dy: 0.0 }),
                    GestureEvent::Changed(GestureUpdate::Scale { ratio: f64::NAN }),
                    GestureEvent::Changed(GestureUpdate::Scale { ratio: 2.0 }),
                ],
            )
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(c.has_session(&a));
        let live = c.render_transform(&a).unwrap();
        assert_eq!((live.x, live.width), (110.0, 300.0));
    }

    #[test]
    fn test_pointer_on_other_photo_takes_over() {
        let mut c = compositor();
        let (a, b) = (id("a"), id("b"));
        c.pointer_down(1, 150.0, 150.0).unwrap();
        c.pointer_move(1, 160.0, 150.0).unwrap();

        // Finger on b (no overlap with a)
        c.pointer_down(2, 50.0, 420.0).unwrap();
        assert!(!c.has_session(&a));
        assert!(c.has_session(&b));

        // Moves of the first finger are no longer routed anywhere
        assert!(c.pointer_move(1, 170.0, 150.0).unwrap().is_empty());
        assert_eq!(c.store().position(&a).unwrap().x, 100.0);
    }

    #[test]
    fn test_pointer_on_invalid_photo_is_refused_cleanly() {
        let mut bad = page();
        bad.insert(FreePhoto::new(
            "z",
            "z.jpg",
            PhotoPosition::new(0.0, 0.0, 50.0, 50.0).with_z_index(9),
        ));
        // Corrupt the height after insertion
        bad.commit_position(&id("z"), PhotoPosition::new(0.0, 0.0, 50.0, -5.0).with_z_index(9));
        let mut c = GestureCompositor::with_store(EngineConfig::default(), bad).unwrap();

        // Negative height never contains a point
        assert!(c.hit_test(10.0, 10.0).is_empty());
        assert!(c.begin(&id("z"), GestureKind::Translate).is_err());
        assert!(!c.has_session(&id("z")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
