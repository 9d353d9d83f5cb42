//! Page-scoped selection of the single active photo.
//!
//! The active photo is the one showing manipulation affordances (outline,
//! remove control, resize handles). Selection is exclusive: selecting one
//! photo deselects any other.
//!
//! A manager lives exactly as long as its page is mounted. Besides the active
//! id it remembers the order in which photos were selected, which is used to
//! break ties when a pointer lands where several photos overlap.

use crate::position::PhotoId;

/// Outcome of a selection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// The id was already active; nothing happened.
    Unchanged,
    /// The id became active. `previous` was active before and is now deselected.
    Selected { previous: Option<PhotoId> },
}

impl SelectionChange {
    pub fn changed(&self) -> bool {
        matches!(self, SelectionChange::Selected { .. })
    }
}

/// Tracks which photo on a page is active.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    active: Option<PhotoId>,
    /// Previously selected ids, most recent last. Never contains duplicates.
    recency: Vec<PhotoId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&PhotoId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &PhotoId) -> bool {
        self.active.as_ref() == Some(id)
    }

    /// Make `id` the active photo.
    pub fn select(&mut self, id: &PhotoId) -> SelectionChange {
        if self.is_active(id) {
            return SelectionChange::Unchanged;
        }
        self.touch(id);
        let previous = self.active.replace(id.clone());
        SelectionChange::Selected { previous }
    }

    /// Clear the active photo. Returns the id that was active.
    pub fn deselect_all(&mut self) -> Option<PhotoId> {
        self.active.take()
    }

    /// Forget a removed photo. Returns true if it was the active one.
    pub fn remove(&mut self, id: &PhotoId) -> bool {
        self.recency.retain(|r| r != id);
        if self.is_active(id) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// Drop any reference to ids no longer present on the page.
    ///
    /// Returns true if the active id was cleared.
    pub fn reconcile(&mut self, present: &[PhotoId]) -> bool {
        self.recency.retain(|r| present.contains(r));
        match &self.active {
            Some(active) if !present.contains(active) => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// Pick the owner of an ambiguous event among overlapping candidates.
    ///
    /// The active photo wins if it is a candidate; otherwise the most recently
    /// selected candidate; otherwise `None`, leaving the caller to fall back
    /// to stacking order.
    pub fn resolve<'a>(&self, candidates: &'a [PhotoId]) -> Option<&'a PhotoId> {
        if let Some(active) = &self.active {
            if let Some(hit) = candidates.iter().find(|c| *c == active) {
                return Some(hit);
            }
        }
        self.recency
            .iter()
            .rev()
            .find_map(|recent| candidates.iter().find(|c| *c == recent))
    }

    fn touch(&mut self, id: &PhotoId) {
        self.recency.retain(|r| r != id);
        self.recency.push(id.clone());
    }
}
