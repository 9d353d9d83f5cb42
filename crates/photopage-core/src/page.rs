//! In-memory page of free-placed photos.
//!
//! `PhotoPage` is the reference [`PhotoStore`]: it owns the canonical
//! positions, keeps photos in stacking order and counts effective writes so
//! callers can tell whether a commit changed anything.

use crate::collaborator::PhotoStore;
use crate::config::EngineConfig;
use crate::position::{FreePhoto, PhotoId, PhotoPosition};
use serde::{Deserialize, Serialize};

/// A page holding free-placed photos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoPage {
    photos: Vec<FreePhoto>,
    /// Number of writes that changed a stored position.
    #[serde(skip)]
    revision: u64,
    #[serde(skip)]
    next_id: u64,
}

impl PhotoPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_photos(photos: Vec<FreePhoto>) -> Self {
        Self {
            photos,
            ..Self::default()
        }
    }

    pub fn photos(&self) -> &[FreePhoto] {
        &self.photos
    }

    pub fn get(&self, id: &PhotoId) -> Option<&FreePhoto> {
        self.photos.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn top_z_index(&self) -> i32 {
        self.photos
            .iter()
            .map(|p| p.position.z_index)
            .max()
            .unwrap_or(0)
    }

    fn fresh_id(&mut self) -> PhotoId {
        loop {
            self.next_id += 1;
            let id = PhotoId::new(format!("photo-{}", self.next_id));
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Insert a photo as given. An existing photo with the same id is replaced.
    pub fn insert(&mut self, photo: FreePhoto) {
        match self.photos.iter_mut().find(|p| p.id == photo.id) {
            Some(existing) => *existing = photo,
            None => self.photos.push(photo),
        }
        self.revision += 1;
    }

    /// Place a new photo on top of the stack at the nominal size.
    ///
    /// `aspect_ratio` is height over width of the image.
    pub fn add_photo(
        &mut self,
        image_ref: impl Into<String>,
        x: f64,
        y: f64,
        aspect_ratio: f64,
        config: &EngineConfig,
    ) -> PhotoId {
        let id = self.fresh_id();
        let width = config.nominal_size;
        let position = PhotoPosition::new(x, y, width, width * aspect_ratio)
            .with_z_index(self.top_z_index() + 1);
        self.insert(FreePhoto::new(id.clone(), image_ref, position));
        id
    }

    /// Move a photo to the top of the stack.
    pub fn bring_to_front(&mut self, id: &PhotoId) -> bool {
        let top = self.top_z_index();
        let Some(current) = self.get(id).map(|p| p.position.z_index) else {
            return false;
        };
        let is_sole_top = current == top
            && self
                .photos
                .iter()
                .filter(|p| p.position.z_index == top)
                .count()
                == 1;
        if is_sole_top {
            return false;
        }
        if let Some(photo) = self.photos.iter_mut().find(|p| &p.id == id) {
            photo.position.z_index = top + 1;
        }
        self.revision += 1;
        true
    }
}

impl PhotoStore for PhotoPage {
    fn position(&self, id: &PhotoId) -> Option<PhotoPosition> {
        self.get(id).map(|p| p.position)
    }

    fn commit_position(&mut self, id: &PhotoId, position: PhotoPosition) {
        if let Some(photo) = self.photos.iter_mut().find(|p| &p.id == id) {
            if photo.position != position {
                photo.position = position;
                self.revision += 1;
            }
        } else {
            tracing::debug!(photo = %id, "Commit for photo no longer on page dropped");
        }
    }

    fn remove_photo(&mut self, id: &PhotoId) {
        let before = self.photos.len();
        self.photos.retain(|p| &p.id != id);
        if self.photos.len() != before {
            self.revision += 1;
        }
    }

    fn photo_ids(&self) -> Vec<PhotoId> {
        self.photos.iter().map(|p| p.id.clone()).collect()
    }
}
