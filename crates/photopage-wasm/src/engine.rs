//! Gesture engine bindings.
//!
//! `JsPhotoEngine` wraps a [`GestureCompositor`] whose page collaborator and
//! listener are plain JavaScript objects.
//!
//! The collaborator must provide:
//!
//! - `getPosition(id)` - committed position object, or `undefined`
//! - `commitPosition(id, position)` - persist a final position
//! - `removePhoto(id)` - drop a photo from the page
//! - `photoIds()` - ids in stacking order, bottom first
//!
//! Every listener callback is optional: `onGestureStart(id)`,
//! `onGestureUpdate(id, transform)`, `onGestureEnd(id, position)`,
//! `onSettle(id, settle)`, `onSelect(id)`, `onDeselect()`.
//!
//! Callbacks run synchronously inside the engine call and must not call back
//! into the same engine.

use crate::types::{js_error, outcome_to_js, outcomes_to_js, to_js};
use js_sys::{Function, Reflect};
use photopage_core::{
    EngineConfig, GestureCompositor, GestureKind, GestureListener, GestureUpdate, PhotoId,
    PhotoPosition, PhotoStore, RenderTransform, Settle,
};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

fn lookup(object: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(object, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
}

fn required(object: &JsValue, name: &str) -> Result<Function, JsValue> {
    lookup(object, name)
        .ok_or_else(|| JsValue::from_str(&format!("collaborator.{} must be a function", name)))
}

fn id_value(id: &PhotoId) -> JsValue {
    JsValue::from_str(id.as_str())
}

/// Page collaborator backed by JS callbacks.
struct JsStore {
    get_position: Function,
    commit_position: Function,
    remove_photo: Function,
    photo_ids: Function,
}

impl JsStore {
    fn from_js(collaborator: &JsValue) -> Result<Self, JsValue> {
        Ok(Self {
            get_position: required(collaborator, "getPosition")?,
            commit_position: required(collaborator, "commitPosition")?,
            remove_photo: required(collaborator, "removePhoto")?,
            photo_ids: required(collaborator, "photoIds")?,
        })
    }
}

impl PhotoStore for JsStore {
    fn position(&self, id: &PhotoId) -> Option<PhotoPosition> {
        let value = match self.get_position.call1(&JsValue::NULL, &id_value(id)) {
            Ok(value) => value,
            Err(err) => {
                warn!(photo = %id, error = ?err, "getPosition threw");
                return None;
            }
        };
        if value.is_undefined() || value.is_null() {
            return None;
        }
        match serde_wasm_bindgen::from_value(value) {
            Ok(position) => Some(position),
            Err(err) => {
                warn!(photo = %id, "getPosition returned an invalid position: {}", err);
                None
            }
        }
    }

    fn commit_position(&mut self, id: &PhotoId, position: PhotoPosition) {
        let result = to_js(&position)
            .and_then(|value| self.commit_position.call2(&JsValue::NULL, &id_value(id), &value));
        if let Err(err) = result {
            warn!(photo = %id, error = ?err, "commitPosition failed");
        }
    }

    fn remove_photo(&mut self, id: &PhotoId) {
        if let Err(err) = self.remove_photo.call1(&JsValue::NULL, &id_value(id)) {
            warn!(photo = %id, error = ?err, "removePhoto threw");
        }
    }

    fn photo_ids(&self) -> Vec<PhotoId> {
        let value = match self.photo_ids.call0(&JsValue::NULL) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = ?err, "photoIds threw");
                return Vec::new();
            }
        };
        serde_wasm_bindgen::from_value(value).unwrap_or_else(|err| {
            warn!("photoIds returned an invalid list: {}", err);
            Vec::new()
        })
    }
}

/// Listener backed by optional JS callbacks.
#[derive(Default)]
struct JsListener {
    on_gesture_start: Option<Function>,
    on_gesture_update: Option<Function>,
    on_gesture_end: Option<Function>,
    on_settle: Option<Function>,
    on_select: Option<Function>,
    on_deselect: Option<Function>,
}

impl JsListener {
    fn from_js(listener: &JsValue) -> Self {
        if listener.is_undefined() || listener.is_null() {
            return Self::default();
        }
        Self {
            on_gesture_start: lookup(listener, "onGestureStart"),
            on_gesture_update: lookup(listener, "onGestureUpdate"),
            on_gesture_end: lookup(listener, "onGestureEnd"),
            on_settle: lookup(listener, "onSettle"),
            on_select: lookup(listener, "onSelect"),
            on_deselect: lookup(listener, "onDeselect"),
        }
    }

    fn notify(callback: &Option<Function>, name: &str, id: &PhotoId) {
        if let Some(callback) = callback {
            if let Err(err) = callback.call1(&JsValue::NULL, &id_value(id)) {
                warn!(callback = name, error = ?err, "Listener threw");
            }
        }
    }

    fn notify_with<T: Serialize>(callback: &Option<Function>, name: &str, id: &PhotoId, payload: &T) {
        if let Some(callback) = callback {
            let result = to_js(payload)
                .and_then(|value| callback.call2(&JsValue::NULL, &id_value(id), &value));
            if let Err(err) = result {
                warn!(callback = name, error = ?err, "Listener threw");
            }
        }
    }
}

impl GestureListener for JsListener {
    fn on_gesture_start(&mut self, id: &PhotoId) {
        Self::notify(&self.on_gesture_start, "onGestureStart", id);
    }

    fn on_gesture_update(&mut self, id: &PhotoId, transform: &RenderTransform) {
        Self::notify_with(&self.on_gesture_update, "onGestureUpdate", id, transform);
    }

    fn on_gesture_end(&mut self, id: &PhotoId, position: &PhotoPosition) {
        Self::notify_with(&self.on_gesture_end, "onGestureEnd", id, position);
    }

    fn on_settle(&mut self, id: &PhotoId, settle: &Settle) {
        Self::notify_with(&self.on_settle, "onSettle", id, settle);
    }

    fn on_select(&mut self, id: &PhotoId) {
        Self::notify(&self.on_select, "onSelect", id);
    }

    fn on_deselect(&mut self) {
        if let Some(callback) = &self.on_deselect {
            if let Err(err) = callback.call0(&JsValue::NULL) {
                warn!(callback = "onDeselect", error = ?err, "Listener threw");
            }
        }
    }
}

fn parse_kind(kind: &str) -> Result<GestureKind, JsValue> {
    kind.parse::<GestureKind>().map_err(|e| JsValue::from_str(&e))
}

/// Gesture engine for one mounted page.
#[wasm_bindgen]
pub struct JsPhotoEngine {
    inner: GestureCompositor<JsStore, JsListener>,
}

#[wasm_bindgen]
impl JsPhotoEngine {
    /// Mount an engine on a page.
    ///
    /// `config` may be `undefined` or a partial `EngineConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, collaborator: JsValue, listener: JsValue) -> Result<JsPhotoEngine, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid engine config: {}", e)))?
        };
        let store = JsStore::from_js(&collaborator)?;
        let inner = GestureCompositor::new(config, store, JsListener::from_js(&listener)).map_err(js_error)?;
        Ok(Self { inner })
    }

    /// Start a recognizer (`"translate"`, `"scale"` or `"rotate"`) on a photo.
    #[wasm_bindgen(js_name = gestureBegin)]
    pub fn gesture_begin(&mut self, id: &str, kind: &str) -> Result<JsValue, JsValue> {
        let kind = parse_kind(kind)?;
        let outcome = self.inner.begin(&PhotoId::from(id), kind).map_err(js_error)?;
        outcome_to_js(&outcome)
    }

    /// Report a cumulative recognizer value, e.g. `{ kind: "scale", ratio: 1.2 }`.
    #[wasm_bindgen(js_name = gestureUpdate)]
    pub fn gesture_update(&mut self, id: &str, update: JsValue) -> Result<JsValue, JsValue> {
        let update: GestureUpdate = serde_wasm_bindgen::from_value(update)
            .map_err(|e| JsValue::from_str(&format!("Invalid gesture update: {}", e)))?;
        let outcome = self
            .inner
            .handle(&PhotoId::from(id), photopage_core::GestureEvent::Changed(update))
            .map_err(js_error)?;
        outcome_to_js(&outcome)
    }

    #[wasm_bindgen(js_name = gestureEnd)]
    pub fn gesture_end(&mut self, id: &str, kind: &str) -> Result<JsValue, JsValue> {
        let kind = parse_kind(kind)?;
        let outcome = self
            .inner
            .handle(&PhotoId::from(id), photopage_core::GestureEvent::Ended(kind))
            .map_err(js_error)?;
        outcome_to_js(&outcome)
    }

    /// Discard the photo's session without committing.
    #[wasm_bindgen(js_name = gestureCancel)]
    pub fn gesture_cancel(&mut self, id: &str) -> bool {
        self.inner.cancel(&PhotoId::from(id))
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, pointer: u32, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let outcomes = self.inner.pointer_down(pointer, x, y).map_err(js_error)?;
        outcomes_to_js(&outcomes)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, pointer: u32, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let outcomes = self.inner.pointer_move(pointer, x, y).map_err(js_error)?;
        outcomes_to_js(&outcomes)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, pointer: u32) -> Result<JsValue, JsValue> {
        let outcomes = self.inner.pointer_up(pointer).map_err(js_error)?;
        outcomes_to_js(&outcomes)
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, pointer: u32) -> Result<JsValue, JsValue> {
        let outcomes = self.inner.pointer_cancel(pointer).map_err(js_error)?;
        outcomes_to_js(&outcomes)
    }

    /// Make a photo active. Returns true if the selection changed.
    pub fn select(&mut self, id: &str) -> Result<bool, JsValue> {
        let change = self.inner.select(&PhotoId::from(id)).map_err(js_error)?;
        Ok(change.changed())
    }

    #[wasm_bindgen(js_name = deselectAll)]
    pub fn deselect_all(&mut self) {
        self.inner.deselect_all();
    }

    #[wasm_bindgen(js_name = removePhoto)]
    pub fn remove_photo(&mut self, id: &str) {
        self.inner.remove_photo(&PhotoId::from(id));
    }

    /// Re-read the page after photos were removed outside the engine.
    pub fn reconcile(&mut self) {
        self.inner.reconcile();
    }

    /// Page exit: discard all sessions and clear the selection.
    pub fn unmount(&mut self) {
        self.inner.unmount();
    }

    #[wasm_bindgen(getter, js_name = activeId)]
    pub fn active_id(&self) -> Option<String> {
        self.inner.active_id().map(|id| id.as_str().to_string())
    }

    #[wasm_bindgen(js_name = hasSession)]
    pub fn has_session(&self, id: &str) -> bool {
        self.inner.has_session(&PhotoId::from(id))
    }

    /// Live transform, or `undefined` when the committed position applies.
    #[wasm_bindgen(js_name = renderTransform)]
    pub fn render_transform(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.inner.render_transform(&PhotoId::from(id)) {
            Some(transform) => to_js(&transform),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Position to draw: live while a gesture runs, else committed.
    #[wasm_bindgen(js_name = displayPosition)]
    pub fn display_position(&self, id: &str) -> Result<JsValue, JsValue> {
        match self.inner.display_position(&PhotoId::from(id)) {
            Some(position) => to_js(&position),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Ids of photos under a canvas point, topmost first.
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: f64, y: f64) -> Vec<String> {
        self.inner
            .hit_test(x, y)
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }
}
