//! Photopage WASM - WebAssembly bindings for the Photopage engine
//!
//! This crate exposes the photopage-core gesture engine to JavaScript and
//! TypeScript page editors.
//!
//! # Module Structure
//!
//! - `engine` - `JsPhotoEngine`, the compositor bound to a JS page collaborator
//! - `types` - JS-facing outcome types and error conversion
//! - `logging` - tracing output to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsPhotoEngine, initLogging } from '@photopage/wasm';
//!
//! await init();
//! initLogging('photopage_core=debug');
//!
//! const engine = new JsPhotoEngine({ canvasWidth: 320, canvasHeight: 640 }, {
//!   getPosition: (id) => page.positions[id],
//!   commitPosition: (id, pos) => page.save(id, pos),
//!   removePhoto: (id) => page.remove(id),
//!   photoIds: () => page.order,
//! }, { onSettle: (id, settle) => animate(id, settle) });
//!
//! canvas.onpointerdown = (e) => engine.pointerDown(e.pointerId, e.offsetX, e.offsetY);
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod logging;
mod types;

pub use engine::JsPhotoEngine;
pub use logging::init_logging;
pub use types::JsOutcome;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Eased settle position `elapsed_ms` after release, as `[x, y]`.
///
/// `settle` is the object passed to the `onSettle` listener.
#[wasm_bindgen(js_name = settlePosition)]
pub fn settle_position(settle: JsValue, elapsed_ms: f64) -> Result<Vec<f64>, JsValue> {
    let settle: photopage_core::Settle = serde_wasm_bindgen::from_value(settle)
        .map_err(|e| JsValue::from_str(&format!("Invalid settle: {}", e)))?;
    let (x, y) = settle.sample(elapsed_ms);
    Ok(vec![x, y])
}

/// Smootherstep easing, for hosts driving their own settle animation.
#[wasm_bindgen]
pub fn smootherstep(t: f64) -> f64 {
    photopage_core::smootherstep(t)
}
