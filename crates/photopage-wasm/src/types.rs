//! JS-facing types for engine results.
//!
//! Every payload uses camelCase field names, matching the host's page model
//! and the exported method names. Outcomes are plain objects tagged by `type`:
//!
//! ```typescript
//! { type: "updated", transform: { x, y, width, height, rotation, scale } }
//! { type: "committed", released: {...}, committed: {...}, settle: { fromX, fromY, toX, toY, durationMs } }
//! ```

use photopage_core::{EngineError, GestureOutcome, PhotoPosition, RenderTransform, Settle};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Serializable mirror of [`GestureOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsOutcome {
    Started,
    Joined,
    Updated {
        transform: RenderTransform,
    },
    Released,
    Committed {
        released: PhotoPosition,
        committed: PhotoPosition,
        settle: Settle,
    },
    Cancelled,
    Ignored,
}

impl From<&GestureOutcome> for JsOutcome {
    fn from(outcome: &GestureOutcome) -> Self {
        match outcome {
            GestureOutcome::Started => JsOutcome::Started,
            GestureOutcome::Joined => JsOutcome::Joined,
            GestureOutcome::Updated(transform) => JsOutcome::Updated {
                transform: *transform,
            },
            GestureOutcome::Released => JsOutcome::Released,
            GestureOutcome::Committed(commit) => JsOutcome::Committed {
                released: commit.released,
                committed: commit.committed,
                settle: commit.settle,
            },
            GestureOutcome::Cancelled => JsOutcome::Cancelled,
            GestureOutcome::Ignored => JsOutcome::Ignored,
        }
    }
}

pub(crate) fn js_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

pub(crate) fn outcome_to_js(outcome: &GestureOutcome) -> Result<JsValue, JsValue> {
    to_js(&JsOutcome::from(outcome))
}

pub(crate) fn outcomes_to_js(outcomes: &[GestureOutcome]) -> Result<JsValue, JsValue> {
    let outcomes: Vec<JsOutcome> = outcomes.iter().map(JsOutcome::from).collect();
    to_js(&outcomes)
}
