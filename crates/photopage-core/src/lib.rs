//! Photopage Core - Photo manipulation engine
//!
//! This crate provides the interaction core for free-placed photos on a page:
//! concurrent drag, pinch and rotate gestures merged into one transform,
//! boundary correction on release, and exclusive selection.
//!
//! It has no rendering or storage of its own. The page layer plugs in through
//! [`PhotoStore`] and [`GestureListener`]; the render path reads live values
//! through [`TransformReader`].

pub mod boundary;
pub mod collaborator;
pub mod compositor;
pub mod config;
pub mod error;
pub mod gesture;
pub mod page;
pub mod position;
pub mod selection;
pub mod session;
pub mod transform;

pub use boundary::{smootherstep, BoundaryPolicy, Settle};
pub use collaborator::{GestureListener, PhotoStore};
pub use compositor::{Commit, GestureCompositor, GestureOutcome};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use gesture::{GestureEvent, GestureKind, GestureUpdate, PointerId, PointerTracker};
pub use page::PhotoPage;
pub use position::{FreePhoto, PhotoId, PhotoPosition};
pub use selection::{SelectionChange, SelectionManager};
pub use transform::{compose, Accumulators, RenderTransform, TransformReader, TransformState};
