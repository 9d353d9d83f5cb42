//! Error types for the manipulation engine.
//!
//! None of these are fatal to the host. Every failure path leaves the photo at
//! its last committed position.

use crate::position::PhotoId;
use thiserror::Error;

/// Errors produced by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A baseline, delta or configuration value is malformed.
    #[error("Invalid {what}: {reason}")]
    Validation {
        /// What was being validated (e.g. "baseline for photo-1").
        what: String,
        /// Human-readable reason.
        reason: String,
    },

    /// An event arrived for a session that no longer exists.
    #[error("No open gesture session for photo {0}")]
    StaleSession(PhotoId),

    /// The collaborator has no position for this photo.
    #[error("Unknown photo: {0}")]
    UnknownPhoto(PhotoId),
}

impl EngineError {
    pub(crate) fn validation(what: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for events that should be dropped quietly.
    pub fn is_stale(&self) -> bool {
        matches!(self, EngineError::StaleSession(_))
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
