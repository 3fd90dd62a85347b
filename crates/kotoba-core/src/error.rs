//! Error types for the Kotoba lesson engine.
//!
//! Every failure in this system is locally recoverable: the learner stays on
//! the current step and may retry. There is no fatal error class. The
//! variants below exist so call sites can decide *how* to recover:
//! surface a notice and re-enable the control, or discard a late
//! response without telling anyone.

/// A specialized `Result` type for Kotoba engine operations.
pub type Result<T> = std::result::Result<T, KotobaError>;

/// Errors that can occur while driving a lesson session.
#[derive(Debug, thiserror::Error)]
pub enum KotobaError {
    // ========================================================================
    // Local validation (no network call was issued)
    // ========================================================================
    /// Input failed a local check before any call went out.
    ///
    /// No network request is issued and no state changes.
    #[error("{message}")]
    Validation {
        /// User-facing description of what was wrong with the input.
        message: String,
    },

    /// A non-Admin learner tried to open a lesson beyond their frontier.
    ///
    /// The menu already disables locked lessons; this is the defensive
    /// re-check in the open path.
    #[error("lesson {lesson_id} is locked (progress is at lesson {progress_id})")]
    LessonLocked {
        /// The lesson the learner tried to open.
        lesson_id: u32,
        /// The learner's current frontier.
        progress_id: u32,
    },

    // ========================================================================
    // Remote call failures (recovered at the call site)
    // ========================================================================
    /// The call never produced a usable response: network failure, non-2xx
    /// status, or a body that did not parse.
    #[error("network error during '{action}': {message}")]
    Transport {
        /// The envelope action that was being performed.
        action: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The service answered with `status: "error"`.
    ///
    /// The message is passed through to the learner verbatim.
    #[error("'{action}' failed: {message}")]
    Oracle {
        /// The envelope action that was being performed.
        action: String,
        /// Error message from the service envelope.
        message: String,
    },

    // ========================================================================
    // Late responses (discarded silently)
    // ========================================================================
    /// A response arrived after the learner navigated away from the
    /// lesson or step it was meant for. Not surfaced to the learner.
    #[error("stale response for lesson {lesson_id} discarded")]
    Stale {
        /// The lesson the late response targeted.
        lesson_id: u32,
    },

    // ========================================================================
    // Serialization / I/O passthrough
    // ========================================================================
    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error from the session backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KotobaError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Oracle` error.
    #[must_use]
    pub fn oracle(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Oracle {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Stale` error for the given lesson.
    #[must_use]
    pub const fn stale(lesson_id: u32) -> Self {
        Self::Stale { lesson_id }
    }

    /// Returns `true` if this error should be swallowed without surfacing
    /// a notice to the learner.
    ///
    /// Only late responses for departed contexts qualify.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Returns `true` if no network call was issued for this failure.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::LessonLocked { .. })
    }
}
