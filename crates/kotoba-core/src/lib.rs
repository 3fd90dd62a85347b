//! Kotoba Lesson Engine
//!
//! Drives a remote-tutored Japanese lesson client: exercise flow, lazy
//! content loading, session-backed progress, and request gating.

pub mod app;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod flow;
pub mod gate;
pub mod oracle;
pub mod session;
pub mod ui;

pub use app::App;
pub use cache::LessonCache;
pub use config::Config;
pub use content::{
    decode_pairs, decode_prompts, ExamplePair, ExerciseStep, LessonContent, LessonSummary,
    VerificationResult, VocabHint, ENTRY_DELIMITER, FIELD_DELIMITER,
};
pub use error::{KotobaError, Result};
pub use flow::{Advance, ExerciseFlow, StepPhase};
pub use gate::{Control, GateOutcome, RequestGate, DEFAULT_OVERLAY_TIMEOUT, TIMEOUT_NOTICE};
pub use oracle::Oracle;
pub use session::{FileBackend, Learner, MemoryBackend, Role, SessionBackend, SessionStore};
pub use ui::{MenuEntry, UiSurface, View};
