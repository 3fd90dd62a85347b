//! The remote content/grading service seam.
//!
//! The service is an opaque oracle: one request, one blocking response,
//! no server-side session, no streaming, no cancellation. The engine
//! depends only on this trait; the HTTP envelope lives in the transport
//! crate, and tests substitute scripted implementations.

use async_trait::async_trait;

use crate::content::{ExerciseStep, LessonContent, LessonSummary, VerificationResult, VocabHint};
use crate::error::Result;
use crate::session::Learner;

/// The remote content/grading service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Authenticates a learner and returns their profile and progress.
    async fn login(&self, email: &str, username: &str, password: &str) -> Result<Learner>;

    /// Returns the lesson menu listing.
    async fn lesson_list(&self) -> Result<Vec<LessonSummary>>;

    /// Returns material for one lesson.
    ///
    /// With `allow_generation = false` this is the fast read: it returns
    /// quickly and may yield empty explanation/examples. With generation
    /// allowed the call may block substantially longer while the service
    /// creates content; `force_regenerate` discards what the service had.
    async fn lesson_content(
        &self,
        lesson_id: u32,
        allow_generation: bool,
        force_regenerate: bool,
    ) -> Result<LessonContent>;

    /// Returns one or a small set of vocabulary hints.
    ///
    /// Stateless; repeated calls may return different words.
    async fn vocab_hint(&self) -> Result<Vec<VocabHint>>;

    /// Grades a submitted sentence for the given lesson and step.
    async fn verify_sentence(
        &self,
        uid: &str,
        lesson_id: u32,
        sentence: &str,
        step: ExerciseStep,
    ) -> Result<VerificationResult>;
}
