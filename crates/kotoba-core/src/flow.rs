//! Exercise flow state machine.
//!
//! Sequences the four steps of an open lesson
//! (`Explanation → Free → Vocab → Qa`) and applies the correctness gating:
//! a graded step is only left after a correct verdict, at which point the
//! input locks and a "continue" affordance replaces "submit". The machine
//! is pure (it never talks to the network or the screen), so every
//! transition is testable in isolation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{ExerciseStep, VerificationResult, VocabHint};
use crate::error::{KotobaError, Result};

// ============================================================================
// StepPhase and Advance
// ============================================================================

/// Where the learner is within the current step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Input is editable; a submission may be sent.
    #[default]
    Composing,
    /// A correct verdict arrived; input is locked and the learner may
    /// continue to the next step.
    Passed,
}

/// Outcome of a "next"/"continue" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The flow moved to the given step.
    Moved(ExerciseStep),
    /// The final step was completed; the lesson is over.
    Done,
    /// The current step has not been passed yet; nothing changed.
    Blocked,
}

// ============================================================================
// ExerciseFlow
// ============================================================================

/// State of one open lesson's exercise progression.
#[derive(Debug, Clone)]
pub struct ExerciseFlow {
    lesson_id: u32,
    step: ExerciseStep,
    phase: StepPhase,
    qa_prompt: Option<String>,
    hints: Vec<VocabHint>,
    feedback: Option<VerificationResult>,
}

impl ExerciseFlow {
    /// Opens a lesson at the `Explanation` step.
    #[must_use]
    pub fn new(lesson_id: u32) -> Self {
        Self {
            lesson_id,
            step: ExerciseStep::Explanation,
            phase: StepPhase::Composing,
            qa_prompt: None,
            hints: Vec::new(),
            feedback: None,
        }
    }

    /// The lesson this flow belongs to.
    #[must_use]
    pub const fn lesson_id(&self) -> u32 {
        self.lesson_id
    }

    /// The step currently shown.
    #[must_use]
    pub const fn step(&self) -> ExerciseStep {
        self.step
    }

    /// The phase within the current step.
    #[must_use]
    pub const fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Returns `true` while the input control is locked (correct verdict
    /// received, waiting for "continue").
    #[must_use]
    pub const fn is_input_locked(&self) -> bool {
        matches!(self.phase, StepPhase::Passed)
    }

    /// The prompt selected for the Q&A step, once entered.
    #[must_use]
    pub fn qa_prompt(&self) -> Option<&str> {
        self.qa_prompt.as_deref()
    }

    /// Vocabulary hints fetched during the current `Vocab` step.
    #[must_use]
    pub fn hints(&self) -> &[VocabHint] {
        &self.hints
    }

    /// The most recent verdict for the current step, for display.
    #[must_use]
    pub const fn feedback(&self) -> Option<&VerificationResult> {
        self.feedback.as_ref()
    }

    /// Checks a submission locally before any network call.
    ///
    /// Rejects empty sentences and submissions against a locked input or
    /// an ungraded step. On rejection nothing changes and no call may be
    /// issued.
    pub fn validate_submission(&self, sentence: &str) -> Result<()> {
        if !self.step.is_graded() {
            return Err(KotobaError::validation(
                "nothing to submit on the explanation step",
            ));
        }
        if self.is_input_locked() {
            return Err(KotobaError::validation(
                "this step is already passed; continue to the next one",
            ));
        }
        if sentence.trim().is_empty() {
            return Err(KotobaError::validation("please enter a sentence"));
        }
        Ok(())
    }

    /// Applies a grading verdict to the current step.
    ///
    /// A correct verdict locks the input; an incorrect one leaves it
    /// editable for another attempt (there is no retry limit). The
    /// verdict is kept for display and discarded on step change.
    ///
    /// Returns `true` if the verdict was correct.
    pub fn apply_verdict(&mut self, result: VerificationResult) -> bool {
        debug!(
            lesson_id = self.lesson_id,
            step = %self.step,
            is_correct = result.is_correct,
            "verdict applied"
        );
        let passed = result.is_correct;
        if passed {
            self.phase = StepPhase::Passed;
        }
        self.feedback = Some(result);
        passed
    }

    /// Attempts to move to the next step.
    ///
    /// `Explanation` advances unconditionally; graded steps require a
    /// prior correct verdict. Completing `Qa` yields [`Advance::Done`].
    /// Entering a new step resets input, feedback, and hint state.
    pub fn advance(&mut self) -> Advance {
        if self.step.is_graded() && !self.is_input_locked() {
            return Advance::Blocked;
        }

        match self.step.next() {
            Some(next) => {
                debug!(lesson_id = self.lesson_id, from = %self.step, to = %next, "step advanced");
                self.step = next;
                self.reset_step_state();
                Advance::Moved(next)
            }
            None => {
                debug!(lesson_id = self.lesson_id, "lesson completed");
                Advance::Done
            }
        }
    }

    /// Records the prompt chosen for the Q&A step at the moment it is
    /// entered.
    pub fn set_qa_prompt(&mut self, prompt: Option<String>) {
        self.qa_prompt = prompt;
    }

    /// Appends fetched vocabulary hints to the displayed set.
    ///
    /// Repeated fetches within the `Vocab` step simply accumulate; they
    /// do not affect grading.
    pub fn add_hints(&mut self, hints: impl IntoIterator<Item = VocabHint>) {
        self.hints.extend(hints);
    }

    /// Re-enters the current step with fresh content (the regenerate
    /// path): input, feedback, and hint state are reset; the step itself
    /// does not change.
    pub fn reenter_step(&mut self) {
        debug!(lesson_id = self.lesson_id, step = %self.step, "step re-entered");
        self.reset_step_state();
    }

    fn reset_step_state(&mut self) {
        self.phase = StepPhase::Composing;
        self.qa_prompt = None;
        self.hints.clear();
        self.feedback = None;
    }
}
