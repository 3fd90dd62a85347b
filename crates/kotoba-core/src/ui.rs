//! The abstract UI surface.
//!
//! Rendering, styling, and widget wiring are collaborator concerns; the
//! engine only needs a handful of effects: show a view, render content,
//! reflect busy state, and surface a transient notice. Implementations
//! must be callable through `&self` (interior mutability where needed).

use crate::content::{ExerciseStep, LessonContent, LessonSummary, VerificationResult, VocabHint};
use crate::gate::Control;

// ============================================================================
// View and MenuEntry
// ============================================================================

/// Top-level view containers, shown one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The login form.
    Login,
    /// The lesson menu.
    Menu,
    /// An open lesson.
    Lesson,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Menu => "menu",
            Self::Lesson => "lesson",
        };
        f.write_str(name)
    }
}

/// A menu row: the lesson summary plus its computed lock state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// The lesson listing entry.
    pub summary: LessonSummary,
    /// `true` when the lesson is beyond the learner's frontier.
    pub locked: bool,
}

// ============================================================================
// UiSurface
// ============================================================================

/// Effects the engine emits toward whatever renders the client.
pub trait UiSurface: Send + Sync {
    /// Switches to the given view container.
    fn show_view(&self, view: View);

    /// Renders the lesson menu with lock flags.
    fn render_menu(&self, entries: &[MenuEntry]);

    /// Renders (or re-renders) the open lesson's content.
    fn render_lesson(&self, content: &LessonContent);

    /// Updates the stepper indicator; for the Q&A step the selected
    /// prompt is supplied.
    fn show_step(&self, step: ExerciseStep, qa_prompt: Option<&str>);

    /// Renders the accumulated vocabulary hints.
    fn show_hints(&self, hints: &[VocabHint]);

    /// Renders grading feedback for the current step.
    fn show_feedback(&self, result: &VerificationResult);

    /// Reflects a control's busy affordance.
    fn set_busy(&self, control: Control, busy: bool);

    /// Raises or clears the process-wide blocking overlay.
    fn show_overlay(&self, visible: bool);

    /// Raises or clears the distinct "generating" affordance used while
    /// the expensive generation pass is outstanding.
    fn set_generating(&self, active: bool);

    /// Surfaces a transient notice.
    fn notify(&self, message: &str);
}

// ============================================================================
// Test support
// ============================================================================

/// A recording [`UiSurface`] for tests: every effect is appended to an
/// event log as a readable string.
pub mod test_support {
    use std::sync::Mutex;

    use super::{
        Control, ExerciseStep, LessonContent, MenuEntry, UiSurface, VerificationResult, View,
        VocabHint,
    };

    /// Records every UI effect for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingUi {
        events: Mutex<Vec<String>>,
    }

    impl RecordingUi {
        /// Returns a copy of the recorded event log.
        #[must_use]
        pub fn events(&self) -> Vec<String> {
            self.events.lock().map_or_else(|_| Vec::new(), |e| e.clone())
        }

        /// Returns `true` if any recorded event starts with the prefix.
        #[must_use]
        pub fn saw(&self, prefix: &str) -> bool {
            self.events().iter().any(|e| e.starts_with(prefix))
        }

        fn push(&self, event: String) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }

    impl UiSurface for RecordingUi {
        fn show_view(&self, view: View) {
            self.push(format!("view {view}"));
        }

        fn render_menu(&self, entries: &[MenuEntry]) {
            let summary = entries
                .iter()
                .map(|e| format!("{}{}", e.summary.id, if e.locked { "*" } else { "" }))
                .collect::<Vec<_>>()
                .join(",");
            self.push(format!("menu {summary}"));
        }

        fn render_lesson(&self, content: &LessonContent) {
            self.push(format!(
                "lesson {} explanation={} examples={} prompts={}",
                content.id,
                content.explanation.len(),
                content.examples.len(),
                content.quiz_prompts.len()
            ));
        }

        fn show_step(&self, step: ExerciseStep, qa_prompt: Option<&str>) {
            match qa_prompt {
                Some(prompt) => self.push(format!("step {step} prompt={prompt}")),
                None => self.push(format!("step {step}")),
            }
        }

        fn show_hints(&self, hints: &[VocabHint]) {
            let words = hints
                .iter()
                .map(|h| h.word.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.push(format!("hints {words}"));
        }

        fn show_feedback(&self, result: &VerificationResult) {
            let verdict = if result.is_correct { "pass" } else { "fail" };
            self.push(format!("feedback {verdict} {}", result.feedback));
        }

        fn set_busy(&self, control: Control, busy: bool) {
            self.push(format!(
                "busy {control} {}",
                if busy { "on" } else { "off" }
            ));
        }

        fn show_overlay(&self, visible: bool) {
            self.push(format!("overlay {}", if visible { "on" } else { "off" }));
        }

        fn set_generating(&self, active: bool) {
            self.push(format!(
                "generating {}",
                if active { "on" } else { "off" }
            ));
        }

        fn notify(&self, message: &str) {
            self.push(format!("notify {message}"));
        }
    }
}
