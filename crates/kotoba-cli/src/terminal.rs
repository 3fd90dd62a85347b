//! Terminal rendering of engine effects.

use kotoba_core::content::{ExerciseStep, LessonContent, VerificationResult, VocabHint};
use kotoba_core::gate::Control;
use kotoba_core::ui::{MenuEntry, UiSurface, View};

/// Renders engine effects as plain terminal output.
///
/// The terminal has no real overlay or per-button spinners; busy state
/// is reflected as transient lines and the rest as debug traces.
#[derive(Debug, Default)]
pub struct TerminalUi;

impl UiSurface for TerminalUi {
    fn show_view(&self, view: View) {
        match view {
            View::Login => println!("\n-- Sign in (type 'login') --"),
            View::Menu => println!("\n-- Lesson menu --"),
            View::Lesson => println!("\n-- Lesson --"),
        }
    }

    fn render_menu(&self, entries: &[MenuEntry]) {
        for entry in entries {
            let mark = if entry.locked { "  [locked]" } else { "" };
            println!("  {}. {}{mark}", entry.summary.id, entry.summary.title);
        }
    }

    fn render_lesson(&self, content: &LessonContent) {
        println!("\n=== {} ===", content.title);
        if content.explanation.is_empty() {
            println!("(content not generated yet)");
            return;
        }
        for pair in &content.explanation {
            println!("  {}", pair.primary);
            if !pair.secondary.is_empty() {
                println!("    {}", pair.secondary);
            }
        }
        if !content.examples.is_empty() {
            println!("Examples:");
            for pair in &content.examples {
                println!("  {}  /  {}", pair.primary, pair.secondary);
            }
        }
    }

    fn show_step(&self, step: ExerciseStep, qa_prompt: Option<&str>) {
        let banner = match step {
            ExerciseStep::Explanation => "Read the explanation, then type 'next'.",
            ExerciseStep::Free => "Write any sentence using this grammar ('submit <text>').",
            ExerciseStep::Vocab => {
                "Fetch a hint ('hint') and write a sentence using a hinted word."
            }
            ExerciseStep::Qa => "Answer the prompt below ('submit <text>').",
        };
        println!("\n[{step}] {banner}");
        if let Some(prompt) = qa_prompt {
            println!("  Prompt: {prompt}");
        }
    }

    fn show_hints(&self, hints: &[VocabHint]) {
        println!("Hints:");
        for hint in hints {
            let reading = if hint.furigana.is_empty() {
                String::new()
            } else {
                format!(" ({})", hint.furigana)
            };
            println!("  {}{reading} - {}", hint.word, hint.meaning);
        }
    }

    fn show_feedback(&self, result: &VerificationResult) {
        let verdict = if result.is_correct { "Correct!" } else { "Not quite." };
        println!("{verdict} {}", result.feedback);
        if !result.refined_sentence.is_empty() {
            println!("  Suggested: {}", result.refined_sentence);
        }
        if result.is_correct {
            println!("  Type 'next' to continue.");
        }
    }

    fn set_busy(&self, control: Control, busy: bool) {
        tracing::debug!(%control, busy, "busy state");
    }

    fn show_overlay(&self, visible: bool) {
        if visible {
            println!("...");
        }
    }

    fn set_generating(&self, active: bool) {
        if active {
            println!("Generating lesson content, this can take a while...");
        }
    }

    fn notify(&self, message: &str) {
        println!("* {message}");
    }
}
