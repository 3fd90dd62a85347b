//! Application controller.
//!
//! Owns the session, the lesson cache, and the active exercise flow, and
//! drives every operation the UI can trigger: login, menu load, lesson
//! open (two-phase), hint fetch, submission, step advancement, and
//! logout. All outbound calls go through the [`RequestGate`]; every
//! response that arrives after the learner left the context it targeted
//! is discarded silently.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::LessonCache;
use crate::config::Config;
use crate::content::{ExerciseStep, LessonSummary};
use crate::error::{KotobaError, Result};
use crate::flow::{Advance, ExerciseFlow};
use crate::gate::{Control, RequestGate};
use crate::oracle::Oracle;
use crate::session::{Learner, SessionStore};
use crate::ui::{MenuEntry, UiSurface, View};

/// Notice shown when the final step of a lesson is completed.
const COMPLETION_NOTICE: &str = "Lesson complete! Great work.";

/// Mutable application state, guarded by one lock.
///
/// Locked only across synchronous sections; never held over a network
/// await, so late responses always re-check context before applying.
#[derive(Default)]
struct AppState {
    learner: Option<Learner>,
    cache: LessonCache,
    flow: Option<ExerciseFlow>,
    menu: Vec<LessonSummary>,
}

/// The lesson client's controller.
pub struct App {
    oracle: Arc<dyn Oracle>,
    ui: Arc<dyn UiSurface>,
    session: SessionStore,
    gate: RequestGate,
    state: Mutex<AppState>,
}

impl App {
    /// Creates a controller over the given collaborators.
    #[must_use]
    pub fn new(
        oracle: Arc<dyn Oracle>,
        ui: Arc<dyn UiSurface>,
        session: SessionStore,
        config: &Config,
    ) -> Self {
        Self {
            oracle,
            ui,
            session,
            gate: RequestGate::new(config.overlay_timeout()),
            state: Mutex::new(AppState::default()),
        }
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Restores a persisted session if one exists, landing on the menu;
    /// otherwise shows the login view.
    pub async fn bootstrap(&self) -> Result<()> {
        match self.session.restore() {
            Some(learner) => {
                info!(uid = %learner.uid, "session restored");
                self.state.lock().await.learner = Some(learner);
                self.load_menu().await
            }
            None => {
                self.ui.show_view(View::Login);
                Ok(())
            }
        }
    }

    /// Authenticates the learner and loads the menu.
    ///
    /// Empty username or password fails locally; no call is issued.
    pub async fn login(&self, email: &str, username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() || password.trim().is_empty() {
            return self.report(Err(KotobaError::validation(
                "please enter both username and password",
            )));
        }

        let call = self.oracle.login(email, username, password);
        let Some(result) = self
            .gate
            .run(Control::Login, self.ui.as_ref(), call)
            .await
            .into_completed()
        else {
            return Ok(());
        };

        let learner = match result {
            Ok(learner) => learner,
            Err(err) => return self.report(Err(err)),
        };

        info!(uid = %learner.uid, progress = learner.progress_id, "login succeeded");
        self.session.commit(&learner)?;
        self.state.lock().await.learner = Some(learner);
        self.load_menu().await
    }

    /// Clears the session and returns to the login view.
    ///
    /// The lesson cache is per-session, so it is dropped too.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear()?;
        let mut state = self.state.lock().await;
        state.learner = None;
        state.flow = None;
        state.menu.clear();
        state.cache = LessonCache::new();
        drop(state);
        info!("logged out");
        self.ui.show_view(View::Login);
        Ok(())
    }

    // ========================================================================
    // Menu
    // ========================================================================

    /// Fetches the lesson listing and renders it with lock flags.
    pub async fn load_menu(&self) -> Result<()> {
        let Some(result) = self
            .gate
            .run(Control::Menu, self.ui.as_ref(), self.oracle.lesson_list())
            .await
            .into_completed()
        else {
            return Ok(());
        };

        let list = match result {
            Ok(list) => list,
            Err(err) => return self.report(Err(err)),
        };

        let mut state = self.state.lock().await;
        let Some(learner) = state.learner.as_ref() else {
            return self.report(Err(KotobaError::validation("not logged in")));
        };
        let entries = menu_entries(learner, &list);
        state.menu = list;
        drop(state);

        self.ui.render_menu(&entries);
        self.ui.show_view(View::Menu);
        Ok(())
    }

    // ========================================================================
    // Lesson open / regenerate
    // ========================================================================

    /// Opens a lesson via the two-phase lazy load.
    ///
    /// Re-checks the lock rule defensively even though the menu already
    /// disables locked lessons.
    pub async fn open_lesson(&self, lesson_id: u32) -> Result<()> {
        {
            let state = self.state.lock().await;
            let Some(learner) = state.learner.as_ref() else {
                drop(state);
                return self.report(Err(KotobaError::validation("not logged in")));
            };
            if !learner.is_unlocked(lesson_id) {
                let err = KotobaError::LessonLocked {
                    lesson_id,
                    progress_id: learner.progress_id,
                };
                drop(state);
                return self.report(Err(err));
            }
        }

        let protocol = self.open_protocol(lesson_id, false);
        let Some(result) = self
            .gate
            .run(Control::OpenLesson, self.ui.as_ref(), protocol)
            .await
            .into_completed()
        else {
            return Ok(());
        };
        self.report(result)
    }

    /// Regenerates the open lesson's content.
    ///
    /// User-initiated (the collaborator is expected to have confirmed);
    /// discards the cached content unconditionally, skips the fast read,
    /// and re-enters the current step with fresh state.
    pub async fn regenerate(&self) -> Result<()> {
        let Some(lesson_id) = self.current_lesson().await else {
            return self.report(Err(KotobaError::validation("no lesson is open")));
        };

        let protocol = self.open_protocol(lesson_id, true);
        let Some(result) = self
            .gate
            .run(Control::Regenerate, self.ui.as_ref(), protocol)
            .await
            .into_completed()
        else {
            return Ok(());
        };
        self.report(result)
    }

    /// The two-phase load: fast read, immediate render, then a
    /// generation pass under the distinct "generating" affordance if the
    /// content is still empty (or regeneration was forced).
    async fn open_protocol(&self, lesson_id: u32, force_regenerate: bool) -> Result<()> {
        if force_regenerate {
            let mut state = self.state.lock().await;
            if let Some(flow) = state.flow.as_mut() {
                flow.reenter_step();
            }
            state.cache.discard(lesson_id);
        } else {
            // Fast read: returns quickly, possibly with empty material,
            // so the lesson shell appears without delay.
            let content = self
                .oracle
                .lesson_content(lesson_id, false, false)
                .await?;

            let mut state = self.state.lock().await;
            let shown = state.cache.store(content);
            self.ui.render_lesson(shown);
            state.flow = Some(ExerciseFlow::new(lesson_id));
            self.ui.show_view(View::Lesson);
            self.ui.show_step(ExerciseStep::Explanation, None);

            if !state.cache.needs_generation(lesson_id, false) {
                return Ok(());
            }
        }

        self.ui.set_generating(true);
        let result = self
            .oracle
            .lesson_content(lesson_id, true, force_regenerate)
            .await;
        self.ui.set_generating(false);
        let content = result?;

        let mut state = self.state.lock().await;
        if state.flow.as_ref().map(ExerciseFlow::lesson_id) != Some(lesson_id) {
            return Err(KotobaError::stale(lesson_id));
        }
        let shown = state.cache.store(content);
        self.ui.render_lesson(shown);
        Ok(())
    }

    // ========================================================================
    // Step progression
    // ========================================================================

    /// Handles the "next"/"continue" action for the open lesson.
    ///
    /// Entering the Q&A step picks its prompt at that moment; completing
    /// the final step returns to the (re-rendered) menu with a
    /// completion notice.
    pub async fn advance_step(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let advanced = match state.flow.as_mut() {
            Some(flow) => flow.advance(),
            None => {
                drop(state);
                return self.report(Err(KotobaError::validation("no lesson is open")));
            }
        };

        match advanced {
            Advance::Moved(ExerciseStep::Qa) => {
                let lesson_id = state.flow.as_ref().map_or(0, ExerciseFlow::lesson_id);
                let prompt = state
                    .cache
                    .pick_quiz_prompt(lesson_id, &mut rand::thread_rng());
                if let Some(flow) = state.flow.as_mut() {
                    flow.set_qa_prompt(prompt.clone());
                }
                drop(state);
                self.ui.show_step(ExerciseStep::Qa, prompt.as_deref());
                Ok(())
            }
            Advance::Moved(step) => {
                drop(state);
                self.ui.show_step(step, None);
                Ok(())
            }
            Advance::Done => {
                state.flow = None;
                drop(state);
                self.ui.notify(COMPLETION_NOTICE);
                self.load_menu().await
            }
            Advance::Blocked => {
                drop(state);
                self.report(Err(KotobaError::validation(
                    "complete this step before continuing",
                )))
            }
        }
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submits a sentence for grading on the current step.
    ///
    /// Empty input fails locally with no call issued. On a correct
    /// verdict the input locks; a correct verdict on the final Q&A step
    /// additionally advances the progress frontier. Transport and oracle
    /// failures leave the step unchanged and the input editable.
    pub async fn submit(&self, sentence: &str) -> Result<()> {
        let (uid, lesson_id, step) = {
            let state = self.state.lock().await;
            let Some(learner) = state.learner.as_ref() else {
                drop(state);
                return self.report(Err(KotobaError::validation("not logged in")));
            };
            let Some(flow) = state.flow.as_ref() else {
                drop(state);
                return self.report(Err(KotobaError::validation("no lesson is open")));
            };
            if let Err(err) = flow.validate_submission(sentence) {
                drop(state);
                return self.report(Err(err));
            }
            (learner.uid.clone(), flow.lesson_id(), flow.step())
        };

        let call = self
            .oracle
            .verify_sentence(&uid, lesson_id, sentence, step);
        let Some(result) = self
            .gate
            .run(Control::Submit, self.ui.as_ref(), call)
            .await
            .into_completed()
        else {
            return Ok(());
        };

        let verdict = match result {
            Ok(verdict) => verdict,
            Err(err) => return self.report(Err(err)),
        };

        let mut state = self.state.lock().await;
        let still_current =
            state.flow.as_ref().map(|f| (f.lesson_id(), f.step())) == Some((lesson_id, step));
        if !still_current {
            drop(state);
            return self.report(Err(KotobaError::stale(lesson_id)));
        }

        self.ui.show_feedback(&verdict);
        let passed = state
            .flow
            .as_mut()
            .map_or(false, |flow| flow.apply_verdict(verdict));

        if passed && step == ExerciseStep::Qa {
            // Progress moves only on completion of the final step.
            if let Some(learner) = state.learner.as_mut() {
                let advanced = self.session.advance_progress(learner, lesson_id)?;
                if advanced {
                    debug!(progress = learner.progress_id, "frontier advanced");
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Vocabulary hints
    // ========================================================================

    /// Fetches vocabulary hints for the `Vocab` step.
    ///
    /// Stateless on the service side; repeated requests accumulate in
    /// the displayed set and never affect grading.
    pub async fn request_hint(&self) -> Result<()> {
        let lesson_id = {
            let state = self.state.lock().await;
            match state.flow.as_ref() {
                Some(flow) if flow.step() == ExerciseStep::Vocab => flow.lesson_id(),
                _ => {
                    drop(state);
                    return self.report(Err(KotobaError::validation(
                        "hints are available on the vocabulary step",
                    )));
                }
            }
        };

        let Some(result) = self
            .gate
            .run(Control::Hint, self.ui.as_ref(), self.oracle.vocab_hint())
            .await
            .into_completed()
        else {
            return Ok(());
        };

        let hints = match result {
            Ok(hints) => hints,
            Err(err) => return self.report(Err(err)),
        };

        let mut state = self.state.lock().await;
        let still_current = state
            .flow
            .as_ref()
            .map(|f| (f.lesson_id(), f.step()))
            == Some((lesson_id, ExerciseStep::Vocab));
        if !still_current {
            drop(state);
            return self.report(Err(KotobaError::stale(lesson_id)));
        }

        if let Some(flow) = state.flow.as_mut() {
            flow.add_hints(hints);
            self.ui.show_hints(flow.hints());
        }
        Ok(())
    }

    // ========================================================================
    // State accessors
    // ========================================================================

    /// The logged-in learner, if any.
    pub async fn learner(&self) -> Option<Learner> {
        self.state.lock().await.learner.clone()
    }

    /// The open lesson's id, if a lesson is open.
    pub async fn current_lesson(&self) -> Option<u32> {
        self.state
            .lock()
            .await
            .flow
            .as_ref()
            .map(ExerciseFlow::lesson_id)
    }

    /// The step currently shown, if a lesson is open.
    pub async fn current_step(&self) -> Option<ExerciseStep> {
        self.state.lock().await.flow.as_ref().map(ExerciseFlow::step)
    }

    /// Whether the current step's input is locked awaiting "continue".
    pub async fn input_locked(&self) -> bool {
        self.state
            .lock()
            .await
            .flow
            .as_ref()
            .map_or(false, ExerciseFlow::is_input_locked)
    }

    /// The prompt selected for the Q&A step, once entered.
    pub async fn qa_prompt(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .flow
            .as_ref()
            .and_then(|f| f.qa_prompt().map(ToString::to_string))
    }

    // ========================================================================
    // Error surfacing
    // ========================================================================

    /// Applies the error-surfacing policy: stale responses are swallowed
    /// silently; everything else is shown to the learner and propagated.
    fn report(&self, result: Result<()>) -> Result<()> {
        match result {
            Err(err) if err.is_silent() => {
                debug!(error = %err, "late response discarded");
                Ok(())
            }
            Err(err) => {
                self.ui.notify(&err.to_string());
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }
}

/// Computes menu rows with the lock flag for each lesson.
fn menu_entries(learner: &Learner, list: &[LessonSummary]) -> Vec<MenuEntry> {
    list.iter()
        .map(|summary| MenuEntry {
            summary: summary.clone(),
            locked: !learner.is_unlocked(summary.id),
        })
        .collect()
}
