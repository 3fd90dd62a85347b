//! Request gate: single-flight per control plus the overlay safety timeout.
//!
//! The backend is strictly synchronous with no idempotency of its own, so
//! the client must guarantee that a control cannot fire a second call
//! while its first is outstanding. Foreground calls also raise a blocking
//! overlay; because no cancellation channel exists against the backend,
//! the gate bounds only the *visual* blocking: after the safety timeout
//! the overlay is cleared and a notice shown while the call keeps running
//! to its natural conclusion.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::ui::UiSurface;

/// Default upper bound on how long the blocking overlay may stay up.
pub const DEFAULT_OVERLAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notice shown when the overlay is released before the call settled.
pub const TIMEOUT_NOTICE: &str =
    "This is taking longer than expected. You can keep waiting; the result will appear when ready.";

// ============================================================================
// Control
// ============================================================================

/// The user-triggered controls that issue network calls.
///
/// Each control is single-flight: at most one outstanding call at a time.
/// Different controls race freely against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// The login action.
    Login,
    /// Loading the lesson menu.
    Menu,
    /// Opening a lesson (fast read + generation pass).
    OpenLesson,
    /// Regenerating the open lesson's content.
    Regenerate,
    /// Submitting a sentence for grading.
    Submit,
    /// Fetching a vocabulary hint.
    Hint,
}

impl Control {
    /// Returns `true` for calls that raise the process-wide blocking
    /// overlay in addition to the per-control busy affordance.
    #[must_use]
    pub const fn is_foreground(self) -> bool {
        matches!(
            self,
            Self::Login | Self::Menu | Self::OpenLesson | Self::Regenerate | Self::Submit
        )
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::Menu => "menu",
            Self::OpenLesson => "open_lesson",
            Self::Regenerate => "regenerate",
            Self::Submit => "submit",
            Self::Hint => "hint",
        };
        f.write_str(name)
    }
}

// ============================================================================
// RequestGate
// ============================================================================

/// Outcome of running a call through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome<T> {
    /// The call ran and settled with this output.
    Completed(T),
    /// The control already had a call outstanding; nothing was issued.
    Suppressed,
}

impl<T> GateOutcome<T> {
    /// Returns the completed output, or `None` if the invocation was
    /// suppressed.
    pub fn into_completed(self) -> Option<T> {
        match self {
            Self::Completed(output) => Some(output),
            Self::Suppressed => None,
        }
    }
}

/// Wraps every outbound call with single-flight and busy-lifecycle rules.
#[derive(Debug)]
pub struct RequestGate {
    in_flight: Mutex<HashSet<Control>>,
    overlay_timeout: Duration,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_TIMEOUT)
    }
}

impl RequestGate {
    /// Creates a gate with the given overlay safety timeout.
    #[must_use]
    pub fn new(overlay_timeout: Duration) -> Self {
        Self {
            in_flight: Mutex::new(HashSet::new()),
            overlay_timeout,
        }
    }

    /// Returns `true` while the control has an outstanding call.
    #[must_use]
    pub fn is_in_flight(&self, control: Control) -> bool {
        self.in_flight
            .lock()
            .map_or(false, |set| set.contains(&control))
    }

    /// Runs one call for a control.
    ///
    /// If the control already has a call outstanding the invocation is a
    /// no-op and [`GateOutcome::Suppressed`] is returned. Otherwise the
    /// control's busy affordance (and, for foreground controls, the
    /// blocking overlay) is raised for the duration of the call. Should
    /// a foreground call outlast the safety timeout, the overlay is
    /// forcibly cleared and a notice surfaced while the call itself
    /// keeps running; its output is still returned to the caller when
    /// it settles.
    pub async fn run<T, F>(&self, control: Control, ui: &dyn UiSurface, fut: F) -> GateOutcome<T>
    where
        F: Future<Output = T>,
    {
        if !self.begin(control) {
            debug!(%control, "invocation suppressed; call already in flight");
            return GateOutcome::Suppressed;
        }

        ui.set_busy(control, true);
        if control.is_foreground() {
            ui.show_overlay(true);
        }
        let mut overlay_released = false;

        tokio::pin!(fut);
        let output = tokio::select! {
            output = &mut fut => output,
            () = tokio::time::sleep(self.overlay_timeout) => {
                // Visual release only; the underlying call is not cancelled.
                warn!(%control, timeout = ?self.overlay_timeout, "safety timeout; releasing blocking UI");
                // Only foreground calls block the UI, so only they get
                // the release and the notice.
                if control.is_foreground() {
                    ui.show_overlay(false);
                    overlay_released = true;
                    ui.notify(TIMEOUT_NOTICE);
                }
                fut.await
            }
        };

        if control.is_foreground() && !overlay_released {
            ui.show_overlay(false);
        }
        ui.set_busy(control, false);
        self.finish(control);

        GateOutcome::Completed(output)
    }

    fn begin(&self, control: Control) -> bool {
        self.in_flight
            .lock()
            .map_or(false, |mut set| set.insert(control))
    }

    fn finish(&self, control: Control) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&control);
        }
    }
}
