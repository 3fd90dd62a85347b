//! Session persistence and the progress-advancement rule.
//!
//! The store holds exactly one serialized [`Learner`] snapshot. It is the
//! single source of truth for how far a learner may advance: lessons with
//! `id <= progress_id` are unlocked, and the frontier only ever moves
//! forward, one lesson at a time, when the lesson *at* the frontier is
//! completed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

// ============================================================================
// Learner
// ============================================================================

/// Learner roles. Admins bypass the lesson lock entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Unrestricted access to all lessons.
    Admin,
    /// Regular learner, gated by `progress_id`.
    #[default]
    Learner,
}

/// The authenticated learner and their progress frontier.
///
/// Owned exclusively by the session store; mutated only by a successful
/// login response or by [`Learner::advance_progress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    /// Stable identifier assigned by the service.
    pub uid: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Login email.
    pub email: String,
    /// Access role.
    #[serde(default)]
    pub role: Role,
    /// Highest lesson id this learner is unlocked to attempt (>= 1).
    pub progress_id: u32,
}

impl Learner {
    /// Returns `true` if this learner may open the given lesson.
    ///
    /// Admins are never locked; everyone else is limited to
    /// `lesson_id <= progress_id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kotoba_core::session::{Learner, Role};
    ///
    /// let learner = Learner {
    ///     uid: "u1".into(),
    ///     display_name: "Aoi".into(),
    ///     email: "aoi@example.com".into(),
    ///     role: Role::Learner,
    ///     progress_id: 3,
    /// };
    /// assert!(learner.is_unlocked(3));
    /// assert!(!learner.is_unlocked(4));
    /// ```
    #[must_use]
    pub fn is_unlocked(&self, lesson_id: u32) -> bool {
        matches!(self.role, Role::Admin) || lesson_id <= self.progress_id
    }

    /// Applies the frontier-only advancement rule.
    ///
    /// The frontier moves to `lesson_id + 1` only when the completed lesson
    /// *is* the frontier. Completing an earlier, already-unlocked lesson
    /// changes nothing; the operation is monotonic and idempotent.
    ///
    /// Returns `true` if the frontier moved.
    pub fn advance_progress(&mut self, lesson_id: u32) -> bool {
        if lesson_id != self.progress_id {
            return false;
        }
        self.progress_id = self.progress_id.max(lesson_id + 1);
        true
    }
}

// ============================================================================
// SessionBackend
// ============================================================================

/// Storage seam for the single session snapshot.
///
/// Implementations hold at most one snapshot string under a fixed
/// location; the store layers serialization and recovery on top.
pub trait SessionBackend: Send + Sync {
    /// Reads the stored snapshot, if any.
    fn load(&self) -> std::io::Result<Option<String>>;

    /// Overwrites the stored snapshot. Last writer wins.
    fn store(&self, snapshot: &str) -> std::io::Result<()>;

    /// Removes the stored snapshot.
    fn remove(&self) -> std::io::Result<()>;
}

/// In-memory backend; the session lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<String>>,
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> std::io::Result<Option<String>> {
        Ok(self.slot.lock().map_or(None, |s| s.clone()))
    }

    fn store(&self, snapshot: &str) -> std::io::Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(snapshot.to_string());
        }
        Ok(())
    }

    fn remove(&self) -> std::io::Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// File-backed backend; the snapshot survives restarts of the client.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend storing the snapshot at the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this backend writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, snapshot: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, snapshot)
    }

    fn remove(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// The persisted form: the learner plus when the snapshot was written.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(flatten)]
    learner: Learner,
    #[serde(default = "Utc::now")]
    saved_at: DateTime<Utc>,
}

/// Persists the learner snapshot and applies the advancement rule.
pub struct SessionStore {
    backend: Box<dyn SessionBackend>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Box<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Creates a store over an in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    /// Restores the persisted learner, if any.
    ///
    /// Absent or malformed data is treated as logged-out, never as a
    /// fatal condition. A malformed snapshot is logged and dropped.
    #[must_use]
    pub fn restore(&self) -> Option<Learner> {
        let raw = match self.backend.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read session snapshot; treating as logged out");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => {
                debug!(
                    uid = %snapshot.learner.uid,
                    progress = snapshot.learner.progress_id,
                    saved_at = %snapshot.saved_at,
                    "session restored"
                );
                Some(snapshot.learner)
            }
            Err(e) => {
                warn!(error = %e, "malformed session snapshot; treating as logged out");
                None
            }
        }
    }

    /// Persists the full learner snapshot. Total overwrite.
    pub fn commit(&self, learner: &Learner) -> Result<()> {
        let snapshot = serde_json::to_string(&Snapshot {
            learner: learner.clone(),
            saved_at: Utc::now(),
        })?;
        self.backend.store(&snapshot)?;
        Ok(())
    }

    /// Removes the persisted snapshot. Used on logout.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove()?;
        Ok(())
    }

    /// Applies the frontier rule to the learner and persists the result
    /// if the frontier moved.
    ///
    /// Returns `true` if progress advanced.
    pub fn advance_progress(&self, learner: &mut Learner, lesson_id: u32) -> Result<bool> {
        if !learner.advance_progress(lesson_id) {
            debug!(
                lesson_id,
                progress = learner.progress_id,
                "non-frontier completion; progress unchanged"
            );
            return Ok(false);
        }
        self.commit(learner)?;
        debug!(progress = learner.progress_id, "progress advanced");
        Ok(true)
    }
}
