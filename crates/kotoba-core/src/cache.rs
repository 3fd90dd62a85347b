//! Per-session lesson content cache.
//!
//! Backs the two-phase lazy load: a fast read puts whatever already exists
//! on screen immediately, and the expensive generation pass overwrites it
//! later. The cache enforces monotonic rendering (once a field is
//! populated it is never blanked by a later partial response) and owns
//! quiz prompt selection, which happens at Q&A step entry rather than at
//! load time.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::content::LessonContent;

/// In-memory cache of generated lesson material, keyed by lesson id.
///
/// Lives for the client session; content for an id is treated as
/// immutable once generated, unless the learner explicitly regenerates.
#[derive(Debug, Default)]
pub struct LessonCache {
    entries: HashMap<u32, LessonContent>,
}

impl LessonCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached content for a lesson, if any.
    #[must_use]
    pub fn get(&self, lesson_id: u32) -> Option<&LessonContent> {
        self.entries.get(&lesson_id)
    }

    /// Stores a response, merging monotonically with anything already
    /// cached for the lesson. Returns the merged content.
    ///
    /// Used for both the fast read and the generation pass: a generation
    /// response with populated fields overwrites them, while a response
    /// with empty fields never blanks populated ones.
    pub fn store(&mut self, content: LessonContent) -> &LessonContent {
        let id = content.id;
        debug!(lesson_id = id, "lesson content cached");
        match self.entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(occupied) => {
                let merged = occupied.into_mut();
                merged.absorb(content);
                merged
            }
            std::collections::hash_map::Entry::Vacant(vacant) => vacant.insert(content),
        }
    }

    /// Discards cached content for a lesson unconditionally.
    ///
    /// The regenerate path calls this before the forced generation pass.
    pub fn discard(&mut self, lesson_id: u32) {
        if self.entries.remove(&lesson_id).is_some() {
            debug!(lesson_id, "cached lesson content discarded");
        }
    }

    /// Decides whether a generation pass is required after the fast read.
    ///
    /// `true` when regeneration was forced or the cached explanation is
    /// still empty (nothing generated yet, or nothing cached at all).
    #[must_use]
    pub fn needs_generation(&self, lesson_id: u32, force_regenerate: bool) -> bool {
        force_regenerate
            || self
                .get(lesson_id)
                .map_or(true, |content| !content.is_generated())
    }

    /// Picks one quiz prompt uniformly at random from the lesson's set.
    ///
    /// Called at the moment the Q&A step is entered, so repeated visits
    /// within one lesson session may see different prompts. Returns
    /// `None` when the lesson has no prompts (or is not cached).
    #[must_use]
    pub fn pick_quiz_prompt<R: Rng>(&self, lesson_id: u32, rng: &mut R) -> Option<String> {
        let prompts = &self.get(lesson_id)?.quiz_prompts;
        if prompts.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..prompts.len());
        Some(prompts[index].clone())
    }
}
