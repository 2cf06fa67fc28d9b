//! Recursion bound for one top-level resolution.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cardlog_core::NoteId;
use tracing::{debug, warn};

use crate::config::ResolverConfig;

/// Tracks the notes on the current resolution path plus a step budget
/// shared by every branch of the same top-level call.
///
/// Sibling branches get independent copies of the path, so a note may be
/// resolved more than once per call as long as it is never its own ancestor.
#[derive(Debug, Clone)]
pub(crate) struct Guard {
    path: Vec<NoteId>,
    steps: Arc<AtomicUsize>,
    max_depth: usize,
    max_steps: usize,
}

impl Guard {
    pub(crate) fn new(config: &ResolverConfig) -> Self {
        Self {
            path: Vec::new(),
            steps: Arc::new(AtomicUsize::new(0)),
            max_depth: config.max_depth,
            max_steps: config.max_steps,
        }
    }

    /// Guard for resolving `note_id` below the current path, or `None` when
    /// entering it would loop or exceed a limit.
    pub(crate) fn enter(&self, note_id: &str) -> Option<Guard> {
        if self.path.iter().any(|seen| seen == note_id) {
            debug!(note_id, depth = self.path.len(), "Reference cycle, skipping note");
            return None;
        }
        if self.path.len() >= self.max_depth {
            warn!(note_id, depth = self.path.len(), "Resolution depth limit reached");
            return None;
        }
        let taken = self.steps.fetch_add(1, Ordering::SeqCst);
        if taken >= self.max_steps {
            warn!(note_id, steps = taken, "Resolution step budget exhausted");
            return None;
        }

        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(note_id.to_string());
        Some(Guard {
            path,
            steps: Arc::clone(&self.steps),
            max_depth: self.max_depth,
            max_steps: self.max_steps,
        })
    }

    pub(crate) fn depth(&self) -> usize {
        self.path.len()
    }

    /// Notes entered so far by the whole top-level call.
    pub(crate) fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst).min(self.max_steps)
    }
}
