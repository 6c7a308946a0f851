//! Draft drag tracking and the settle timer.
//!
//! A freshly drawn region moves through `Dragging -> Settling -> settled`.
//! Release arms a deadline; any further movement before the deadline drops
//! the draft back to `Dragging`. Only an expired deadline reports the draft
//! as settled, exactly once.
//!
//! Time is supplied by the caller, so the timer is deterministic and needs no
//! background thread.

use crate::model::region::RegionId;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Dragging,
    Settling { deadline: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Draft {
    id: RegionId,
    phase: DraftPhase,
}

/// Tracks the single hand-drawn region that has not settled yet.
#[derive(Debug)]
pub struct DraftTracker {
    settle_delay: Duration,
    draft: Option<Draft>,
}

impl DraftTracker {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            draft: None,
        }
    }

    /// Starts tracking `id`. Returns the draft it replaces, if any.
    pub fn begin(&mut self, id: RegionId) -> Option<RegionId> {
        let previous = self.draft.take().map(|draft| draft.id);
        self.draft = Some(Draft {
            id,
            phase: DraftPhase::Dragging,
        });
        previous.filter(|previous| *previous != id)
    }

    /// Records movement. Cancels a pending settle deadline for the draft.
    pub fn moved(&mut self, id: RegionId) {
        if let Some(draft) = self.draft.as_mut().filter(|draft| draft.id == id) {
            draft.phase = DraftPhase::Dragging;
        }
    }

    /// Records pointer release and (re)arms the settle deadline.
    pub fn released(&mut self, id: RegionId, now: Instant) {
        let deadline = now + self.settle_delay;
        if let Some(draft) = self.draft.as_mut().filter(|draft| draft.id == id) {
            draft.phase = DraftPhase::Settling { deadline };
        }
    }

    /// Returns the draft id once its deadline has passed, and stops tracking it.
    pub fn poll(&mut self, now: Instant) -> Option<RegionId> {
        match self.draft {
            Some(Draft {
                id,
                phase: DraftPhase::Settling { deadline },
            }) if now >= deadline => {
                self.draft = None;
                Some(id)
            }
            _ => None,
        }
    }

    /// Stops tracking `id` without settling it.
    pub fn forget(&mut self, id: RegionId) -> bool {
        if self.draft.is_some_and(|draft| draft.id == id) {
            self.draft = None;
            return true;
        }
        false
    }

    pub fn clear(&mut self) {
        self.draft = None;
    }

    pub fn current(&self) -> Option<RegionId> {
        self.draft.map(|draft| draft.id)
    }

    pub fn phase(&self) -> Option<DraftPhase> {
        self.draft.map(|draft| draft.phase)
    }

    /// Deadline of an armed settle timer.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase()? {
            DraftPhase::Settling { deadline } => Some(deadline),
            DraftPhase::Dragging => None,
        }
    }
}
