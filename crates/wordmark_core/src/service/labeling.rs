//! Label capture modal.
//!
//! # Invariants
//! - At most one region is pending at a time.
//! - Every exit (commit, cancel, release) clears the pending reference.
//! - Commit is refused while the input is empty.

use crate::model::region::RegionId;
use log::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelingState {
    #[default]
    Closed,
    Open { pending: RegionId, input: String },
}

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelCommit {
    /// Modal closed; the label should be written to `id`.
    Committed { id: RegionId, label: String },
    /// Input was empty; the modal stays open.
    EmptyInput,
    /// Nothing was pending.
    NotOpen,
}

#[derive(Debug, Default)]
pub struct LabelingWorkflow {
    state: LabelingState,
}

impl LabelingWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens for `id` with a cleared input.
    ///
    /// Returns the previously pending region; the caller must roll it back.
    pub fn open(&mut self, id: RegionId) -> Option<RegionId> {
        let displaced = self.pending().filter(|pending| *pending != id);
        debug!("event=labeling_open module=labeling id={id}");
        self.state = LabelingState::Open {
            pending: id,
            input: String::new(),
        };
        displaced
    }

    /// Mirrors the modal text field. Ignored while closed.
    pub fn set_input(&mut self, text: &str) {
        if let LabelingState::Open { input, .. } = &mut self.state {
            text.clone_into(input);
        }
    }

    pub fn commit(&mut self) -> LabelCommit {
        let LabelingState::Open { pending, input } = &self.state else {
            return LabelCommit::NotOpen;
        };
        if input.is_empty() {
            return LabelCommit::EmptyInput;
        }

        let outcome = LabelCommit::Committed {
            id: *pending,
            label: input.clone(),
        };
        self.state = LabelingState::Closed;
        outcome
    }

    /// Closes the modal. Returns the pending region to roll back.
    pub fn cancel(&mut self) -> Option<RegionId> {
        match std::mem::take(&mut self.state) {
            LabelingState::Open { pending, .. } => Some(pending),
            LabelingState::Closed => None,
        }
    }

    /// Closes without rollback when the pending region is `id`, for a region
    /// already removed through another path.
    pub fn release(&mut self, id: RegionId) -> bool {
        if self.pending() == Some(id) {
            self.state = LabelingState::Closed;
            return true;
        }
        false
    }

    pub fn pending(&self) -> Option<RegionId> {
        match &self.state {
            LabelingState::Open { pending, .. } => Some(*pending),
            LabelingState::Closed => None,
        }
    }

    pub fn input(&self) -> Option<&str> {
        match &self.state {
            LabelingState::Open { input, .. } => Some(input.as_str()),
            LabelingState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.pending().is_some()
    }

    pub fn state(&self) -> &LabelingState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelCommit, LabelingWorkflow};
    use crate::model::region::RegionId;

    #[test]
    fn commit_requires_text_and_closes() {
        let mut modal = LabelingWorkflow::new();
        let id = RegionId::new();
        modal.open(id);

        assert_eq!(modal.commit(), LabelCommit::EmptyInput);
        assert!(modal.is_open());

        modal.set_input("hello");
        assert_eq!(
            modal.commit(),
            LabelCommit::Committed {
                id,
                label: "hello".to_string()
            }
        );
        assert!(!modal.is_open());
        assert_eq!(modal.commit(), LabelCommit::NotOpen);
    }

    #[test]
    fn reopening_clears_input_and_reports_displaced_region() {
        let mut modal = LabelingWorkflow::new();
        let first = RegionId::new();
        let second = RegionId::new();

        modal.open(first);
        modal.set_input("draft");
        assert_eq!(modal.open(second), Some(first));
        assert_eq!(modal.input(), Some(""));
        assert_eq!(modal.pending(), Some(second));
    }

    #[test]
    fn cancel_returns_pending_once() {
        let mut modal = LabelingWorkflow::new();
        let id = RegionId::new();
        modal.open(id);

        assert_eq!(modal.cancel(), Some(id));
        assert_eq!(modal.cancel(), None);
    }

    #[test]
    fn release_only_matches_pending_region() {
        let mut modal = LabelingWorkflow::new();
        let id = RegionId::new();
        modal.open(id);

        assert!(!modal.release(RegionId::new()));
        assert!(modal.release(id));
        assert_eq!(modal.pending(), None);
    }
}
