use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{BackendError, HarnessError};

/// Lifecycle of one benchmark iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarnessState {
    Idle,
    Resetting,
    Ingesting,
    Inserting,
    Validating,
    Deleting,
    Done,
    Failed,
}

impl HarnessState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: HarnessState) -> bool {
        use HarnessState::*;
        match (self, next) {
            (Idle, Resetting)
            | (Resetting, Ingesting)
            | (Ingesting, Inserting)
            | (Inserting, Validating)
            | (Validating, Deleting)
            | (Deleting, Done) => true,
            (Resetting | Ingesting | Inserting | Validating | Deleting, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for HarnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Resetting => "resetting",
            Self::Ingesting => "ingesting",
            Self::Inserting => "inserting",
            Self::Validating => "validating",
            Self::Deleting => "deleting",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Timed phases, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Reset,
    Ingest,
    Insert,
    Validate,
    Delete,
}

impl Phase {
    pub const ALL: [Phase; 5] =
        [Self::Reset, Self::Ingest, Self::Insert, Self::Validate, Self::Delete];

    /// State the harness is in while this phase runs.
    pub fn state(self) -> HarnessState {
        match self {
            Self::Reset => HarnessState::Resetting,
            Self::Ingest => HarnessState::Ingesting,
            Self::Insert => HarnessState::Inserting,
            Self::Validate => HarnessState::Validating,
            Self::Delete => HarnessState::Deleting,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reset => "reset",
            Self::Ingest => "ingest",
            Self::Insert => "insert",
            Self::Validate => "validate",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Records the visited states of one iteration.
pub(crate) struct StateTrace<'a> {
    trace: &'a mut Vec<HarnessState>,
}

impl<'a> StateTrace<'a> {
    pub(crate) fn start(trace: &'a mut Vec<HarnessState>) -> Self {
        trace.clear();
        trace.push(HarnessState::Idle);
        Self { trace }
    }

    pub(crate) fn current(&self) -> HarnessState {
        self.trace.last().copied().unwrap_or(HarnessState::Idle)
    }

    pub(crate) fn enter(&mut self, next: HarnessState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal transition {} -> {next}",
            self.current()
        );
        log::trace!("harness: {} -> {next}", self.current());
        self.trace.push(next);
    }

    pub(crate) fn backend_failure(&mut self, source: BackendError) -> HarnessError {
        let state = self.current();
        self.enter(HarnessState::Failed);
        HarnessError::Backend { state, source }
    }

    pub(crate) fn count_mismatch(&mut self, phase: Phase, expected: usize, stored: usize) -> HarnessError {
        self.enter(HarnessState::Failed);
        HarnessError::CountMismatch { phase, expected, stored }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HarnessState::*;

    #[test]
    fn happy_path_edges_are_legal() {
        let path = [Idle, Resetting, Ingesting, Inserting, Validating, Deleting, Done];
        for w in path.windows(2) {
            assert!(w[0].can_transition_to(w[1]), "{} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn skipping_states_is_illegal() {
        assert!(!Idle.can_transition_to(Ingesting));
        assert!(!Inserting.can_transition_to(Deleting));
        assert!(!Validating.can_transition_to(Done));
        assert!(!Done.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Deleting));
    }

    #[test]
    fn failure_reachable_from_every_working_state() {
        for p in Phase::ALL {
            assert!(p.state().can_transition_to(Failed));
        }
        assert!(Done.is_terminal() && Failed.is_terminal());
    }

    #[test]
    fn trace_records_failure_state() {
        let mut v = Vec::new();
        let mut t = StateTrace::start(&mut v);
        t.enter(Resetting);
        t.enter(Ingesting);
        t.enter(Inserting);
        let err = t.count_mismatch(Phase::Insert, 3, 2);
        assert_eq!(err.failed_in(), Inserting);
        assert_eq!(v, vec![Idle, Resetting, Ingesting, Inserting, Failed]);
    }

    #[test]
    fn phases_are_ordered() {
        assert!(Phase::Reset < Phase::Delete);
        assert_eq!(Phase::Validate.index(), 3);
    }
}
