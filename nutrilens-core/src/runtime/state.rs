//! Per-request lifecycle.

use crate::error::FailureKind;
use std::fmt;

/// State of a single analysis request.
///
/// `Idle → Building → AwaitingResponse → {Success | Failed(kind)}`, with
/// `Building → Failed(Precondition)` for unusable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Building,
    AwaitingResponse,
    Success,
    Failed(FailureKind),
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisState::Success | AnalysisState::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: AnalysisState) -> bool {
        use AnalysisState::*;

        match (self, next) {
            (Idle, Building) => true,
            (Building, AwaitingResponse) => true,
            (Building, Failed(_)) => true,
            (AwaitingResponse, Success) => true,
            (AwaitingResponse, Failed(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisState::Idle => f.write_str("idle"),
            AnalysisState::Building => f.write_str("building"),
            AnalysisState::AwaitingResponse => f.write_str("awaiting_response"),
            AnalysisState::Success => f.write_str("success"),
            AnalysisState::Failed(kind) => write!(f, "failed({:?})", kind),
        }
    }
}

/// Tracks and logs the state of one request.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AnalysisState,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: AnalysisState::Idle,
        }
    }

    pub(crate) fn advance(&mut self, next: AnalysisState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("analysis state {} -> {}", self.state, next);
        self.state = next;
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> AnalysisState {
        self.state
    }
}
