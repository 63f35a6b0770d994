//! Coordinator lifecycle and cooperative cancellation.

use crate::core::{AnalysisError, Result};
use crate::progress::AnalysisObserver;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Walking,
    Extracting,
    Analyzing,
    Aggregating,
    Done,
    Failed,
    Cancelled,
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisState::Done | AnalysisState::Failed | AnalysisState::Cancelled
        )
    }

    /// Forward steps are strictly sequential. Any running state may fail or
    /// be cancelled; terminal states never change.
    pub fn can_transition_to(&self, next: AnalysisState) -> bool {
        use AnalysisState::*;
        match (self, next) {
            (Idle, Walking)
            | (Walking, Extracting)
            | (Extracting, Analyzing)
            | (Analyzing, Aggregating)
            | (Aggregating, Done) => true,
            (from, Failed | Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(AnalysisState, &str)] = &[
            (AnalysisState::Idle, "idle"),
            (AnalysisState::Walking, "walking"),
            (AnalysisState::Extracting, "extracting"),
            (AnalysisState::Analyzing, "analyzing"),
            (AnalysisState::Aggregating, "aggregating"),
            (AnalysisState::Done, "done"),
            (AnalysisState::Failed, "failed"),
            (AnalysisState::Cancelled, "cancelled"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

/// Tracks the current state of one run and reports every change.
pub struct StateMachine {
    state: AnalysisState,
    observer: Arc<dyn AnalysisObserver>,
}

impl StateMachine {
    pub fn new(observer: Arc<dyn AnalysisObserver>) -> Self {
        Self {
            state: AnalysisState::Idle,
            observer,
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn transition(&mut self, next: AnalysisState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AnalysisError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        let from = std::mem::replace(&mut self.state, next);
        tracing::debug!("Analysis state {} -> {}", from, next);
        self.observer.state_changed(from, next);
        Ok(())
    }

    /// Move to `Failed` or `Cancelled` for `error` and hand the error back.
    pub fn abort(&mut self, error: AnalysisError) -> AnalysisError {
        let terminal = if error.is_cancelled() {
            AnalysisState::Cancelled
        } else {
            AnalysisState::Failed
        };
        if let Err(e) = self.transition(terminal) {
            tracing::warn!("Could not record run end: {}", e);
        }
        error
    }
}

/// Shared flag checked between files and between passes.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}
