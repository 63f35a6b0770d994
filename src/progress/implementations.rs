//! Concrete observers: silent, stderr and recording.

use super::traits::AnalysisObserver;
use crate::analyzers::{PassName, PassSummary};
use crate::core::{FailureKind, FileFailure};
use crate::pipeline::AnalysisState;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Discards every event. The default observer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentObserver;

impl AnalysisObserver for SilentObserver {
    fn state_changed(&self, _from: AnalysisState, _to: AnalysisState) {}

    fn file_extracted(&self, _path: &Path, _current: usize, _total: usize) {}

    fn file_skipped(&self, _failure: &FileFailure) {}

    fn pass_completed(&self, _summary: &PassSummary) {}
}

/// Writes progress to stderr.
#[derive(Clone, Debug)]
pub struct CliObserver {
    quiet: bool,
}

impl CliObserver {
    /// With `quiet`, only skipped files are reported.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Default for CliObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AnalysisObserver for CliObserver {
    fn state_changed(&self, _from: AnalysisState, to: AnalysisState) {
        if !self.quiet {
            eprintln!("\n{}", to);
        }
    }

    fn file_extracted(&self, _path: &Path, current: usize, total: usize) {
        if !self.quiet {
            eprint!("\rExtracting: {}/{}", current, total);
            let _ = std::io::stderr().flush();
        }
    }

    fn file_skipped(&self, failure: &FileFailure) {
        eprintln!("\nSkipped: {}", failure);
    }

    fn pass_completed(&self, summary: &PassSummary) {
        if self.quiet {
            return;
        }
        match summary.score {
            Some(score) => eprintln!("{} pass: {:.2}", summary.pass, score),
            None => eprintln!("{} pass: unavailable", summary.pass),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StateChanged {
        from: AnalysisState,
        to: AnalysisState,
    },
    FileExtracted {
        path: PathBuf,
        current: usize,
        total: usize,
    },
    FileSkipped {
        path: PathBuf,
        kind: FailureKind,
    },
    PassCompleted {
        pass: PassName,
        score: Option<f64>,
    },
}

/// Captures events in memory, mostly for tests.
///
/// Extraction events arrive from several threads, so their relative order is
/// not deterministic.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: ProgressEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.lock().clone()
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<AnalysisState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    pub fn completed_passes(&self) -> Vec<PassName> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::PassCompleted { pass, .. } => Some(pass),
                _ => None,
            })
            .collect()
    }

    pub fn extracted_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::FileExtracted { .. }))
            .count()
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }
}

impl AnalysisObserver for RecordingObserver {
    fn state_changed(&self, from: AnalysisState, to: AnalysisState) {
        self.push(ProgressEvent::StateChanged { from, to });
    }

    fn file_extracted(&self, path: &Path, current: usize, total: usize) {
        self.push(ProgressEvent::FileExtracted {
            path: path.to_path_buf(),
            current,
            total,
        });
    }

    fn file_skipped(&self, failure: &FileFailure) {
        self.push(ProgressEvent::FileSkipped {
            path: failure.path.clone(),
            kind: failure.kind,
        });
    }

    fn pass_completed(&self, summary: &PassSummary) {
        self.push(ProgressEvent::PassCompleted {
            pass: summary.pass,
            score: summary.score,
        });
    }
}
