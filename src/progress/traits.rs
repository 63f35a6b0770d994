//! Observer trait for analysis progress.

use crate::analyzers::PassSummary;
use crate::core::FileFailure;
use crate::pipeline::AnalysisState;
use std::path::Path;

/// Receives progress from a running analysis.
///
/// Methods may be called from extraction worker threads concurrently and
/// must not block. They should not panic on out-of-range input such as
/// `current > total`.
pub trait AnalysisObserver: Send + Sync {
    /// The coordinator moved from `from` to `to`.
    fn state_changed(&self, from: AnalysisState, to: AnalysisState);

    /// One file was parsed. `current` counts finished files, starting at 1.
    fn file_extracted(&self, path: &Path, current: usize, total: usize);

    /// One file was skipped as a soft failure.
    fn file_skipped(&self, failure: &FileFailure);

    /// A pass finished, successfully or as unavailable.
    fn pass_completed(&self, summary: &PassSummary);
}
