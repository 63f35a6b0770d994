use crate::analyzers::PassSummaries;
use crate::core::{FileFailure, Issue, Metrics, Module};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_PER_FILE_TIMEOUT_MS: u64 = 5_000;

/// Caller-controlled knobs for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub include_tests: bool,
    /// Candidates beyond this many, in path order, are not analyzed
    pub max_files: Option<usize>,
    pub per_file_timeout_ms: u64,
    /// Extraction workers; `None` defers to the `[parallel]` configuration
    pub jobs: Option<usize>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_tests: false,
            max_files: None,
            per_file_timeout_ms: DEFAULT_PER_FILE_TIMEOUT_MS,
            jobs: None,
        }
    }
}

impl AnalysisOptions {
    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_max_files(mut self, max_files: Option<usize>) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_per_file_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.per_file_timeout_ms = timeout_ms;
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }
}

/// Everything one successful run produces.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub root: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub metrics: Metrics,
    pub modules: Vec<Module>,
    /// Size-weighted module health in [0, 1]
    pub overall_health: f64,
    /// Issues from every pass, ordered by location
    pub issues: Vec<Issue>,
    pub summaries: PassSummaries,
    pub file_health: BTreeMap<PathBuf, f64>,
    pub files_analyzed: usize,
    pub skipped: Vec<FileFailure>,
    /// Candidates were dropped because of `max_files`
    pub files_truncated: bool,
    pub cycles_truncated: bool,
}

impl AnalysisResult {
    pub fn files_skipped(&self) -> usize {
        self.skipped.len()
    }
}
