//! Repository health analysis for Python codebases.
//!
//! A run walks the repository, parses every source file once into
//! [`extraction::FileFact`] records, runs four independent metric passes
//! over those facts and folds the pass summaries into unified
//! [`core::Metrics`] and a module graph.
//!
//! ```rust,no_run
//! use repo_vitals::pipeline::{analyze, AnalysisOptions};
//! use std::path::Path;
//!
//! let result = analyze(Path::new("."), AnalysisOptions::default())?;
//! println!("tech debt: {}", result.metrics.tech_debt);
//! # Ok::<(), repo_vitals::core::AnalysisError>(())
//! ```

pub mod aggregation;
pub mod analyzers;
pub mod cli;
pub mod config;
pub mod core;
pub mod extraction;
pub mod io;
pub mod pipeline;
pub mod progress;
pub mod security;

pub use crate::core::{
    AnalysisError, FailureKind, FileFailure, Issue, IssueKind, Metrics, Module, ModuleType,
    Severity, VulnerabilityCounts,
};

pub use crate::core::metrics::{
    calculate_average_complexity, complexity_score, find_max_complexity, ComplexityRank,
};

pub use crate::analyzers::{MetricPass, PassContext, PassName, PassSummaries, PassSummary};

pub use crate::extraction::{FileFact, SyntaxExtractor};

pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};

pub use crate::pipeline::{
    analyze, AnalysisCoordinator, AnalysisOptions, AnalysisResult, AnalysisState,
    CancellationToken,
};
