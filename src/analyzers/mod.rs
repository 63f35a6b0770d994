//! Metric passes over the shared per-file facts.
//!
//! Every pass reads the same immutable [`PassContext`] and returns a
//! [`PassSummary`]. Passes never see each other's output, so they can run in
//! any order or concurrently.

use crate::config::VitalsConfig;
use crate::core::Issue;
use crate::extraction::FileFact;
use crate::io::ReadmeInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

pub mod complexity;
pub mod dependencies;
pub mod documentation;
pub mod import_graph;
pub mod redundancy;

pub use complexity::{ComplexityPass, ComplexitySummary};
pub use dependencies::{DependencyPass, DependencySummary};
pub use documentation::{DocumentationPass, DocumentationSummary};
pub use import_graph::{CircularDependency, CycleReport, ImportGraph};
pub use redundancy::{RedundancyPass, RedundancySummary};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum PassName {
    Complexity,
    Documentation,
    Dependencies,
    Redundancy,
}

impl PassName {
    pub const ALL: [PassName; 4] = [
        PassName::Complexity,
        PassName::Documentation,
        PassName::Dependencies,
        PassName::Redundancy,
    ];
}

impl std::fmt::Display for PassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(PassName, &str)] = &[
            (PassName::Complexity, "complexity"),
            (PassName::Documentation, "documentation"),
            (PassName::Dependencies, "dependencies"),
            (PassName::Redundancy, "redundancy"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(p, _)| p == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

/// Read-only inputs shared by all passes of one run.
#[derive(Clone, Copy)]
pub struct PassContext<'a> {
    pub root: &'a Path,
    /// Facts ordered by path
    pub facts: &'a [FileFact],
    pub config: &'a VitalsConfig,
    pub readme: Option<&'a ReadmeInfo>,
}

/// Pass-specific aggregate fields.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PassDetails {
    Complexity(ComplexitySummary),
    Documentation(DocumentationSummary),
    Dependencies(DependencySummary),
    Redundancy(RedundancySummary),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PassSummary {
    pub pass: PassName,
    /// Bounded to [0, 100]; `None` when the pass could not complete
    pub score: Option<f64>,
    pub issues: Vec<Issue>,
    pub file_scores: BTreeMap<PathBuf, f64>,
    pub details: Option<PassDetails>,
    /// Why the pass is unavailable
    pub error: Option<String>,
}

impl PassSummary {
    pub fn new(
        pass: PassName,
        score: f64,
        issues: Vec<Issue>,
        file_scores: BTreeMap<PathBuf, f64>,
        details: PassDetails,
    ) -> Self {
        Self {
            pass,
            score: Some(crate::core::metrics::clamp_score(score)),
            issues: crate::core::sort_issues(issues),
            file_scores,
            details: Some(details),
            error: None,
        }
    }

    pub fn unavailable(pass: PassName, error: impl Into<String>) -> Self {
        Self {
            pass,
            score: None,
            issues: Vec::new(),
            file_scores: BTreeMap::new(),
            details: None,
            error: Some(error.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.score.is_some()
    }
}

pub trait MetricPass: Send + Sync {
    fn name(&self) -> PassName;
    fn run(&self, ctx: &PassContext) -> anyhow::Result<PassSummary>;
}

/// Run a pass, turning an error or a panic into an unavailable summary.
pub fn run_guarded(pass: &dyn MetricPass, ctx: &PassContext) -> PassSummary {
    let name = pass.name();
    match panic::catch_unwind(AssertUnwindSafe(|| pass.run(ctx))) {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            tracing::warn!("{} pass failed: {:#}", name, e);
            PassSummary::unavailable(name, format!("{e:#}"))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("{} pass panicked: {}", name, message);
            PassSummary::unavailable(name, format!("panicked: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// The four standard passes, in reporting order.
pub fn standard_passes() -> Vec<Box<dyn MetricPass>> {
    vec![
        Box::new(ComplexityPass),
        Box::new(DocumentationPass),
        Box::new(DependencyPass),
        Box::new(RedundancyPass),
    ]
}

/// One summary per pass.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PassSummaries {
    pub complexity: PassSummary,
    pub documentation: PassSummary,
    pub dependencies: PassSummary,
    pub redundancy: PassSummary,
}

impl PassSummaries {
    /// Slot summaries by pass name; missing passes are unavailable.
    pub fn from_summaries(summaries: impl IntoIterator<Item = PassSummary>) -> Self {
        let mut by_name: BTreeMap<PassName, PassSummary> = summaries
            .into_iter()
            .map(|summary| (summary.pass, summary))
            .collect();
        let mut take = |name: PassName| {
            by_name
                .remove(&name)
                .unwrap_or_else(|| PassSummary::unavailable(name, "pass was not run"))
        };
        Self {
            complexity: take(PassName::Complexity),
            documentation: take(PassName::Documentation),
            dependencies: take(PassName::Dependencies),
            redundancy: take(PassName::Redundancy),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PassSummary> {
        [
            &self.complexity,
            &self.documentation,
            &self.dependencies,
            &self.redundancy,
        ]
        .into_iter()
    }

    pub fn get(&self, name: PassName) -> &PassSummary {
        match name {
            PassName::Complexity => &self.complexity,
            PassName::Documentation => &self.documentation,
            PassName::Dependencies => &self.dependencies,
            PassName::Redundancy => &self.redundancy,
        }
    }

    /// All issues across passes, ordered by location.
    pub fn issues(&self) -> Vec<Issue> {
        crate::core::sort_issues(self.iter().flat_map(|s| s.issues.iter().cloned()).collect())
    }

    pub fn complexity_details(&self) -> Option<&ComplexitySummary> {
        match self.complexity.details.as_ref()? {
            PassDetails::Complexity(details) => Some(details),
            _ => None,
        }
    }

    pub fn documentation_details(&self) -> Option<&DocumentationSummary> {
        match self.documentation.details.as_ref()? {
            PassDetails::Documentation(details) => Some(details),
            _ => None,
        }
    }

    pub fn dependency_details(&self) -> Option<&DependencySummary> {
        match self.dependencies.details.as_ref()? {
            PassDetails::Dependencies(details) => Some(details),
            _ => None,
        }
    }

    pub fn redundancy_details(&self) -> Option<&RedundancySummary> {
        match self.redundancy.details.as_ref()? {
            PassDetails::Redundancy(details) => Some(details),
            _ => None,
        }
    }
}
