//! Folds pass summaries into the unified metrics and the module graph.
//!
//! Everything here is a pure function of its inputs.

pub mod layout;

use crate::analyzers::{PassName, PassSummaries, PassSummary};
use crate::config::HealthWeights;
use crate::core::metrics::{clamp_score, percentage, round2};
use crate::core::{Metrics, Module, ModuleType, Position, VulnerabilityCounts};
use crate::extraction::FileFact;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use layout::sphere_positions;

pub const CORE_MODULE_ID: &str = "root";

/// Unified metrics from the four summaries and the vulnerability histogram.
pub fn aggregate_metrics(
    summaries: &PassSummaries,
    vulnerabilities: &VulnerabilityCounts,
) -> Metrics {
    let available: Vec<f64> = summaries.iter().filter_map(|s| s.score).collect();
    let tech_debt = if available.is_empty() {
        0.0
    } else {
        100.0 - available.iter().sum::<f64>() / available.len() as f64
    };

    Metrics {
        complexity: summaries.complexity.score.map(round2),
        coverage: definition_coverage(summaries),
        documentation: summaries.documentation.score.map(round2),
        yagni: summaries.redundancy.score.map(round2),
        dependencies: summaries
            .dependency_details()
            .map(|d| d.external_dependencies.len())
            .unwrap_or(0),
        tech_debt: round2(clamp_score(tech_debt)),
        vulnerabilities: vulnerabilities.clone(),
    }
}

/// Documented functions, classes and modules over all definitions.
fn definition_coverage(summaries: &PassSummaries) -> Option<f64> {
    let docs = summaries.documentation_details()?;
    let documented = docs.functions.documented + docs.classes.documented + docs.modules.documented;
    let total = docs.functions.total + docs.classes.total + docs.modules.total;
    Some(round2(clamp_score(percentage(documented, total))))
}

fn weight_for(weights: &HealthWeights, pass: PassName) -> f64 {
    match pass {
        PassName::Complexity => weights.complexity,
        PassName::Documentation => weights.documentation,
        PassName::Dependencies => weights.dependency,
        PassName::Redundancy => weights.redundancy,
    }
}

/// Health of one file in [0, 1]: the weighted blend of its per-pass scores.
/// Passes without a score for the file are left out and the remaining
/// weights renormalized.
pub fn file_health(path: &Path, summaries: &PassSummaries, weights: &HealthWeights) -> f64 {
    let (weighted, total_weight) = summaries
        .iter()
        .filter_map(|summary: &PassSummary| {
            summary
                .file_scores
                .get(path)
                .map(|score| (weight_for(weights, summary.pass), *score))
        })
        .fold((0.0, 0.0), |(sum, total), (weight, score)| {
            (sum + weight * score, total + weight)
        });

    if total_weight <= 0.0 {
        return 0.0;
    }
    (weighted / total_weight / 100.0).clamp(0.0, 1.0)
}

#[derive(Default)]
struct Group {
    size: usize,
    health: Vec<f64>,
}

impl Group {
    fn add(&mut self, lines: usize, health: f64) {
        self.size += lines;
        self.health.push(health);
    }

    fn mean_health(&self) -> f64 {
        if self.health.is_empty() {
            return 0.0;
        }
        self.health.iter().sum::<f64>() / self.health.len() as f64
    }
}

/// One core node for the whole repository plus one node per top-level
/// directory that contains analyzed files.
pub fn build_modules(
    root_name: &str,
    facts: &[FileFact],
    summaries: &PassSummaries,
    weights: &HealthWeights,
) -> Vec<Module> {
    let mut core = Group::default();
    let mut directories: BTreeMap<String, Group> = BTreeMap::new();

    for fact in facts {
        let health = file_health(&fact.path, summaries, weights);
        core.add(fact.lines.total, health);
        if let Some(dir) = top_level_directory(&fact.path) {
            directories.entry(dir).or_default().add(fact.lines.total, health);
        }
    }

    let core_module = Module {
        id: CORE_MODULE_ID.to_string(),
        name: root_name.to_string(),
        path: "/".to_string(),
        size: core.size,
        health: round2(core.mean_health()),
        module_type: ModuleType::Core,
        position: Position::default(),
    };

    let positions = sphere_positions(directories.len());
    let members = directories
        .into_iter()
        .zip(positions)
        .map(|((dir, group), position)| Module {
            id: dir.clone(),
            name: dir.clone(),
            path: dir,
            size: group.size,
            health: round2(group.mean_health()),
            module_type: ModuleType::Module,
            position,
        });

    std::iter::once(core_module).chain(members).collect()
}

fn top_level_directory(path: &Path) -> Option<String> {
    let mut components = path.components();
    let first = components.next()?;
    components
        .next()
        .map(|_| first.as_os_str().to_string_lossy().into_owned())
}

/// Scores keyed by file, kept for reporting.
pub fn file_health_map(
    facts: &[FileFact],
    summaries: &PassSummaries,
    weights: &HealthWeights,
) -> BTreeMap<PathBuf, f64> {
    facts
        .iter()
        .map(|fact| {
            (
                fact.path.clone(),
                round2(file_health(&fact.path, summaries, weights)),
            )
        })
        .collect()
}
