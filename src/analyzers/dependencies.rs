//! Import classification, coupling and circular import detection.

use super::import_graph::{CircularDependency, ImportGraph};
use super::{MetricPass, PassContext, PassDetails, PassName, PassSummary};
use crate::core::metrics::round2;
use crate::core::{display_path, Issue, IssueKind, Severity};
use crate::extraction::{FileFact, ImportKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const TOP_N: usize = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportCount {
    pub module: String,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependentFile {
    pub file: PathBuf,
    pub dependents: usize,
}

/// Dependencies declared in packaging files at the repository root.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DeclaredRequirements {
    pub requirements_txt: Option<Vec<String>>,
    pub has_pyproject: bool,
    pub pyproject: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DependencySummary {
    pub total_imports: usize,
    pub standard_library_imports: usize,
    pub external_imports: usize,
    pub internal_imports: usize,
    /// Distinct top-level external package names, sorted
    pub external_dependencies: Vec<String>,
    pub most_imported: Vec<ImportCount>,
    pub most_depended_upon: Vec<DependentFile>,
    pub internal_edges: usize,
    pub average_internal_imports: f64,
    pub coupling_score: f64,
    pub cycles: Vec<CircularDependency>,
    pub cycles_truncated: bool,
    pub requirements: DeclaredRequirements,
}

pub struct DependencyPass;

impl MetricPass for DependencyPass {
    fn name(&self) -> PassName {
        PassName::Dependencies
    }

    fn run(&self, ctx: &PassContext) -> anyhow::Result<PassSummary> {
        let counts = ctx.facts.iter().flat_map(|f| f.imports.iter()).fold(
            BTreeMap::<ImportKind, usize>::new(),
            |mut acc, import| {
                *acc.entry(import.kind).or_default() += 1;
                acc
            },
        );
        let count_of = |kind| counts.get(&kind).copied().unwrap_or(0);
        let internal_imports = count_of(ImportKind::Internal);

        let external_counts = ctx
            .facts
            .iter()
            .flat_map(|f| f.imports.iter())
            .filter(|import| import.kind == ImportKind::External)
            .fold(BTreeMap::<&str, usize>::new(), |mut acc, import| {
                *acc.entry(import.top_level()).or_default() += 1;
                acc
            });
        let external_dependencies: Vec<String> =
            external_counts.keys().map(|m| m.to_string()).collect();
        let most_imported = top_by_count(
            external_counts
                .iter()
                .map(|(module, count)| ImportCount {
                    module: module.to_string(),
                    count: *count,
                })
                .collect(),
        );

        let graph = ImportGraph::from_facts(ctx.facts);
        let report = graph.detect_circular_dependencies(ctx.config.limits.max_reported_cycles);
        if report.truncated {
            tracing::warn!(
                "Cycle enumeration stopped after {} cycles",
                report.cycles.len()
            );
        }

        let mut most_depended_upon: Vec<DependentFile> = graph
            .calculate_coupling_metrics()
            .into_iter()
            .filter(|m| !m.dependents.is_empty())
            .map(|m| DependentFile {
                file: m.module,
                dependents: m.dependents.len(),
            })
            .collect();
        most_depended_upon.sort_by(|a, b| b.dependents.cmp(&a.dependents).then_with(|| a.file.cmp(&b.file)));
        most_depended_upon.truncate(TOP_N);

        let average_internal_imports = internal_imports as f64 / ctx.facts.len().max(1) as f64;
        let coupling_score = coupling_score(average_internal_imports);

        let file_scores = ctx
            .facts
            .iter()
            .map(|fact| {
                let internal = fact.imports.iter().filter(|i| i.is_internal()).count();
                (fact.path.clone(), coupling_score_for(internal as f64))
            })
            .collect();

        let issues = report
            .cycles
            .iter()
            .map(|cycle| cycle_issue(&graph, cycle))
            .collect();

        tracing::debug!(
            "Dependencies: {} imports, {} external packages, {} cycles",
            counts.values().sum::<usize>(),
            external_dependencies.len(),
            report.cycles.len()
        );

        let summary = DependencySummary {
            total_imports: counts.values().sum(),
            standard_library_imports: count_of(ImportKind::StandardLibrary),
            external_imports: count_of(ImportKind::External),
            internal_imports,
            external_dependencies,
            most_imported,
            most_depended_upon,
            internal_edges: graph.dependency_count(),
            average_internal_imports: round2(average_internal_imports),
            coupling_score,
            cycles: report.cycles,
            cycles_truncated: report.truncated,
            requirements: read_declared_requirements(ctx.root),
        };

        Ok(PassSummary::new(
            PassName::Dependencies,
            coupling_score,
            issues,
            file_scores,
            PassDetails::Dependencies(summary),
        ))
    }
}

/// `100 - min(average * 10, 100)`: higher means looser coupling.
pub fn coupling_score(average_internal_imports: f64) -> f64 {
    round2(coupling_score_for(average_internal_imports))
}

fn coupling_score_for(internal_imports: f64) -> f64 {
    100.0 - (internal_imports * 10.0).min(100.0)
}

fn top_by_count(mut counts: Vec<ImportCount>) -> Vec<ImportCount> {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.module.cmp(&b.module)));
    counts.truncate(TOP_N);
    counts
}

fn cycle_issue(graph: &ImportGraph, cycle: &CircularDependency) -> Issue {
    let first = &cycle.cycle[0];
    let next = cycle.cycle.get(1).unwrap_or(first);
    let line = graph.edge_line(first, next).unwrap_or(1);
    let rendered: Vec<String> = cycle
        .cycle
        .iter()
        .chain(std::iter::once(first))
        .map(|p| display_path(p))
        .collect();

    Issue::new(
        IssueKind::CircularDependency,
        Severity::High,
        first.clone(),
        line,
        format!("Circular import: {}", rendered.join(" -> ")),
    )
}

fn read_declared_requirements(root: &Path) -> DeclaredRequirements {
    let requirements_txt = read_optional(&root.join("requirements.txt")).map(|text| {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    });

    let pyproject_path = root.join("pyproject.toml");
    let pyproject_text = read_optional(&pyproject_path);
    let pyproject = pyproject_text
        .as_deref()
        .map(|text| match toml::from_str::<toml::Table>(text) {
            Ok(table) => pyproject_dependencies(&table),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", pyproject_path.display(), e);
                Vec::new()
            }
        })
        .unwrap_or_default();

    DeclaredRequirements {
        requirements_txt,
        has_pyproject: pyproject_text.is_some(),
        pyproject,
    }
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// PEP 621 `[project] dependencies` and Poetry's dependency table.
fn pyproject_dependencies(table: &toml::Table) -> Vec<String> {
    let pep621 = table
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
        .into_iter()
        .flatten()
        .filter_map(|d| d.as_str().map(str::to_string));

    let poetry = table
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
        .into_iter()
        .flat_map(|deps| deps.keys())
        .filter(|name| name.as_str() != "python")
        .cloned();

    pep621
        .chain(poetry)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
