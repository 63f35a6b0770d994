//! Heuristic detection of speculative or unneeded code.
//!
//! Every check is name or substring based. A class is an abstract base when a
//! base name contains a configured marker, a decorator is a caching decorator
//! when its name contains one, and so on. Nothing is resolved semantically.

use super::{MetricPass, PassContext, PassDetails, PassName, PassSummary};
use crate::config::RedundancyConfig;
use crate::core::{Issue, IssueKind, Severity};
use crate::extraction::{ClassFact, FileFact, FunctionFact, UsageCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const POINTS_PER_WEIGHT: f64 = 2.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RedundancySummary {
    pub unused_functions: usize,
    pub unused_classes: usize,
    pub single_implementations: usize,
    pub unnecessary_wrappers: usize,
    pub premature_optimizations: usize,
    pub total_issues: usize,
    pub severity_weight: u32,
}

impl RedundancySummary {
    fn from_issues(issues: &[Issue]) -> Self {
        issues.iter().fold(Self::default(), |mut acc, issue| {
            match issue.kind {
                IssueKind::UnusedDefinition if issue.message.starts_with("Class '") => {
                    acc.unused_classes += 1
                }
                IssueKind::UnusedDefinition => acc.unused_functions += 1,
                IssueKind::SingleImplementationAbstraction => acc.single_implementations += 1,
                IssueKind::UnnecessaryDelegationWrapper => acc.unnecessary_wrappers += 1,
                IssueKind::PrematureOptimization => acc.premature_optimizations += 1,
                IssueKind::CircularDependency => {}
            }
            acc.total_issues += 1;
            acc.severity_weight += issue.severity.weight();
            acc
        })
    }
}

/// `max(0, 100 - 2 * sum of severity weights)`.
pub fn redundancy_score(issues: &[Issue]) -> f64 {
    let weight: u32 = issues.iter().map(|i| i.severity.weight()).sum();
    (100.0 - POINTS_PER_WEIGHT * weight as f64).max(0.0)
}

pub struct RedundancyPass;

impl MetricPass for RedundancyPass {
    fn name(&self) -> PassName {
        PassName::Redundancy
    }

    fn run(&self, ctx: &PassContext) -> anyhow::Result<PassSummary> {
        let settings = &ctx.config.redundancy;
        let usage = ctx
            .facts
            .iter()
            .map(|fact| fact.usage.clone())
            .fold(UsageCounts::default(), UsageCounts::merge);

        let per_file: Vec<(PathBuf, Vec<Issue>)> = ctx
            .facts
            .iter()
            .map(|fact| (fact.path.clone(), detect_in_file(fact, &usage, settings)))
            .collect();

        let file_scores = per_file
            .iter()
            .map(|(path, issues)| (path.clone(), redundancy_score(issues)))
            .collect::<BTreeMap<_, _>>();
        let issues: Vec<Issue> = per_file.into_iter().flat_map(|(_, issues)| issues).collect();
        let summary = RedundancySummary::from_issues(&issues);

        tracing::debug!(
            "Redundancy: {} issues, severity weight {}",
            summary.total_issues,
            summary.severity_weight
        );

        Ok(PassSummary::new(
            PassName::Redundancy,
            redundancy_score(&issues),
            issues,
            file_scores,
            PassDetails::Redundancy(summary),
        ))
    }
}

/// All findings for one file, given repository-wide usage.
pub fn detect_in_file(fact: &FileFact, usage: &UsageCounts, settings: &RedundancyConfig) -> Vec<Issue> {
    let class_issues = fact.classes.iter().flat_map(|class| {
        single_implementation(fact, class, settings)
            .into_iter()
            .chain(unnecessary_wrapper(fact, class, settings))
            .chain(unused_class(fact, class, usage))
    });

    let function_issues = fact.all_functions().flat_map(|function| {
        premature_caching(fact, function, settings)
            .into_iter()
            .chain(unused_function(fact, function, usage, settings))
    });

    let container_issues = fact
        .assigned_calls
        .iter()
        .filter(|call| settings.fancy_containers.contains(&call.callee))
        .map(|call| {
            Issue::new(
                IssueKind::PrematureOptimization,
                Severity::Low,
                fact.path.clone(),
                call.line,
                format!(
                    "{} used where a plain built-in container may be enough",
                    call.callee
                ),
            )
        });

    class_issues
        .chain(function_issues)
        .chain(container_issues)
        .collect()
}

fn single_implementation(
    fact: &FileFact,
    class: &ClassFact,
    settings: &RedundancyConfig,
) -> Option<Issue> {
    let abstract_methods = class
        .methods
        .iter()
        .any(|m| m.has_decorator_matching(&settings.abstract_method_markers, false));
    (class.has_base_matching(&settings.abstract_base_markers) && abstract_methods).then(|| {
        Issue::new(
            IssueKind::SingleImplementationAbstraction,
            Severity::Medium,
            fact.path.clone(),
            class.line,
            format!(
                "Abstract base class '{}' may have only one implementation",
                class.name
            ),
        )
    })
}

fn unnecessary_wrapper(
    fact: &FileFact,
    class: &ClassFact,
    settings: &RedundancyConfig,
) -> Option<Issue> {
    let ratio = class.delegation_ratio();
    (ratio > settings.wrapper_ratio).then(|| {
        Issue::new(
            IssueKind::UnnecessaryDelegationWrapper,
            Severity::Low,
            fact.path.clone(),
            class.line,
            format!(
                "Class '{}' forwards {:.0}% of its methods to another object",
                class.name,
                ratio * 100.0
            ),
        )
    })
}

fn unused_class(fact: &FileFact, class: &ClassFact, usage: &UsageCounts) -> Option<Issue> {
    (!usage.names.contains_key(&class.name)).then(|| {
        Issue::new(
            IssueKind::UnusedDefinition,
            Severity::Medium,
            fact.path.clone(),
            class.line,
            format!("Class '{}' is never referenced", class.name),
        )
    })
}

fn premature_caching(
    fact: &FileFact,
    function: &FunctionFact,
    settings: &RedundancyConfig,
) -> Option<Issue> {
    (function.has_decorator_matching(&settings.cache_decorator_markers, true)
        && function.statement_count < settings.caching_body_limit)
        .then(|| {
            Issue::new(
                IssueKind::PrematureOptimization,
                Severity::Low,
                fact.path.clone(),
                function.line,
                format!(
                    "Function '{}' is cached but has only {} statement(s)",
                    function.name, function.statement_count
                ),
            )
        })
}

fn unused_function(
    fact: &FileFact,
    function: &FunctionFact,
    usage: &UsageCounts,
    settings: &RedundancyConfig,
) -> Option<Issue> {
    let allowed = settings.dead_code_allowlist.contains(&function.name);
    (!allowed && !usage.calls.contains_key(&function.name)).then(|| {
        Issue::new(
            IssueKind::UnusedDefinition,
            Severity::Medium,
            fact.path.clone(),
            function.line,
            format!("Function '{}' is never called", function.name),
        )
    })
}
