pub mod errors;
pub mod metrics;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use errors::{AnalysisError, FailureKind, FileFailure, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Weight used by the redundancy score.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(Severity, &str)] = &[
            (Severity::Low, "low"),
            (Severity::Medium, "medium"),
            (Severity::High, "high"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(s, _)| s == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SingleImplementationAbstraction,
    UnnecessaryDelegationWrapper,
    PrematureOptimization,
    UnusedDefinition,
    CircularDependency,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(IssueKind, &str)] = &[
            (
                IssueKind::SingleImplementationAbstraction,
                "Single Implementation Abstraction",
            ),
            (
                IssueKind::UnnecessaryDelegationWrapper,
                "Unnecessary Delegation Wrapper",
            ),
            (IssueKind::PrematureOptimization, "Premature Optimization"),
            (IssueKind::UnusedDefinition, "Unused Definition"),
            (IssueKind::CircularDependency, "Circular Dependency"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(k, _)| k == self)
            .map(|(_, s)| *s)
            .unwrap_or("Unknown");

        write!(f, "{display_str}")
    }
}

/// A finding produced by exactly one metric pass.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        file: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

/// Orders issues by location so that reports are reproducible.
pub fn sort_issues(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(a.kind.cmp(&b.kind))
            .then(a.message.cmp(&b.message))
    });
    issues
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct VulnerabilityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl VulnerabilityCounts {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }
}

/// Unified repository metrics. Scores are `None` when the pass that feeds
/// them was unavailable for this run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Metrics {
    pub complexity: Option<f64>,
    pub coverage: Option<f64>,
    pub documentation: Option<f64>,
    pub yagni: Option<f64>,
    pub dependencies: usize,
    pub tech_debt: f64,
    pub vulnerabilities: VulnerabilityCounts,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Core,
    Module,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Critical,
    Warning,
    Healthy,
    Optimal,
}

impl HealthStatus {
    pub fn from_health(health: f64) -> Self {
        match health {
            h if h < 0.3 => HealthStatus::Critical,
            h if h < 0.6 => HealthStatus::Warning,
            h if h < 0.85 => HealthStatus::Healthy,
            _ => HealthStatus::Optimal,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default, Copy)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Visualization node for the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: usize,
    pub health: f64,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub position: Position,
}

impl Module {
    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::from_health(self.health)
    }
}

/// Size-weighted average health over all non-core modules, falling back to
/// the core node when the repository has no top-level directories.
pub fn overall_health(modules: &[Module]) -> f64 {
    let members: Vec<&Module> = modules
        .iter()
        .filter(|m| m.module_type == ModuleType::Module)
        .collect();
    let pool: Vec<&Module> = if members.is_empty() {
        modules.iter().collect()
    } else {
        members
    };

    let total_size: usize = pool.iter().map(|m| m.size).sum();
    if total_size == 0 {
        return 0.0;
    }
    pool.iter().map(|m| m.health * m.size as f64).sum::<f64>() / total_size as f64
}

/// Repository-relative path rendered with `/` separators.
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_weights_follow_order() {
        assert_eq!(Severity::Low.weight(), 1);
        assert_eq!(Severity::Medium.weight(), 2);
        assert_eq!(Severity::High.weight(), 3);
        assert!(Severity::Low < Severity::High);
    }

    #[test]
    fn health_status_bands() {
        assert_eq!(HealthStatus::from_health(0.0), HealthStatus::Critical);
        assert_eq!(HealthStatus::from_health(0.3), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_health(0.6), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_health(0.85), HealthStatus::Optimal);
    }

    #[test]
    fn sort_issues_orders_by_location() {
        let issues = vec![
            Issue::new(IssueKind::UnusedDefinition, Severity::Medium, "b.py", 1, "x"),
            Issue::new(IssueKind::UnusedDefinition, Severity::Medium, "a.py", 9, "y"),
            Issue::new(IssueKind::UnusedDefinition, Severity::Medium, "a.py", 2, "z"),
        ];
        let sorted = sort_issues(issues);
        let order: Vec<_> = sorted.iter().map(|i| (display_path(&i.file), i.line)).collect();
        assert_eq!(
            order,
            vec![("a.py".to_string(), 2), ("a.py".to_string(), 9), ("b.py".to_string(), 1)]
        );
    }

    #[test]
    fn overall_health_is_size_weighted() {
        let module = |id: &str, size, health, module_type| Module {
            id: id.to_string(),
            name: id.to_string(),
            path: id.to_string(),
            size,
            health,
            module_type,
            position: Position::default(),
        };
        let modules = vec![
            module("root", 400, 0.5, ModuleType::Core),
            module("a", 100, 1.0, ModuleType::Module),
            module("b", 300, 0.0, ModuleType::Module),
        ];
        assert!((overall_health(&modules) - 0.25).abs() < 1e-9);
        assert_eq!(overall_health(&[]), 0.0);
    }
}
