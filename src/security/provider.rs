use crate::core::VulnerabilityCounts;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub trait VulnerabilityProvider: Send + Sync {
    fn scan(&self, root: &Path) -> Result<VulnerabilityCounts>;
    fn provider_name(&self) -> &str;
}

/// Reports no vulnerabilities.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVulnerabilityScan;

impl VulnerabilityProvider for NoVulnerabilityScan {
    fn scan(&self, _root: &Path) -> Result<VulnerabilityCounts> {
        Ok(VulnerabilityCounts::default())
    }

    fn provider_name(&self) -> &str {
        "none"
    }
}

/// Reads a JSON report written by `bandit -f json`.
///
/// Relative report paths are resolved against the repository root.
#[derive(Clone, Debug)]
pub struct BanditReportProvider {
    report: PathBuf,
}

impl BanditReportProvider {
    pub fn new(report: impl Into<PathBuf>) -> Self {
        Self {
            report: report.into(),
        }
    }

    fn parse_report(&self, output: &[u8]) -> Result<VulnerabilityCounts> {
        let json: serde_json::Value =
            serde_json::from_slice(output).context("Failed to parse bandit report")?;

        let severities = json["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .map(|result| result["issue_severity"].as_str().unwrap_or("MEDIUM"))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(count_severities(severities))
    }
}

impl VulnerabilityProvider for BanditReportProvider {
    fn scan(&self, root: &Path) -> Result<VulnerabilityCounts> {
        let path = if self.report.is_absolute() {
            self.report.clone()
        } else {
            root.join(&self.report)
        };
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read bandit report {}", path.display()))?;
        self.parse_report(&bytes)
    }

    fn provider_name(&self) -> &str {
        "bandit"
    }
}

/// Histogram of severity labels; unknown labels are ignored.
pub fn count_severities<'a>(severities: impl IntoIterator<Item = &'a str>) -> VulnerabilityCounts {
    severities
        .into_iter()
        .fold(VulnerabilityCounts::default(), |mut counts, severity| {
            match severity.to_ascii_lowercase().as_str() {
                "critical" => counts.critical += 1,
                "high" => counts.high += 1,
                "medium" => counts.medium += 1,
                "low" => counts.low += 1,
                _ => {}
            }
            counts
        })
}
