//! Vulnerability inputs for the unified metrics.
//!
//! Scanning itself is outside the engine. A provider only reports a severity
//! histogram for the repository; a failing provider never fails the run.

pub mod provider;

pub use provider::{
    count_severities, BanditReportProvider, NoVulnerabilityScan, VulnerabilityProvider,
};
