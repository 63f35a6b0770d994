//! README lookup at the repository root.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Content signals pulled from a README.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadmeInfo {
    pub file: String,
    pub size: usize,
    pub word_count: usize,
    pub has_installation: bool,
    pub has_usage: bool,
    pub has_api: bool,
    pub has_contributing: bool,
}

impl ReadmeInfo {
    pub fn from_content(file: impl Into<String>, content: &str) -> Self {
        let lower = content.to_lowercase();
        Self {
            file: file.into(),
            size: content.len(),
            word_count: content.split_whitespace().count(),
            has_installation: lower.contains("install"),
            has_usage: lower.contains("usage") || lower.contains("example"),
            has_api: lower.contains("api"),
            has_contributing: lower.contains("contribut"),
        }
    }
}

/// Finds the conventional documentation entry point of a repository.
pub trait ReadmeLocator: Send + Sync {
    fn locate(&self, root: &Path) -> Option<ReadmeInfo>;
}

/// Checks a fixed list of names in order and reads the first that exists.
pub struct ConventionalReadme {
    names: Vec<String>,
}

impl ConventionalReadme {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl ReadmeLocator for ConventionalReadme {
    fn locate(&self, root: &Path) -> Option<ReadmeInfo> {
        self.names.iter().find_map(|name| {
            let path = root.join(name);
            if !path.is_file() {
                return None;
            }
            match std::fs::read(&path) {
                Ok(bytes) => Some(ReadmeInfo::from_content(
                    name.clone(),
                    &String::from_utf8_lossy(&bytes),
                )),
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    None
                }
            }
        })
    }
}
