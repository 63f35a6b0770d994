#![allow(dead_code)]

use repo_vitals::config::VitalsConfig;
use repo_vitals::pipeline::{AnalysisCoordinator, AnalysisOptions, AnalysisResult};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary repository populated file by file.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn file(&self, relative: &str, content: &str) -> &Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write fixture file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn analyze(&self) -> AnalysisResult {
        self.analyze_with(VitalsConfig::default(), AnalysisOptions::default())
    }

    pub fn analyze_with(&self, config: VitalsConfig, options: AnalysisOptions) -> AnalysisResult {
        AnalysisCoordinator::new(config)
            .analyze(self.path(), &options)
            .expect("analysis succeeds")
    }
}

pub fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}
