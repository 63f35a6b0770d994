use crate::config::WalkerConfig;
use crate::core::{AnalysisError, FailureKind, FileFailure};
use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::warn;

const SOURCE_EXTENSION: &str = "py";

pub struct FileWalker {
    root: PathBuf,
    include_tests: bool,
    excluded_dirs: Vec<String>,
    ignore_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        let defaults = WalkerConfig::default();
        Self {
            root,
            include_tests: true,
            excluded_dirs: defaults.excluded_dirs,
            ignore_patterns: defaults.ignore_patterns,
        }
    }

    pub fn from_config(root: PathBuf, config: &WalkerConfig) -> Self {
        Self::new(root)
            .with_excluded_dirs(config.excluded_dirs.clone())
            .with_ignore_patterns(config.ignore_patterns.clone())
    }

    pub fn with_include_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_excluded_dirs(mut self, dirs: Vec<String>) -> Self {
        self.excluded_dirs = dirs;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Start walking. The returned sequence is lazy and can be consumed once.
    pub fn walk(&self) -> Result<SourceFiles, AnalysisError> {
        if !self.root.is_dir() {
            return Err(AnalysisError::path_not_found(&self.root));
        }

        let excluded = self.excluded_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir
                    && entry.depth() > 0
                    && excluded
                        .iter()
                        .any(|name| entry.file_name().to_string_lossy() == name.as_str()))
            })
            .build();

        let patterns = self
            .ignore_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Ignoring invalid ignore pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();

        Ok(SourceFiles {
            root: self.root.clone(),
            inner: walker,
            include_tests: self.include_tests,
            patterns,
            failures: Vec::new(),
        })
    }

    /// Walk to completion, returning candidates and soft failures.
    pub fn collect(&self) -> Result<(Vec<PathBuf>, Vec<FileFailure>), AnalysisError> {
        let mut files = self.walk()?;
        let paths: Vec<PathBuf> = files.by_ref().collect();
        Ok((paths, files.into_failures()))
    }
}

/// Lazy, non-restartable sequence of candidate source files.
pub struct SourceFiles {
    root: PathBuf,
    inner: Walk,
    include_tests: bool,
    patterns: Vec<glob::Pattern>,
    failures: Vec<FileFailure>,
}

impl SourceFiles {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries that could not be read so far.
    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<FileFailure> {
        self.failures
    }

    fn should_process(&self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            return false;
        }

        if !self.include_tests && is_test_file(path) {
            return false;
        }

        let path_str = path.to_string_lossy();
        !self.patterns.iter().any(|p| p.matches(&path_str))
    }
}

impl Iterator for SourceFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = error_path(&e).unwrap_or_else(|| self.root.clone());
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    self.failures
                        .push(FileFailure::new(path, FailureKind::Unreadable, e.to_string()));
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file()) && self.should_process(path) {
                return Some(path.to_path_buf());
            }
        }
    }
}

fn error_path(error: &ignore::Error) -> Option<PathBuf> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}

/// `test_*.py` and `*_test.py` are test modules by convention.
pub fn is_test_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.starts_with("test_") || name.ends_with("_test.py")
}

/// Make `path` relative to `root`, leaving it unchanged if it is outside.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
