use serde::{Deserialize, Serialize};

use super::parallel::ParallelConfig;
use super::scoring::HealthWeights;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Root configuration structure, read from `.repo-vitals.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VitalsConfig {
    /// File discovery rules
    #[serde(default)]
    pub walker: WalkerConfig,

    /// Resource ceilings
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Import classification
    #[serde(default)]
    pub imports: ImportsConfig,

    /// Complexity reporting
    #[serde(default)]
    pub complexity: ComplexityConfig,

    /// Documentation lookup
    #[serde(default)]
    pub documentation: DocumentationConfig,

    /// Redundancy heuristics
    #[serde(default)]
    pub redundancy: RedundancyConfig,

    /// Per-pass weights in file health
    #[serde(default)]
    pub health: HealthWeights,

    /// Extraction worker pool
    #[serde(default)]
    pub parallel: ParallelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WalkerConfig {
    /// Directory names never descended into
    pub excluded_dirs: Vec<String>,
    /// Glob patterns matched against the full path
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: strings(&[
                "__pycache__",
                "node_modules",
                "venv",
                ".venv",
                "env",
                ".env",
                ".git",
                ".hg",
                ".tox",
                ".nox",
                ".eggs",
                ".mypy_cache",
                ".pytest_cache",
                "build",
                "dist",
                "site-packages",
            ]),
            ignore_patterns: Vec::new(),
        }
    }
}

pub fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

pub fn default_max_total_bytes() -> u64 {
    512 * 1024 * 1024
}

pub fn default_max_reported_cycles() -> usize {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Files above this size are skipped as a soft failure
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Runs whose candidate files exceed this total fail up front
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
    /// Cycle enumeration stops after this many distinct cycles
    #[serde(default = "default_max_reported_cycles")]
    pub max_reported_cycles: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_total_bytes: default_max_total_bytes(),
            max_reported_cycles: default_max_reported_cycles(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportsConfig {
    /// Top-level module names treated as the standard library
    pub stdlib_modules: Vec<String>,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            stdlib_modules: strings(&[
                "abc",
                "argparse",
                "array",
                "ast",
                "asyncio",
                "base64",
                "bisect",
                "builtins",
                "calendar",
                "collections",
                "concurrent",
                "configparser",
                "contextlib",
                "copy",
                "csv",
                "ctypes",
                "dataclasses",
                "datetime",
                "decimal",
                "difflib",
                "email",
                "enum",
                "errno",
                "fnmatch",
                "fractions",
                "functools",
                "gc",
                "getpass",
                "glob",
                "gzip",
                "hashlib",
                "heapq",
                "hmac",
                "html",
                "http",
                "importlib",
                "inspect",
                "io",
                "ipaddress",
                "itertools",
                "json",
                "logging",
                "math",
                "multiprocessing",
                "operator",
                "os",
                "pathlib",
                "pickle",
                "platform",
                "pprint",
                "queue",
                "random",
                "re",
                "secrets",
                "select",
                "shutil",
                "signal",
                "socket",
                "sqlite3",
                "ssl",
                "statistics",
                "string",
                "struct",
                "subprocess",
                "sys",
                "tempfile",
                "textwrap",
                "threading",
                "time",
                "timeit",
                "traceback",
                "types",
                "typing",
                "unittest",
                "urllib",
                "uuid",
                "warnings",
                "weakref",
                "xml",
                "zipfile",
                "zlib",
            ]),
        }
    }
}

pub fn default_high_complexity_threshold() -> u32 {
    10
}

pub fn default_top_n() -> usize {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplexityConfig {
    /// Functions above this complexity are flagged in the report
    #[serde(default = "default_high_complexity_threshold")]
    pub high_complexity_threshold: u32,
    /// Length of the flagged-function report
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            high_complexity_threshold: default_high_complexity_threshold(),
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentationConfig {
    /// README candidates, checked in order at the repository root
    pub readme_names: Vec<String>,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            readme_names: strings(&["README.md", "README.rst", "README.txt", "README"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedundancyConfig {
    /// Function names never reported as unused
    pub dead_code_allowlist: Vec<String>,
    /// Substrings that mark a base class as an abstract base
    pub abstract_base_markers: Vec<String>,
    /// Substrings that mark a decorator as declaring an abstract method
    pub abstract_method_markers: Vec<String>,
    /// Case-insensitive substrings that mark a decorator as caching
    pub cache_decorator_markers: Vec<String>,
    /// Container constructors considered heavier than needed
    pub fancy_containers: Vec<String>,
    /// Delegating share of methods above which a class is a wrapper
    pub wrapper_ratio: f64,
    /// Cached functions with fewer body statements are flagged
    pub caching_body_limit: usize,
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            dead_code_allowlist: strings(&["__init__", "__str__", "__repr__", "main"]),
            abstract_base_markers: strings(&["ABC"]),
            abstract_method_markers: strings(&["abstract"]),
            cache_decorator_markers: strings(&["cache"]),
            fancy_containers: strings(&["OrderedDict", "deque", "ChainMap"]),
            wrapper_ratio: 0.8,
            caching_body_limit: 5,
        }
    }
}

impl RedundancyConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.wrapper_ratio) {
            return Err(format!(
                "wrapper_ratio must be between 0.0 and 1.0, got {}",
                self.wrapper_ratio
            ));
        }
        Ok(())
    }
}
