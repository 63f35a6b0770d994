//! Parallelism configuration for per-file extraction.

use serde::{Deserialize, Serialize};

/// Default value for parallel processing enabled
fn default_enabled() -> bool {
    true
}

/// Configuration for parallel processing operations.
///
/// When enabled, files are extracted concurrently on a dedicated rayon
/// thread pool whose size is bounded by `max_concurrency`.
///
/// # Example
///
/// ```rust
/// use repo_vitals::config::ParallelConfig;
///
/// let config = ParallelConfig {
///     enabled: true,
///     max_concurrency: Some(4),
/// };
/// assert_eq!(config.worker_count(), 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParallelConfig {
    /// Enable parallel processing (default: true)
    ///
    /// When disabled, files are processed on a single worker.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum concurrent file extractions (default: available cores)
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_concurrency: None,
        }
    }
}

impl ParallelConfig {
    /// Create a config with parallel processing disabled.
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            max_concurrency: Some(1),
        }
    }

    /// Number of worker threads to spawn; 0 lets rayon pick.
    pub fn worker_count(&self) -> usize {
        if !self.enabled {
            return 1;
        }
        self.max_concurrency.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_uses_one_worker() {
        assert_eq!(ParallelConfig::sequential().worker_count(), 1);
        assert_eq!(ParallelConfig::default().worker_count(), 0);
    }
}
