//! Drives one run from the repository root to the aggregated result.

use super::result::{AnalysisOptions, AnalysisResult};
use super::state::{AnalysisState, CancellationToken, StateMachine};
use crate::aggregation::{aggregate_metrics, build_modules, file_health_map};
use crate::analyzers::{run_guarded, standard_passes, MetricPass, PassContext, PassSummaries};
use crate::config::VitalsConfig;
use crate::core::{overall_health, AnalysisError, FileFailure, Result, VulnerabilityCounts};
use crate::extraction::{FileFact, SyntaxExtractor};
use crate::io::{relative_to, ConventionalReadme, FileWalker, ReadmeLocator};
use crate::progress::{AnalysisObserver, SilentObserver};
use crate::security::{NoVulnerabilityScan, VulnerabilityProvider};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn};

/// Analyze `root` with default collaborators and the configuration found
/// for it on disk.
pub fn analyze(root: &Path, options: AnalysisOptions) -> Result<AnalysisResult> {
    let config = crate::config::load_config(root);
    AnalysisCoordinator::new(config).analyze(root, &options)
}

/// Runs walking, extraction, the metric passes and aggregation in order.
///
/// Each call owns its facts and accumulators, so one coordinator can serve
/// concurrent runs for different roots.
pub struct AnalysisCoordinator {
    config: VitalsConfig,
    readme: Box<dyn ReadmeLocator>,
    vulnerabilities: Box<dyn VulnerabilityProvider>,
    observer: Arc<dyn AnalysisObserver>,
    passes: Vec<Box<dyn MetricPass>>,
}

struct Candidates {
    files: Vec<PathBuf>,
    skipped: Vec<FileFailure>,
    truncated: bool,
}

struct Extraction {
    facts: Vec<FileFact>,
    skipped: Vec<FileFailure>,
}

impl AnalysisCoordinator {
    pub fn new(config: VitalsConfig) -> Self {
        let readme = ConventionalReadme::new(config.documentation.readme_names.clone());
        Self {
            config,
            readme: Box::new(readme),
            vulnerabilities: Box::new(NoVulnerabilityScan),
            observer: Arc::new(SilentObserver),
            passes: standard_passes(),
        }
    }

    pub fn with_readme_locator(mut self, locator: Box<dyn ReadmeLocator>) -> Self {
        self.readme = locator;
        self
    }

    pub fn with_vulnerability_provider(mut self, provider: Box<dyn VulnerabilityProvider>) -> Self {
        self.vulnerabilities = provider;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the metric passes. Passes left out are reported unavailable.
    pub fn with_passes(mut self, passes: Vec<Box<dyn MetricPass>>) -> Self {
        self.passes = passes;
        self
    }

    pub fn config(&self) -> &VitalsConfig {
        &self.config
    }

    pub fn analyze(&self, root: &Path, options: &AnalysisOptions) -> Result<AnalysisResult> {
        self.analyze_with_cancellation(root, options, &CancellationToken::new())
    }

    pub fn analyze_with_cancellation(
        &self,
        root: &Path,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let span = info_span!("analysis", root = %root.display());
        let _enter = span.enter();

        let mut machine = StateMachine::new(Arc::clone(&self.observer));
        match self.run(root, options, cancel, &mut machine) {
            Ok(result) => Ok(result),
            Err(error) => {
                if machine.state().is_terminal() {
                    return Err(error);
                }
                warn!("Analysis of {} stopped: {}", root.display(), error);
                Err(machine.abort(error))
            }
        }
    }

    fn run(
        &self,
        root: &Path,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
        machine: &mut StateMachine,
    ) -> Result<AnalysisResult> {
        machine.transition(AnalysisState::Walking)?;
        let candidates = self.walk(root, options)?;
        cancel.check()?;

        let pool = self.worker_pool(options)?;
        machine.transition(AnalysisState::Extracting)?;
        let extraction = self.extract(&pool, root, &candidates.files, options, cancel)?;
        cancel.check()?;

        machine.transition(AnalysisState::Analyzing)?;
        let readme = self.readme.locate(root);
        let ctx = PassContext {
            root,
            facts: &extraction.facts,
            config: &self.config,
            readme: readme.as_ref(),
        };
        let summaries = self.run_passes(&pool, &ctx, cancel)?;
        cancel.check()?;

        machine.transition(AnalysisState::Aggregating)?;
        let vulnerabilities = self.scan_vulnerabilities(root);
        let metrics = aggregate_metrics(&summaries, &vulnerabilities);
        let modules = build_modules(
            &root_name(root),
            &extraction.facts,
            &summaries,
            &self.config.health,
        );
        let file_health = file_health_map(&extraction.facts, &summaries, &self.config.health);
        let cycles_truncated = summaries
            .dependency_details()
            .is_some_and(|d| d.cycles_truncated);

        let mut skipped = candidates.skipped;
        skipped.extend(extraction.skipped);
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let result = AnalysisResult {
            root: root.to_path_buf(),
            timestamp: chrono::Utc::now(),
            overall_health: overall_health(&modules),
            issues: summaries.issues(),
            metrics,
            modules,
            summaries,
            file_health,
            files_analyzed: extraction.facts.len(),
            skipped,
            files_truncated: candidates.truncated,
            cycles_truncated,
        };

        machine.transition(AnalysisState::Done)?;
        info!(
            "Analyzed {} files ({} skipped), {} issues",
            result.files_analyzed,
            result.files_skipped(),
            result.issues.len()
        );
        Ok(result)
    }

    fn walk(&self, root: &Path, options: &AnalysisOptions) -> Result<Candidates> {
        let walker = FileWalker::from_config(root.to_path_buf(), &self.config.walker)
            .with_include_tests(options.include_tests);
        let (mut files, skipped) = walker.collect()?;
        files.sort();

        let truncated = options.max_files.is_some_and(|max| files.len() > max);
        if let Some(max) = options.max_files {
            files.truncate(max);
        }
        debug!("Found {} candidate files (truncated: {})", files.len(), truncated);

        let total_bytes: u64 = files
            .iter()
            .filter_map(|path| crate::io::file_size(path).ok())
            .sum();
        let limit_bytes = self.config.limits.max_total_bytes;
        if total_bytes > limit_bytes {
            return Err(AnalysisError::InputTooLarge {
                total_bytes,
                limit_bytes,
            });
        }

        for failure in &skipped {
            self.observer.file_skipped(failure);
        }

        Ok(Candidates {
            files,
            skipped,
            truncated,
        })
    }

    /// One bounded pool per run, shared by extraction and the metric passes.
    fn worker_pool(&self, options: &AnalysisOptions) -> Result<rayon::ThreadPool> {
        let workers = options
            .jobs
            .unwrap_or_else(|| self.config.parallel.worker_count());
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| AnalysisError::Configuration(format!("could not start worker pool: {e}")))
    }

    fn extract(
        &self,
        pool: &rayon::ThreadPool,
        root: &Path,
        files: &[PathBuf],
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Result<Extraction> {
        let extractor = SyntaxExtractor::new(&self.config.imports);
        let timeout = Duration::from_millis(options.per_file_timeout_ms);
        let max_bytes = self.config.limits.max_file_bytes;
        let total = files.len();
        let done = AtomicUsize::new(0);

        let outcomes: Vec<Option<std::result::Result<FileFact, FileFailure>>> =
            pool.install(|| {
                files
                    .par_iter()
                    .map(|path| {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        let relative = relative_to(path, root);
                        let outcome = extractor.extract_file(path, &relative, max_bytes, timeout);
                        let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                        match &outcome {
                            Ok(_) => self.observer.file_extracted(&relative, current, total),
                            Err(failure) => {
                                warn!("Skipping {}", failure);
                                self.observer.file_skipped(failure);
                            }
                        }
                        Some(outcome)
                    })
                    .collect()
            });
        cancel.check()?;

        let (mut facts, mut skipped) = (Vec::new(), Vec::new());
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(fact) => facts.push(fact),
                Err(failure) => skipped.push(failure),
            }
        }
        facts.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Extraction { facts, skipped })
    }

    fn run_passes(
        &self,
        pool: &rayon::ThreadPool,
        ctx: &PassContext,
        cancel: &CancellationToken,
    ) -> Result<PassSummaries> {
        let summaries: Vec<_> = pool.install(|| {
            self.passes
                .par_iter()
                .filter_map(|pass| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let span = info_span!("pass", name = %pass.name());
                    let _enter = span.enter();
                    let summary = run_guarded(pass.as_ref(), ctx);
                    match &summary.error {
                        Some(error) => warn!("Pass {} unavailable: {}", summary.pass, error),
                        None => debug!("Pass {} scored {:?}", summary.pass, summary.score),
                    }
                    self.observer.pass_completed(&summary);
                    Some(summary)
                })
                .collect()
        });
        cancel.check()?;
        Ok(PassSummaries::from_summaries(summaries))
    }

    fn scan_vulnerabilities(&self, root: &Path) -> VulnerabilityCounts {
        self.vulnerabilities.scan(root).unwrap_or_else(|e| {
            warn!(
                "Vulnerability provider {} failed: {:#}",
                self.vulnerabilities.provider_name(),
                e
            );
            VulnerabilityCounts::default()
        })
    }
}

fn root_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| root.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{PassName, PassSummary};
    use crate::progress::RecordingObserver;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_root_fails() {
        let recorder = RecordingObserver::new();
        let coordinator = AnalysisCoordinator::new(VitalsConfig::default())
            .with_observer(Arc::new(recorder.clone()));
        let err = coordinator
            .analyze(Path::new("/no/such/repository"), &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::PathNotFound { .. }));
        assert_eq!(
            recorder.states(),
            vec![AnalysisState::Walking, AnalysisState::Failed]
        );
    }

    #[test]
    fn full_run_visits_every_state() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/a.py", "def f():\n    return 1\n");
        let recorder = RecordingObserver::new();
        let result = AnalysisCoordinator::new(VitalsConfig::default())
            .with_observer(Arc::new(recorder.clone()))
            .analyze(temp.path(), &AnalysisOptions::default())
            .unwrap();

        assert_eq!(result.files_analyzed, 1);
        assert_eq!(
            recorder.states(),
            vec![
                AnalysisState::Walking,
                AnalysisState::Extracting,
                AnalysisState::Analyzing,
                AnalysisState::Aggregating,
                AnalysisState::Done,
            ]
        );
        assert_eq!(recorder.completed_passes().len(), 4);
    }

    #[test]
    fn total_size_ceiling_fails_run() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        let mut config = VitalsConfig::default();
        config.limits.max_total_bytes = 2;
        let err = AnalysisCoordinator::new(config)
            .analyze(temp.path(), &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InputTooLarge { .. }));
    }

    #[test]
    fn max_files_truncates_in_path_order() {
        let temp = TempDir::new().unwrap();
        for name in ["c.py", "a.py", "b.py"] {
            write(temp.path(), name, "x = 1\n");
        }
        let options = AnalysisOptions::default().with_max_files(Some(2));
        let result = AnalysisCoordinator::new(VitalsConfig::default())
            .analyze(temp.path(), &options)
            .unwrap();
        assert!(result.files_truncated);
        let analyzed: Vec<_> = result.file_health.keys().cloned().collect();
        assert_eq!(analyzed, vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
    }

    struct FailingProvider;

    impl VulnerabilityProvider for FailingProvider {
        fn scan(&self, _root: &Path) -> anyhow::Result<VulnerabilityCounts> {
            anyhow::bail!("scanner not installed")
        }

        fn provider_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn provider_failure_reports_zero_vulnerabilities() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        let result = AnalysisCoordinator::new(VitalsConfig::default())
            .with_vulnerability_provider(Box::new(FailingProvider))
            .analyze(temp.path(), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.metrics.vulnerabilities, VulnerabilityCounts::default());
    }

    struct BrokenPass;

    impl MetricPass for BrokenPass {
        fn name(&self) -> PassName {
            PassName::Complexity
        }

        fn run(&self, _ctx: &PassContext) -> anyhow::Result<PassSummary> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn broken_pass_leaves_others_available() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.py", "\"\"\"Docs.\"\"\"\n");
        let mut passes = standard_passes();
        passes.retain(|p| p.name() != PassName::Complexity);
        passes.push(Box::new(BrokenPass));

        let result = AnalysisCoordinator::new(VitalsConfig::default())
            .with_passes(passes)
            .analyze(temp.path(), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.metrics.complexity, None);
        assert!(result.metrics.documentation.is_some());
        assert!(result.metrics.yagni.is_some());
    }

    struct ThreadCountPass {
        seen: Arc<AtomicUsize>,
    }

    impl MetricPass for ThreadCountPass {
        fn name(&self) -> PassName {
            PassName::Complexity
        }

        fn run(&self, _ctx: &PassContext) -> anyhow::Result<PassSummary> {
            self.seen.store(rayon::current_num_threads(), Ordering::SeqCst);
            anyhow::bail!("recorded")
        }
    }

    #[test]
    fn passes_run_on_the_bounded_pool() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        let seen = Arc::new(AtomicUsize::new(0));
        let mut passes = standard_passes();
        passes.retain(|p| p.name() != PassName::Complexity);
        passes.push(Box::new(ThreadCountPass {
            seen: Arc::clone(&seen),
        }));

        let recorder = RecordingObserver::new();
        let options = AnalysisOptions::default().with_jobs(Some(3));
        AnalysisCoordinator::new(VitalsConfig::default())
            .with_observer(Arc::new(recorder.clone()))
            .with_passes(passes)
            .analyze(temp.path(), &options)
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.completed_passes().len(), 4);
    }

    #[test]
    fn cancelled_before_start_returns_no_result() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.py", "x = 1\n");
        let token = CancellationToken::new();
        token.cancel();
        let err = AnalysisCoordinator::new(VitalsConfig::default())
            .analyze_with_cancellation(temp.path(), &AnalysisOptions::default(), &token)
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
