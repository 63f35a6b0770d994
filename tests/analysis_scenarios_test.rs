mod common;

use common::{paths, Fixture};
use indoc::indoc;
use pretty_assertions::assert_eq;
use repo_vitals::analyzers::PassName;
use repo_vitals::config::VitalsConfig;
use repo_vitals::core::{AnalysisError, FailureKind, IssueKind, ModuleType, Severity};
use repo_vitals::pipeline::{
    AnalysisCoordinator, AnalysisOptions, AnalysisState, CancellationToken,
};
use repo_vitals::progress::{AnalysisObserver, RecordingObserver};
use repo_vitals::{FileFailure, PassSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[test]
fn single_undocumented_function_with_two_branches() {
    let fixture = Fixture::new();
    fixture.file(
        "app.py",
        indoc! {r#"
            def handle(x):
                if x > 1:
                    x += 1
                if x > 2:
                    x += 2
                return x
        "#},
    );

    let result = fixture.analyze();
    let complexity = result.summaries.complexity_details().unwrap();
    assert_eq!(complexity.total_functions, 1);
    assert_eq!(complexity.max_complexity, 3);
    assert_eq!(complexity.rank_distribution.low, 1);

    let docs = result.summaries.documentation_details().unwrap();
    assert_eq!(docs.function_coverage, 0.0);

    assert_eq!(result.metrics.complexity, Some(85.0));
    assert_eq!(result.metrics.documentation, Some(0.0));
    assert_eq!(result.metrics.coverage, Some(0.0));
    assert_eq!(result.metrics.dependencies, 0);

    // `handle` is never called anywhere: one medium redundancy finding.
    assert_eq!(result.metrics.yagni, Some(96.0));
    assert_eq!(result.metrics.tech_debt, 29.75);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].kind, IssueKind::UnusedDefinition);
}

#[test]
fn mutually_importing_files_form_one_cycle() {
    let fixture = Fixture::new();
    fixture
        .file("pkg/a.py", "from . import b\n")
        .file("pkg/b.py", "from . import a\n");

    let result = fixture.analyze();
    let deps = result.summaries.dependency_details().unwrap();
    assert_eq!(deps.cycles.len(), 1);
    assert_eq!(deps.cycles[0].cycle, paths(&["pkg/a.py", "pkg/b.py"]));
    assert!(!result.cycles_truncated);

    let cycles: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::CircularDependency)
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].severity, Severity::High);
}

#[test]
fn three_module_cycle_is_reported_once() {
    let fixture = Fixture::new();
    fixture
        .file("pkg/c.py", "from . import a\n")
        .file("pkg/a.py", "from . import b\n")
        .file("pkg/b.py", "from . import c\n");

    let result = fixture.analyze();
    let deps = result.summaries.dependency_details().unwrap();
    assert_eq!(deps.cycles.len(), 1);
    assert_eq!(deps.cycles[0].cycle.len(), 3);
    assert_eq!(deps.cycles[0].cycle[0], PathBuf::from("pkg/a.py"));
}

#[test]
fn delegating_class_yields_one_wrapper_issue() {
    let fixture = Fixture::new();
    fixture.file(
        "proxy.py",
        indoc! {r#"
            class Proxy:
                def __init__(self, inner):
                    self.inner = inner

                def a(self):
                    return self.inner.a()

                def b(self):
                    return self.inner.b()

                def c(self):
                    return self.inner.c()

                def d(self):
                    return self.inner.d()

                def e(self):
                    return self.inner.e()

            proxy = Proxy(object())
        "#},
    );

    let result = fixture.analyze();
    let wrappers: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::UnnecessaryDelegationWrapper)
        .collect();
    assert_eq!(wrappers.len(), 1);
    assert_eq!(wrappers[0].severity, Severity::Low);
    assert_eq!(result.metrics.yagni, Some(98.0));
}

#[test]
fn empty_repository_scores_stay_in_range() {
    let fixture = Fixture::new();
    let result = fixture.analyze();

    assert_eq!(result.files_analyzed, 0);
    assert_eq!(result.metrics.complexity, Some(100.0));
    for score in [
        result.metrics.complexity,
        result.metrics.documentation,
        result.metrics.coverage,
        result.metrics.yagni,
    ]
    .into_iter()
    .flatten()
    {
        assert!((0.0..=100.0).contains(&score));
    }
    assert!((0.0..=100.0).contains(&result.metrics.tech_debt));
    assert_eq!(result.modules.len(), 1);
    assert_eq!(result.modules[0].module_type, ModuleType::Core);
    assert_eq!(result.modules[0].size, 0);
}

#[test]
fn parse_errors_are_skipped_not_fatal() {
    let fixture = Fixture::new();
    fixture
        .file("good.py", "def ok():\n    return 1\n\nok()\n")
        .file("bad.py", "def broken(:\n    pass\n");

    let result = fixture.analyze();
    assert_eq!(result.files_analyzed, 1);
    assert_eq!(result.files_skipped(), 1);
    assert_eq!(result.skipped[0].path, PathBuf::from("bad.py"));
    assert_eq!(result.skipped[0].kind, FailureKind::Parse);
}

#[test]
fn oversized_files_are_skipped() {
    let fixture = Fixture::new();
    fixture
        .file("small.py", "x = 1\n")
        .file("large.py", &"y = 2\n".repeat(100));

    let mut config = VitalsConfig::default();
    config.limits.max_file_bytes = 64;
    let result = fixture.analyze_with(config, AnalysisOptions::default());

    assert_eq!(result.files_analyzed, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].kind, FailureKind::TooLarge);
}

#[test]
fn timed_out_files_are_skipped_and_run_completes() {
    let fixture = Fixture::new();
    fixture
        .file("a.py", "def a():\n    return 1\n")
        .file("b.py", "def b():\n    return 2\n")
        .file("c.py", "def c():\n    return 3\n");

    let options = AnalysisOptions::default().with_per_file_timeout_ms(0);
    let result = fixture.analyze_with(VitalsConfig::default(), options);

    assert!(!result.skipped.is_empty());
    assert!(result
        .skipped
        .iter()
        .all(|failure| failure.kind == FailureKind::Timeout));
    assert_eq!(result.files_analyzed + result.files_skipped(), 3);
    assert!(result.metrics.complexity.is_some());
}

#[test]
fn class_used_only_in_type_hints_is_not_unused() {
    let fixture = Fixture::new();
    fixture.file(
        "m.py",
        indoc! {"
            class Model:
                pass

            def use(m: Model) -> Model:
                return m

            use(None)
        "},
    );

    let result = fixture.analyze();
    assert!(result
        .issues
        .iter()
        .all(|issue| !(issue.kind == IssueKind::UnusedDefinition && issue.message.contains("Model"))));
}

#[test]
fn missing_root_is_path_not_found() {
    let err = AnalysisCoordinator::new(VitalsConfig::default())
        .analyze(
            Path::new("/definitely/not/a/repository"),
            &AnalysisOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, AnalysisError::PathNotFound { .. }));
}

#[test]
fn modules_follow_top_level_directories() {
    let fixture = Fixture::new();
    fixture
        .file("setup.py", "x = 1\n")
        .file("api/views.py", "def view():\n    return 1\n\nview()\n")
        .file("core/models.py", "class Model:\n    pass\n\nModel()\n");

    let result = fixture.analyze();
    let ids: Vec<&str> = result.modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["root", "api", "core"]);
    assert_eq!(result.modules[0].path, "/");
    assert_eq!(result.modules[0].size, 9);
    for module in &result.modules {
        assert!((0.0..=1.0).contains(&module.health));
    }
    assert!((0.0..=1.0).contains(&result.overall_health));
}

#[test]
fn test_files_are_excluded_unless_requested() {
    let fixture = Fixture::new();
    fixture
        .file("lib.py", "x = 1\n")
        .file("test_lib.py", "y = 2\n");

    let default = fixture.analyze();
    assert_eq!(default.files_analyzed, 1);

    let with_tests = fixture.analyze_with(
        VitalsConfig::default(),
        AnalysisOptions::default().with_include_tests(true),
    );
    assert_eq!(with_tests.files_analyzed, 2);
}

/// Cancels the run once a fixed number of files have been extracted.
struct CancelAfter {
    token: CancellationToken,
    after: usize,
    recorder: RecordingObserver,
}

impl AnalysisObserver for CancelAfter {
    fn state_changed(&self, from: AnalysisState, to: AnalysisState) {
        self.recorder.state_changed(from, to);
    }

    fn file_extracted(&self, path: &Path, current: usize, total: usize) {
        self.recorder.file_extracted(path, current, total);
        if current >= self.after {
            self.token.cancel();
        }
    }

    fn file_skipped(&self, failure: &FileFailure) {
        self.recorder.file_skipped(failure);
    }

    fn pass_completed(&self, summary: &PassSummary) {
        self.recorder.pass_completed(summary);
    }
}

#[test]
fn cancelling_mid_extraction_returns_no_metrics() {
    let fixture = Fixture::new();
    for i in 0..100 {
        fixture.file(
            &format!("pkg/module_{i:03}.py"),
            &format!("def f{i}():\n    return {i}\n"),
        );
    }

    let token = CancellationToken::new();
    let recorder = RecordingObserver::new();
    let observer = CancelAfter {
        token: token.clone(),
        after: 10,
        recorder: recorder.clone(),
    };
    let coordinator =
        AnalysisCoordinator::new(VitalsConfig::default()).with_observer(Arc::new(observer));

    let outcome = coordinator.analyze_with_cancellation(
        fixture.path(),
        &AnalysisOptions::default().with_jobs(Some(2)),
        &token,
    );

    let err = outcome.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(recorder.states().last(), Some(&AnalysisState::Cancelled));
    assert!(!recorder.states().contains(&AnalysisState::Analyzing));
    assert!(recorder.completed_passes().is_empty());
    assert!(recorder.extracted_count() < 100);
}

#[test]
fn observer_sees_every_pass() {
    let fixture = Fixture::new();
    fixture.file("a.py", "x = 1\n");
    let recorder = RecordingObserver::new();
    AnalysisCoordinator::new(VitalsConfig::default())
        .with_observer(Arc::new(recorder.clone()))
        .analyze(fixture.path(), &AnalysisOptions::default())
        .unwrap();

    let mut passes = recorder.completed_passes();
    passes.sort();
    assert_eq!(passes, PassName::ALL.to_vec());
    assert_eq!(recorder.extracted_count(), 1);
}
