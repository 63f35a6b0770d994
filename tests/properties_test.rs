use proptest::prelude::*;
use repo_vitals::analyzers::redundancy::redundancy_score;
use repo_vitals::core::metrics::ComplexityRank;
use repo_vitals::core::{Issue, IssueKind, Severity};
use repo_vitals::extraction::SyntaxExtractor;
use std::path::Path;

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High)
    ]
}

fn issue(severity: Severity, line: usize) -> Issue {
    Issue::new(
        IssueKind::UnusedDefinition,
        severity,
        "pkg/mod.py",
        line,
        "Function 'f' is never called",
    )
}

#[test]
fn rank_boundaries() {
    assert_eq!(ComplexityRank::from_complexity(5), ComplexityRank::Low);
    assert_eq!(ComplexityRank::from_complexity(6), ComplexityRank::Moderate);
    assert_eq!(ComplexityRank::from_complexity(10), ComplexityRank::Moderate);
    assert_eq!(ComplexityRank::from_complexity(11), ComplexityRank::High);
    assert_eq!(ComplexityRank::from_complexity(20), ComplexityRank::High);
    assert_eq!(ComplexityRank::from_complexity(21), ComplexityRank::VeryHigh);
}

proptest! {
    #[test]
    fn rank_is_monotonic(a in 1u32..200, b in 1u32..200) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ComplexityRank::from_complexity(low) <= ComplexityRank::from_complexity(high));
        prop_assert_eq!(ComplexityRank::from_complexity(a), ComplexityRank::from_complexity(a));
    }

    #[test]
    fn redundancy_score_never_increases_with_more_issues(
        severities in prop::collection::vec(severity(), 0..80),
        extra in severity(),
    ) {
        let issues: Vec<Issue> = severities
            .iter()
            .enumerate()
            .map(|(i, s)| issue(*s, i + 1))
            .collect();
        let before = redundancy_score(&issues);

        let mut more = issues.clone();
        more.push(issue(extra, 10_000));
        let after = redundancy_score(&more);

        prop_assert!(after <= before);
        prop_assert!((0.0..=100.0).contains(&after));
    }

    #[test]
    fn each_if_adds_one_to_complexity(branches in 0usize..30) {
        let body: String = (0..branches)
            .map(|i| format!("    if x == {i}:\n        x += 1\n"))
            .collect();
        let source = format!("def f(x):\n{body}    return x\n");

        let fact = SyntaxExtractor::default()
            .extract(Path::new("gen.py"), &source)
            .unwrap();
        prop_assert_eq!(fact.functions.len(), 1);
        prop_assert_eq!(fact.functions[0].complexity as usize, branches + 1);
    }
}
