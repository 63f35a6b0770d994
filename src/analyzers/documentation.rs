//! Docstring coverage, docstring quality and README signals.

use super::{MetricPass, PassContext, PassDetails, PassName, PassSummary};
use crate::core::metrics::{clamp_score, percentage, round2};
use crate::extraction::FileFact;
use crate::io::ReadmeInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const FUNCTION_WEIGHT: f64 = 0.4;
const CLASS_WEIGHT: f64 = 0.3;
const MODULE_WEIGHT: f64 = 0.2;
const COMMENT_BONUS_CAP: f64 = 10.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    Missing,
    Poor,
    Adequate,
    Good,
}

impl QualityLabel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => QualityLabel::Missing,
            s if s >= 70 => QualityLabel::Good,
            s if s >= 40 => QualityLabel::Adequate,
            _ => QualityLabel::Poor,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy)]
pub struct DocstringQuality {
    pub score: u32,
    pub label: QualityLabel,
    pub word_count: usize,
    pub has_params: bool,
    pub has_returns: bool,
    pub has_raises: bool,
}

impl DocstringQuality {
    /// Keyword heuristics over the docstring text; 0 for missing text.
    pub fn assess(docstring: Option<&str>) -> Self {
        let text = docstring.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Self {
                score: 0,
                label: QualityLabel::Missing,
                word_count: 0,
                has_params: false,
                has_returns: false,
                has_raises: false,
            };
        }

        let lower = text.to_lowercase();
        let word_count = text.split_whitespace().count();
        let has_params = lower.contains("param") || lower.contains("args");
        let has_returns = lower.contains("return");
        let has_raises = lower.contains("raise") || lower.contains("except");

        let score = 25
            + if word_count > 10 { 25 } else { 0 }
            + if has_params { 20 } else { 0 }
            + if has_returns { 20 } else { 0 }
            + if has_raises { 10 } else { 0 };

        Self {
            score,
            label: QualityLabel::from_score(score),
            word_count,
            has_params,
            has_returns,
            has_raises,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Module,
    Class,
    Function,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefinitionDocs {
    pub file: PathBuf,
    pub name: String,
    pub line: usize,
    pub kind: DefinitionKind,
    pub quality: DocstringQuality,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default, Copy)]
pub struct CoverageCounts {
    pub documented: usize,
    pub total: usize,
}

impl CoverageCounts {
    fn record(mut self, documented: bool) -> Self {
        self.documented += usize::from(documented);
        self.total += 1;
        self
    }

    pub fn undocumented(&self) -> usize {
        self.total - self.documented
    }

    pub fn coverage(&self) -> f64 {
        percentage(self.documented, self.total)
    }

    fn add(self, other: CoverageCounts) -> Self {
        Self {
            documented: self.documented + other.documented,
            total: self.total + other.total,
        }
    }
}

#[derive(Clone, Debug, Default, Copy)]
struct FileCoverage {
    functions: CoverageCounts,
    classes: CoverageCounts,
    modules: CoverageCounts,
    comment_lines: usize,
    total_lines: usize,
}

impl FileCoverage {
    fn of(fact: &FileFact) -> Self {
        Self {
            functions: fact
                .all_functions()
                .fold(CoverageCounts::default(), |c, f| c.record(f.has_docstring())),
            classes: fact
                .classes
                .iter()
                .fold(CoverageCounts::default(), |c, class| {
                    c.record(class.has_docstring())
                }),
            modules: CoverageCounts::default().record(fact.has_module_docstring()),
            comment_lines: fact.lines.comments,
            total_lines: fact.lines.total,
        }
    }

    fn add(self, other: FileCoverage) -> Self {
        Self {
            functions: self.functions.add(other.functions),
            classes: self.classes.add(other.classes),
            modules: self.modules.add(other.modules),
            comment_lines: self.comment_lines + other.comment_lines,
            total_lines: self.total_lines + other.total_lines,
        }
    }

    fn comment_ratio(&self) -> f64 {
        percentage(self.comment_lines, self.total_lines)
    }

    /// Weighted coverage plus a small comment bonus, clamped to [0, 100].
    fn score(&self) -> f64 {
        let weighted = FUNCTION_WEIGHT * self.functions.coverage()
            + CLASS_WEIGHT * self.classes.coverage()
            + MODULE_WEIGHT * self.modules.coverage()
            + (self.comment_ratio() * 5.0).min(COMMENT_BONUS_CAP);
        clamp_score(round2(weighted))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentationSummary {
    pub functions: CoverageCounts,
    pub classes: CoverageCounts,
    pub modules: CoverageCounts,
    pub function_coverage: f64,
    pub class_coverage: f64,
    pub module_coverage: f64,
    pub comment_lines: usize,
    pub total_lines: usize,
    /// Comment lines as a percentage of all lines
    pub comment_ratio: f64,
    pub average_quality: f64,
    pub quality_distribution: BTreeMap<QualityLabel, usize>,
    pub definitions: Vec<DefinitionDocs>,
    pub readme: Option<ReadmeInfo>,
}

pub struct DocumentationPass;

impl MetricPass for DocumentationPass {
    fn name(&self) -> PassName {
        PassName::Documentation
    }

    fn run(&self, ctx: &PassContext) -> anyhow::Result<PassSummary> {
        let per_file: Vec<(PathBuf, FileCoverage)> = ctx
            .facts
            .iter()
            .map(|fact| (fact.path.clone(), FileCoverage::of(fact)))
            .collect();

        let totals = per_file
            .iter()
            .map(|(_, coverage)| *coverage)
            .fold(FileCoverage::default(), FileCoverage::add);

        let file_scores = per_file
            .iter()
            .map(|(path, coverage)| (path.clone(), coverage.score()))
            .collect();

        let definitions: Vec<DefinitionDocs> = ctx.facts.iter().flat_map(definition_docs).collect();
        let documented_quality: Vec<u32> = definitions
            .iter()
            .filter(|d| d.quality.label != QualityLabel::Missing)
            .map(|d| d.quality.score)
            .collect();
        let average_quality = if documented_quality.is_empty() {
            0.0
        } else {
            documented_quality.iter().sum::<u32>() as f64 / documented_quality.len() as f64
        };
        let quality_distribution =
            definitions
                .iter()
                .fold(BTreeMap::new(), |mut acc: BTreeMap<QualityLabel, usize>, d| {
                    *acc.entry(d.quality.label).or_default() += 1;
                    acc
                });

        let score = totals.score();
        tracing::debug!(
            "Documentation: functions {:.1}%, classes {:.1}%, modules {:.1}%, score {:.2}",
            totals.functions.coverage(),
            totals.classes.coverage(),
            totals.modules.coverage(),
            score
        );

        let summary = DocumentationSummary {
            functions: totals.functions,
            classes: totals.classes,
            modules: totals.modules,
            function_coverage: round2(totals.functions.coverage()),
            class_coverage: round2(totals.classes.coverage()),
            module_coverage: round2(totals.modules.coverage()),
            comment_lines: totals.comment_lines,
            total_lines: totals.total_lines,
            comment_ratio: round2(totals.comment_ratio()),
            average_quality: round2(average_quality),
            quality_distribution,
            definitions,
            readme: ctx.readme.cloned(),
        };

        Ok(PassSummary::new(
            PassName::Documentation,
            score,
            Vec::new(),
            file_scores,
            PassDetails::Documentation(summary),
        ))
    }
}

fn definition_docs(fact: &FileFact) -> Vec<DefinitionDocs> {
    let module = DefinitionDocs {
        file: fact.path.clone(),
        name: fact
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        line: 1,
        kind: DefinitionKind::Module,
        quality: DocstringQuality::assess(fact.module_docstring.as_deref()),
    };
    let classes = fact.classes.iter().map(|class| DefinitionDocs {
        file: fact.path.clone(),
        name: class.name.clone(),
        line: class.line,
        kind: DefinitionKind::Class,
        quality: DocstringQuality::assess(class.docstring.as_deref()),
    });
    let functions = fact.all_functions().map(|function| DefinitionDocs {
        file: fact.path.clone(),
        name: function.name.clone(),
        line: function.line,
        kind: DefinitionKind::Function,
        quality: DocstringQuality::assess(function.docstring.as_deref()),
    });

    std::iter::once(module).chain(classes).chain(functions).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VitalsConfig;
    use crate::extraction::SyntaxExtractor;
    use indoc::indoc;
    use std::path::Path;

    fn run_with(files: &[(&str, &str)], readme: Option<&ReadmeInfo>) -> PassSummary {
        let extractor = SyntaxExtractor::default();
        let facts: Vec<FileFact> = files
            .iter()
            .map(|(path, code)| extractor.extract(Path::new(path), code).unwrap())
            .collect();
        let config = VitalsConfig::default();
        let ctx = PassContext {
            root: Path::new("."),
            facts: &facts,
            config: &config,
            readme,
        };
        DocumentationPass.run(&ctx).unwrap()
    }

    fn details(summary: &PassSummary) -> &DocumentationSummary {
        match summary.details.as_ref().unwrap() {
            PassDetails::Documentation(details) => details,
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_quality_scoring() {
        let full = DocstringQuality::assess(Some(
            "Compute the total across all entries in the ledger.\n\nArgs:\n    entries: rows\n\nReturns:\n    the sum\n\nRaises:\n    ValueError",
        ));
        assert_eq!(full.score, 100);
        assert_eq!(full.label, QualityLabel::Good);

        let short = DocstringQuality::assess(Some("Add numbers."));
        assert_eq!(short.score, 25);
        assert_eq!(short.label, QualityLabel::Poor);

        let medium = DocstringQuality::assess(Some("Returns the value."));
        assert_eq!(medium.score, 45);
        assert_eq!(medium.label, QualityLabel::Adequate);

        assert_eq!(DocstringQuality::assess(None).label, QualityLabel::Missing);
        assert_eq!(DocstringQuality::assess(Some("   ")).score, 0);
    }

    #[test]
    fn test_undocumented_function_scores_zero() {
        let summary = run_with(
            &[(
                "app.py",
                indoc! {r#"
                    def handle(x):
                        if x > 1:
                            x += 1
                        if x > 2:
                            x += 2
                        return x
                "#},
            )],
            None,
        );
        let details = details(&summary);
        assert_eq!(details.function_coverage, 0.0);
        assert_eq!(details.functions.undocumented(), 1);
        assert_eq!(summary.score, Some(0.0));
    }

    #[test]
    fn test_weighted_coverage_with_comment_bonus() {
        let summary = run_with(
            &[(
                "svc.py",
                indoc! {r#"
                    """Service module."""
                    # configuration

                    class Service:
                        """A service."""

                        def run(self):
                            return 1
                "#},
            )],
            None,
        );
        let details = details(&summary);
        assert_eq!(details.function_coverage, 0.0);
        assert_eq!(details.class_coverage, 100.0);
        assert_eq!(details.module_coverage, 100.0);
        // 0.3 * 100 + 0.2 * 100 + min(1/8 lines * 100 * 5, 10)
        assert_eq!(summary.score, Some(60.0));
    }

    #[test]
    fn test_empty_repository() {
        let summary = run_with(&[], None);
        assert_eq!(summary.score, Some(0.0));
        assert_eq!(details(&summary).modules.total, 0);
    }

    #[test]
    fn test_coverage_is_idempotent() {
        let files = [("a.py", "def f():\n    \"\"\"Doc.\"\"\"\n\ndef g():\n    pass\n")];
        assert_eq!(run_with(&files, None), run_with(&files, None));
    }

    #[test]
    fn test_readme_is_reported() {
        let readme = ReadmeInfo::from_content("README.md", "## Installation\npip install tool");
        let summary = run_with(&[], Some(&readme));
        let reported = details(&summary).readme.as_ref().unwrap();
        assert_eq!(reported.file, "README.md");
        assert!(reported.has_installation);
    }
}
