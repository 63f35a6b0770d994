//! Cyclomatic complexity ranking and scoring.

use super::{MetricPass, PassContext, PassDetails, PassName, PassSummary};
use crate::core::metrics::{
    calculate_average_complexity, complexity_score, find_max_complexity, round2, ComplexityRank,
};
use crate::extraction::FileFact;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RankDistribution {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub very_high: usize,
}

impl RankDistribution {
    fn record(mut self, rank: ComplexityRank) -> Self {
        match rank {
            ComplexityRank::Low => self.low += 1,
            ComplexityRank::Moderate => self.moderate += 1,
            ComplexityRank::High => self.high += 1,
            ComplexityRank::VeryHigh => self.very_high += 1,
        }
        self
    }

    pub fn total(&self) -> usize {
        self.low + self.moderate + self.high + self.very_high
    }
}

/// A function above the high-complexity threshold.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlaggedFunction {
    pub file: PathBuf,
    pub name: String,
    pub line: usize,
    pub complexity: u32,
    pub rank: ComplexityRank,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComplexitySummary {
    pub total_files: usize,
    pub total_functions: usize,
    pub total_lines: usize,
    pub source_lines: usize,
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub rank_distribution: RankDistribution,
    /// Highest complexity first, capped at the configured size
    pub high_complexity_functions: Vec<FlaggedFunction>,
}

pub struct ComplexityPass;

impl MetricPass for ComplexityPass {
    fn name(&self) -> PassName {
        PassName::Complexity
    }

    fn run(&self, ctx: &PassContext) -> anyhow::Result<PassSummary> {
        let settings = &ctx.config.complexity;
        let functions = || ctx.facts.iter().flat_map(FileFact::all_functions);

        let average = calculate_average_complexity(functions());
        let total_functions = functions().count();

        let rank_distribution = functions()
            .map(|f| ComplexityRank::from_complexity(f.complexity))
            .fold(RankDistribution::default(), RankDistribution::record);

        let mut flagged: Vec<FlaggedFunction> = ctx
            .facts
            .iter()
            .flat_map(|fact| {
                fact.all_functions()
                    .filter(|f| f.complexity > settings.high_complexity_threshold)
                    .map(|f| FlaggedFunction {
                        file: fact.path.clone(),
                        name: f.name.clone(),
                        line: f.line,
                        complexity: f.complexity,
                        rank: ComplexityRank::from_complexity(f.complexity),
                    })
            })
            .collect();
        flagged.sort_by(|a, b| {
            b.complexity
                .cmp(&a.complexity)
                .then_with(|| a.file.cmp(&b.file))
                .then(a.line.cmp(&b.line))
        });
        flagged.truncate(settings.top_n);

        let file_scores: BTreeMap<PathBuf, f64> = ctx
            .facts
            .iter()
            .map(|fact| {
                let score = complexity_score(
                    calculate_average_complexity(fact.all_functions()),
                    fact.function_count(),
                );
                (fact.path.clone(), round2(score))
            })
            .collect();

        tracing::debug!(
            "Complexity: {} functions, average {:.2}, {} flagged",
            total_functions,
            average,
            flagged.len()
        );

        let summary = ComplexitySummary {
            total_files: ctx.facts.len(),
            total_functions,
            total_lines: ctx.facts.iter().map(|f| f.lines.total).sum(),
            source_lines: ctx.facts.iter().map(|f| f.lines.source).sum(),
            average_complexity: round2(average),
            max_complexity: find_max_complexity(functions()),
            rank_distribution,
            high_complexity_functions: flagged,
        };

        Ok(PassSummary::new(
            PassName::Complexity,
            round2(complexity_score(average, total_functions)),
            Vec::new(),
            file_scores,
            PassDetails::Complexity(summary),
        ))
    }
}
