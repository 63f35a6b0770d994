use crate::extraction::types::FunctionFact;
use serde::{Deserialize, Serialize};

/// Cyclomatic complexity band.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityRank {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ComplexityRank {
    pub fn from_complexity(complexity: u32) -> Self {
        match complexity {
            0..=5 => ComplexityRank::Low,
            6..=10 => ComplexityRank::Moderate,
            11..=20 => ComplexityRank::High,
            _ => ComplexityRank::VeryHigh,
        }
    }

    /// Letter grade in the conventional A-D scale.
    pub fn letter(&self) -> char {
        match self {
            ComplexityRank::Low => 'A',
            ComplexityRank::Moderate => 'B',
            ComplexityRank::High => 'C',
            ComplexityRank::VeryHigh => 'D',
        }
    }
}

impl std::fmt::Display for ComplexityRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(ComplexityRank, &str)] = &[
            (ComplexityRank::Low, "low"),
            (ComplexityRank::Moderate, "moderate"),
            (ComplexityRank::High, "high"),
            (ComplexityRank::VeryHigh, "very high"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(r, _)| r == self)
            .map(|(_, s)| *s)
            .unwrap_or("unknown");

        write!(f, "{display_str}")
    }
}

pub fn calculate_average_complexity<'a, I>(functions: I) -> f64
where
    I: IntoIterator<Item = &'a FunctionFact>,
{
    let (total, count) = functions
        .into_iter()
        .fold((0u64, 0usize), |(total, count), f| {
            (total + u64::from(f.complexity), count + 1)
        });

    if count == 0 {
        return 0.0;
    }
    total as f64 / count as f64
}

pub fn find_max_complexity<'a, I>(functions: I) -> u32
where
    I: IntoIterator<Item = &'a FunctionFact>,
{
    functions
        .into_iter()
        .map(|f| f.complexity)
        .max()
        .unwrap_or(0)
}

/// Complexity score: 100 minus 5 points per unit of average complexity.
/// An empty function set has nothing to penalize and scores 100.
pub fn complexity_score(average_complexity: f64, function_count: usize) -> f64 {
    if function_count == 0 {
        return 100.0;
    }
    clamp_score(100.0 - 5.0 * average_complexity)
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100`, or 0 when there is nothing to measure.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_boundaries() {
        assert_eq!(ComplexityRank::from_complexity(1), ComplexityRank::Low);
        assert_eq!(ComplexityRank::from_complexity(5), ComplexityRank::Low);
        assert_eq!(ComplexityRank::from_complexity(6), ComplexityRank::Moderate);
        assert_eq!(ComplexityRank::from_complexity(10), ComplexityRank::Moderate);
        assert_eq!(ComplexityRank::from_complexity(11), ComplexityRank::High);
        assert_eq!(ComplexityRank::from_complexity(20), ComplexityRank::High);
        assert_eq!(ComplexityRank::from_complexity(21), ComplexityRank::VeryHigh);
        assert_eq!(ComplexityRank::from_complexity(21).letter(), 'D');
    }

    #[test]
    fn complexity_score_is_clamped() {
        assert_eq!(complexity_score(0.0, 0), 100.0);
        assert_eq!(complexity_score(2.0, 3), 90.0);
        assert_eq!(complexity_score(40.0, 1), 0.0);
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn clamp_handles_nan() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(100.004), 100.0);
        assert_eq!(round2(33.3333), 33.33);
    }
}
