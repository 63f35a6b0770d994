//! Health blend weights used when scoring files and modules.

use serde::{Deserialize, Serialize};

pub fn default_complexity_weight() -> f64 {
    0.35
}

pub fn default_documentation_weight() -> f64 {
    0.25
}

pub fn default_dependency_weight() -> f64 {
    0.20
}

pub fn default_redundancy_weight() -> f64 {
    0.20
}

/// Weights of each pass in a file's health score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthWeights {
    /// Weight for the complexity pass (0.0-1.0)
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,

    /// Weight for the documentation pass (0.0-1.0)
    #[serde(default = "default_documentation_weight")]
    pub documentation: f64,

    /// Weight for the dependency pass (0.0-1.0)
    #[serde(default = "default_dependency_weight")]
    pub dependency: f64,

    /// Weight for the redundancy pass (0.0-1.0)
    #[serde(default = "default_redundancy_weight")]
    pub redundancy: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            complexity: default_complexity_weight(),
            documentation: default_documentation_weight(),
            dependency: default_dependency_weight(),
            redundancy: default_redundancy_weight(),
        }
    }
}

impl HealthWeights {
    // Pure function: Check if a weight is in valid range
    pub fn is_valid_weight(weight: f64) -> bool {
        (0.0..=1.0).contains(&weight)
    }

    // Pure function: Validate a single weight with name
    pub fn validate_weight(weight: f64, name: &str) -> Result<(), String> {
        if Self::is_valid_weight(weight) {
            Ok(())
        } else {
            Err(format!("{} weight must be between 0.0 and 1.0", name))
        }
    }

    fn sum(&self) -> f64 {
        self.complexity + self.documentation + self.dependency + self.redundancy
    }

    /// Validate individual weights and that at least one is positive
    pub fn validate(&self) -> Result<(), String> {
        Self::validate_weight(self.complexity, "Complexity")?;
        Self::validate_weight(self.documentation, "Documentation")?;
        Self::validate_weight(self.dependency, "Dependency")?;
        Self::validate_weight(self.redundancy, "Redundancy")?;

        if self.sum() <= 0.0 {
            return Err("At least one health weight must be positive".to_string());
        }
        Ok(())
    }

    /// Normalize weights to ensure they sum to 1.0
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 && (sum - 1.0).abs() > 0.001 {
            self.complexity /= sum;
            self.documentation /= sum;
            self.dependency /= sum;
            self.redundancy /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let weights = HealthWeights::default();
        assert!(weights.validate().is_ok());
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_rescales() {
        let mut weights = HealthWeights {
            complexity: 1.0,
            documentation: 1.0,
            dependency: 1.0,
            redundancy: 1.0,
        };
        weights.normalize();
        assert!((weights.complexity - 0.25).abs() < 1e-9);
    }

    #[test]
    fn rejects_out_of_range_and_all_zero() {
        let mut weights = HealthWeights::default();
        weights.dependency = 1.5;
        assert!(weights.validate().is_err());

        let zero = HealthWeights {
            complexity: 0.0,
            documentation: 0.0,
            dependency: 0.0,
            redundancy: 0.0,
        };
        assert!(zero.validate().is_err());
    }
}
