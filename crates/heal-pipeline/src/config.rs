//! Pipeline thresholds and budget configuration

use std::time::Duration;

use healer_core_types::HealerError;

/// Tunable thresholds and budgets for the healing pipeline.
#[derive(Debug, Clone)]
pub struct HealConfig {
    /// Minimum score a candidate must reach to be returned at all.
    pub min_similarity: f64,
    /// Score at which the same-kind strategy accepts immediately and skips
    /// the remaining strategies.
    pub high_confidence: f64,
    /// Wall-clock budget for one healing attempt.
    pub max_elapsed: Duration,
    /// Node-processing budget for one healing attempt.
    pub max_nodes: usize,
    /// Minimum remaining time required to start the context strategy.
    pub context_margin: Duration,
    /// When set, a high-confidence hit from any strategy short-circuits the
    /// rest, not just one from the same-kind strategy.
    pub early_exit_all_strategies: bool,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.6,
            high_confidence: 0.85,
            max_elapsed: Duration::from_secs(45),
            max_nodes: 1000,
            context_margin: Duration::from_secs(5),
            early_exit_all_strategies: false,
        }
    }
}

impl HealConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), HealerError> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(HealerError::InvalidConfig(format!(
                "min_similarity must be within [0, 1], got {}",
                self.min_similarity
            )));
        }
        if !(self.min_similarity..=1.0).contains(&self.high_confidence) {
            return Err(HealerError::InvalidConfig(format!(
                "high_confidence must be within [min_similarity, 1], got {}",
                self.high_confidence
            )));
        }
        if self.max_nodes == 0 {
            return Err(HealerError::InvalidConfig(
                "max_nodes must be positive".to_string(),
            ));
        }
        if self.max_elapsed.is_zero() {
            return Err(HealerError::InvalidConfig(
                "max_elapsed must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HealConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_thresholds_rejected() {
        let mut config = HealConfig::default();
        config.min_similarity = 1.2;
        assert!(config.validate().is_err());

        let mut config = HealConfig::default();
        config.high_confidence = 0.5; // below min_similarity
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_budgets_rejected() {
        let mut config = HealConfig::default();
        config.max_nodes = 0;
        assert!(config.validate().is_err());

        let mut config = HealConfig::default();
        config.max_elapsed = Duration::ZERO;
        assert!(config.validate().is_err());
    }
}
