// Configuration for statistical equivalence checks
//
// Retries exist only to absorb the false-rejection rate inherent to testing
// at significance level alpha. A systematic mismatch drives the p-value to
// ~0 on every draw, so a bounded retry budget never hides it.

use serde::{Deserialize, Serialize};

/// Configuration for an equivalence check
///
/// # Example
/// ```
/// use distcheck::equivalence::EquivalenceConfig;
///
/// let config = EquivalenceConfig::continuous();
/// assert_eq!(config.alpha, 0.05);
/// assert_eq!(config.size, 10_000);
/// assert_eq!(config.fails, 10);
///
/// let config = EquivalenceConfig::discrete();
/// assert_eq!(config.size, 100_000);
/// assert_eq!(config.fails, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceConfig {
    /// Significance level: a draw fails when its p-value is `<= alpha`
    pub alpha: f64,

    /// Samples drawn from each side per attempt
    pub size: usize,

    /// Retries allowed after a failing draw
    ///
    /// A point is given at most `fails + 1` draws, so when both samplers
    /// agree it passes with probability at least `1 - alpha^(fails + 1)`.
    pub fails: usize,

    /// Target number of grid points; larger products are sub-sampled
    pub points: usize,

    /// Seed for grid sub-sampling (entropy when absent)
    pub seed: Option<u64>,
}

impl Default for EquivalenceConfig {
    fn default() -> Self {
        Self::continuous()
    }
}

impl EquivalenceConfig {
    /// Defaults for the Kolmogorov–Smirnov path
    pub fn continuous() -> Self {
        Self {
            alpha: 0.05,
            size: 10_000,
            fails: 10,
            points: 100,
            seed: None,
        }
    }

    /// Defaults for the chi-square path
    ///
    /// Frequency comparisons are sensitive to low counts, hence the larger
    /// sample and retry budget.
    pub fn discrete() -> Self {
        Self {
            alpha: 0.05,
            size: 100_000,
            fails: 20,
            points: 100,
            seed: None,
        }
    }

    /// Stricter significance and fewer retries
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            fails: 5,
            ..Self::continuous()
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_fails(mut self, fails: usize) -> Self {
        self.fails = fails;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Lower bound on the pass probability of a point whose samplers agree
    pub fn pass_probability(&self) -> f64 {
        let draws = i32::try_from(self.fails)
            .unwrap_or(i32::MAX)
            .saturating_add(1);
        1.0 - self.alpha.powi(draws)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(format!("alpha must be in (0, 1), got {}", self.alpha));
        }

        if self.size == 0 {
            return Err("size must be at least 1".to_string());
        }

        if self.points == 0 {
            return Err("points must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Optional per-field overrides layered onto a base configuration
///
/// Suite entries and command-line flags are both expressed this way; unset
/// fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub alpha: Option<f64>,
    pub size: Option<usize>,
    pub fails: Option<usize>,
    pub points: Option<usize>,
    pub seed: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: EquivalenceConfig) -> EquivalenceConfig {
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(fails) = self.fails {
            config.fails = fails;
        }
        if let Some(points) = self.points {
            config.points = points;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_defaults() {
        let config = EquivalenceConfig::continuous();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.size, 10_000);
        assert_eq!(config.fails, 10);
        assert_eq!(config.points, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_discrete_defaults() {
        let config = EquivalenceConfig::discrete();
        assert_eq!(config.size, 100_000);
        assert_eq!(config.fails, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = EquivalenceConfig::strict();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.fails, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pass_probability_compounds_retries() {
        let config = EquivalenceConfig::continuous().with_fails(1);
        assert!((config.pass_probability() - (1.0 - 0.05 * 0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_pass_probability_with_huge_retry_budget() {
        let config = EquivalenceConfig::continuous().with_fails(usize::MAX);
        assert_eq!(config.pass_probability(), 1.0);

        let config = EquivalenceConfig::continuous().with_fails(i32::MAX as usize);
        assert_eq!(config.pass_probability(), 1.0);
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(EquivalenceConfig::continuous().with_alpha(0.0).validate().is_err());
        assert!(EquivalenceConfig::continuous().with_alpha(1.5).validate().is_err());
        assert!(EquivalenceConfig::continuous()
            .with_alpha(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_invalid_size_and_points() {
        assert!(EquivalenceConfig::continuous().with_size(0).validate().is_err());
        assert!(EquivalenceConfig::continuous().with_points(0).validate().is_err());
    }

    #[test]
    fn test_zero_fails_is_single_draw() {
        let config = EquivalenceConfig::continuous().with_fails(0);
        assert!(config.validate().is_ok());
        assert!((config.pass_probability() - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EquivalenceConfig = toml::from_str("size = 500\nseed = 3").unwrap();
        assert_eq!(config.size, 500);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.fails, 10);
    }

    #[test]
    fn test_overrides_keep_unset_fields() {
        let overrides = ConfigOverrides {
            size: Some(250),
            seed: Some(8),
            ..Default::default()
        };
        let config = overrides.apply(EquivalenceConfig::discrete());
        assert_eq!(config.size, 250);
        assert_eq!(config.seed, Some(8));
        assert_eq!(config.fails, 20);
        assert!(!overrides.is_empty());
        assert!(ConfigOverrides::default().is_empty());
    }
}
