// Outcomes of equivalence checks
//
// A check either returns a report listing every grid point's passing
// outcome, or stops at the first point it cannot resolve:
// - StatisticalMismatch: p-value stayed <= alpha through every retry
// - MalformedDomain: the point or a sampler is unusable (never retried)

use crate::equivalence::config::EquivalenceConfig;
use crate::equivalence::statistics::SampleSummary;
use crate::grid::ParameterPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Goodness-of-fit test used for a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Two-sample Kolmogorov–Smirnov
    KolmogorovSmirnov,
    /// Chi-square over aligned frequency tables
    ChiSquare,
}

impl TestKind {
    pub fn label(&self) -> &'static str {
        match self {
            TestKind::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            TestKind::ChiSquare => "chi-square",
        }
    }
}

/// Errors that end an equivalence check
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquivalenceError {
    #[error(
        "statistical mismatch at {point}: p-value {pvalue:.3e} <= alpha {alpha} after {draws} draws"
    )]
    StatisticalMismatch {
        point: ParameterPoint,
        pvalue: f64,
        alpha: f64,
        draws: usize,
    },

    #[error("malformed domain at {point}: {reason}")]
    MalformedDomain {
        point: ParameterPoint,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EquivalenceError {
    /// Grid point that ended the check, if any
    pub fn point(&self) -> Option<&ParameterPoint> {
        match self {
            EquivalenceError::StatisticalMismatch { point, .. }
            | EquivalenceError::MalformedDomain { point, .. } => Some(point),
            EquivalenceError::InvalidConfig(_) => None,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, EquivalenceError::StatisticalMismatch { .. })
    }
}

/// Result for one grid point that passed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOutcome {
    pub point: ParameterPoint,

    /// Test statistic of the accepted draw
    pub statistic: f64,

    /// p-value of the accepted draw (> alpha)
    pub pvalue: f64,

    /// Draws needed, including the accepted one
    pub draws: usize,

    /// Accepted through the perfect-match shortcut (chi-square only)
    #[serde(default)]
    pub short_circuit: bool,

    /// Candidate samples of the accepted draw
    pub candidate: Option<SampleSummary>,
}

impl PointOutcome {
    pub fn retried(&self) -> bool {
        self.draws > 1
    }
}

/// Result of a successful equivalence check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalenceReport {
    /// Label of the checked sampler (family name or user supplied)
    pub name: String,

    pub test: TestKind,

    pub outcomes: Vec<PointOutcome>,

    pub config: EquivalenceConfig,
}

impl EquivalenceReport {
    pub fn total_draws(&self) -> usize {
        self.outcomes.iter().map(|o| o.draws).sum()
    }

    pub fn retried_points(&self) -> usize {
        self.outcomes.iter().filter(|o| o.retried()).count()
    }

    /// Smallest accepted p-value
    pub fn min_pvalue(&self) -> Option<f64> {
        self.outcomes
            .iter()
            .map(|o| o.pvalue)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "✅ {}: EQUIVALENT ({} test)\n\n",
            self.name,
            self.test.label()
        ));
        report.push_str(&format!("Grid points checked: {}\n", self.outcomes.len()));
        report.push_str(&format!(
            "Significance level: {} ({}% confidence)\n",
            self.config.alpha,
            (1.0 - self.config.alpha) * 100.0
        ));
        report.push_str(&format!(
            "Samples per draw: {}, retry budget: {}\n",
            self.config.size, self.config.fails
        ));
        report.push_str(&format!(
            "Total draws: {} ({} points retried)\n",
            self.total_draws(),
            self.retried_points()
        ));
        if let Some(p) = self.min_pvalue() {
            report.push_str(&format!("Smallest accepted p-value: {:.4}\n", p));
        }

        let retried: Vec<_> = self.outcomes.iter().filter(|o| o.retried()).collect();
        if !retried.is_empty() {
            report.push_str("\n🔁 Retried points:\n");
            for outcome in retried {
                report.push_str(&format!(
                    "  {} (draws={}, p={:.4})\n",
                    outcome.point, outcome.draws, outcome.pvalue
                ));
            }
        }

        report
    }
}

/// Human-readable failure report
pub fn failure_report_string(name: &str, error: &EquivalenceError) -> String {
    let mut report = String::new();
    match error {
        EquivalenceError::StatisticalMismatch {
            point,
            pvalue,
            alpha,
            draws,
        } => {
            report.push_str(&format!("❌ {}: MISMATCH\n\n", name));
            report.push_str(&format!("Parameter point: {}\n", point));
            report.push_str(&format!(
                "p-value {:.3e} <= alpha {} on all {} draws\n",
                pvalue, alpha, draws
            ));
        }
        EquivalenceError::MalformedDomain { point, reason } => {
            report.push_str(&format!("⚠️  {}: MALFORMED DOMAIN\n\n", name));
            report.push_str(&format!("Parameter point: {}\n", point));
            report.push_str(&format!("Reason: {}\n", reason));
        }
        EquivalenceError::InvalidConfig(reason) => {
            report.push_str(&format!("⚠️  {}: INVALID CONFIGURATION\n\n", name));
            report.push_str(&format!("Reason: {}\n", reason));
        }
    }
    report
}
