//! Score aggregation and the pass/fail gate.
//!
//! The gate passes when at least [`PASS_THRESHOLD`] percent of the recorded
//! checks passed. [`HealthBand`] is a presentation label layered on top of
//! the score and never changes the decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::check::CheckOutcome;

/// Minimum health score for the gate to pass.
pub const PASS_THRESHOLD: f64 = 80.0;

/// Coarse label for a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthBand {
    /// 90 and above.
    Excellent,
    /// 80 up to 90.
    Good,
    /// 60 up to 80.
    Fair,
    /// Below 60.
    Poor,
}

impl HealthBand {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= PASS_THRESHOLD {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// What the band means for a go-live decision.
    #[must_use]
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Excellent => "Ready for production",
            Self::Good => "Acceptable for go-live",
            Self::Fair => "Review failures before go-live",
            Self::Poor => "Not ready for production",
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "EXCELLENT"),
            Self::Good => write!(f, "GOOD"),
            Self::Fair => write!(f, "FAIR"),
            Self::Poor => write!(f, "POOR"),
        }
    }
}

/// Finalized result of a gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCheckResult {
    pub total_checks: usize,
    pub passed_checks: usize,
    pub failed_checks: usize,
    /// Percentage of passed checks, 0 when nothing was recorded.
    pub health_score: f64,
    /// Outcomes in execution order.
    pub check_results: Vec<CheckOutcome>,
    pub overall_passed: bool,
}

impl GateCheckResult {
    #[must_use]
    pub fn band(&self) -> HealthBand {
        HealthBand::from_score(self.health_score)
    }

    /// Outcomes that failed, in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.check_results.iter().filter(|c| !c.passed)
    }
}

/// Running tally of check outcomes.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    passed: usize,
    failed: usize,
    outcomes: Vec<CheckOutcome>,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one executed check.
    pub fn record(&mut self, outcome: CheckOutcome) {
        if outcome.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Record several checks in order.
    pub fn record_all(&mut self, outcomes: impl IntoIterator<Item = CheckOutcome>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// Compute the score and gate decision from the current tally.
    #[must_use]
    pub fn finalize(&self) -> GateCheckResult {
        let total = self.total();
        let health_score = if total == 0 {
            0.0
        } else {
            self.passed as f64 * 100.0 / total as f64
        };

        GateCheckResult {
            total_checks: total,
            passed_checks: self.passed,
            failed_checks: self.failed,
            health_score,
            check_results: self.outcomes.clone(),
            overall_passed: health_score >= PASS_THRESHOLD,
        }
    }
}
