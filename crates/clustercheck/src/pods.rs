//! Pod health category: every pod must be Running or Succeeded.

use serde::Serialize;

use crate::check::CheckOutcome;
use crate::cluster::PodState;

/// Check name recorded in gate reports.
pub const POD_HEALTH: &str = "Pod Health";

const HEALTHY_PHASES: &[&str] = &["Running", "Succeeded"];

/// Whether a pod phase counts as healthy.
#[must_use]
pub fn is_healthy_phase(phase: &str) -> bool {
    HEALTHY_PHASES.contains(&phase)
}

/// Evaluation of a pod listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PodReport {
    pub pods: Vec<PodState>,
    pub healthy: usize,
    /// `namespace/name (phase)` of every unhealthy pod.
    pub failed: Vec<String>,
}

impl PodReport {
    #[must_use]
    pub fn evaluate(pods: Vec<PodState>) -> Self {
        let mut report = Self::default();

        for pod in &pods {
            if is_healthy_phase(&pod.phase) {
                report.healthy += 1;
            } else {
                report
                    .failed
                    .push(format!("{}/{} ({})", pod.namespace, pod.name, pod.phase));
            }
        }

        report.pods = pods;
        report
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.pods.len()
    }

    #[must_use]
    pub fn all_healthy(&self) -> bool {
        self.failed.is_empty()
    }

    /// Summary line, e.g. `12/14 pods in Running or Succeeded state`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}/{} pods in Running or Succeeded state",
            self.healthy,
            self.total()
        )
    }

    /// Error text used when some pods are unhealthy.
    #[must_use]
    pub fn failure_message(&self) -> String {
        format!(
            "{} pods not in Running or Succeeded state",
            self.failed.len()
        )
    }

    /// Collapse into the single gate check.
    #[must_use]
    pub fn outcome(&self) -> CheckOutcome {
        if self.all_healthy() {
            CheckOutcome::pass(POD_HEALTH, "All pods are in Running or Succeeded state")
        } else {
            CheckOutcome::fail(POD_HEALTH, self.failure_message())
        }
    }
}
