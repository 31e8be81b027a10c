//! Flux resource category: every HelmRelease and Kustomization must be Ready.

use serde::Serialize;

use crate::check::CheckOutcome;
use crate::cluster::{ReconciledResource, ResourceKind};

/// Check name recorded in gate reports.
pub const FLUX_RESOURCES: &str = "Flux Resources";

/// Evaluation of the reconciled resources in scope.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FluxReport {
    pub resources: Vec<ReconciledResource>,
    pub ready: usize,
    /// `Kind ns/name: message` of every resource that is not Ready.
    pub failed: Vec<String>,
}

impl FluxReport {
    #[must_use]
    pub fn evaluate(resources: Vec<ReconciledResource>) -> Self {
        let mut report = Self::default();

        for resource in &resources {
            if resource.is_ready() {
                report.ready += 1;
            } else {
                report.failed.push(format!(
                    "{} {}/{}: {}",
                    resource.kind, resource.namespace, resource.name, resource.message
                ));
            }
        }

        report.resources = resources;
        report
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn all_ready(&self) -> bool {
        self.failed.is_empty()
    }

    /// Resources of one kind, in listing order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ReconciledResource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}/{} resources Ready", self.ready, self.total())
    }

    #[must_use]
    pub fn failure_message(&self) -> String {
        format!("{} resources not Ready", self.failed.len())
    }

    /// Collapse into the single gate check. An empty listing passes.
    #[must_use]
    pub fn outcome(&self) -> CheckOutcome {
        if !self.all_ready() {
            CheckOutcome::fail(FLUX_RESOURCES, self.failure_message())
        } else if self.total() == 0 {
            CheckOutcome::pass(FLUX_RESOURCES, "No Flux resources found")
        } else {
            CheckOutcome::pass(
                FLUX_RESOURCES,
                "All HelmReleases and Kustomizations are Ready",
            )
        }
    }
}
