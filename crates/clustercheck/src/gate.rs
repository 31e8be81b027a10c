//! Gate check orchestration.
//!
//! Runs the three check categories in a fixed order (pods, Flux resources,
//! Prometheus queries), records every outcome, then finalizes the score. A
//! failing category is recorded and the run continues; nothing here aborts.

use tracing::{info, warn};

use crate::aggregate::{GateCheckResult, ScoreAggregator};
use crate::check::CheckOutcome;
use crate::cluster::ClusterProbe;
use crate::credentials::CredentialSource;
use crate::error::CheckError;
use crate::flux::{FluxReport, FLUX_RESOURCES};
use crate::monitoring::{run_queries, PROMETHEUS_AUTH};
use crate::pods::{PodReport, POD_HEALTH};
use crate::prometheus::MetricSource;
use crate::queries::MetricQuerySpec;
use crate::ui;

const SECTIONS: u8 = 3;

/// One gate run against a cluster.
pub struct GateCheck<'a> {
    probe: &'a dyn ClusterProbe,
    metrics: &'a dyn MetricSource,
    credentials: &'a dyn CredentialSource,
    namespace: String,
    queries: Vec<MetricQuerySpec>,
    render: bool,
}

impl<'a> GateCheck<'a> {
    /// An empty `namespace` checks all namespaces.
    pub fn new(
        probe: &'a dyn ClusterProbe,
        metrics: &'a dyn MetricSource,
        credentials: &'a dyn CredentialSource,
        namespace: impl Into<String>,
        queries: Vec<MetricQuerySpec>,
    ) -> Self {
        Self {
            probe,
            metrics,
            credentials,
            namespace: namespace.into(),
            queries,
            render: false,
        }
    }

    /// Print section progress to stdout while running.
    #[must_use]
    pub fn with_output(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub async fn check_pods(&self) -> Result<PodReport, CheckError> {
        let pods = self.probe.list_pods(&self.namespace).await?;
        Ok(PodReport::evaluate(pods))
    }

    pub async fn check_flux(&self) -> Result<FluxReport, CheckError> {
        let resources = self.probe.list_reconciled_resources(&self.namespace).await?;
        Ok(FluxReport::evaluate(resources))
    }

    /// Resolve credentials and run every query. A credential failure yields
    /// a single failed check and no queries are sent.
    pub async fn check_metrics(&self) -> Vec<CheckOutcome> {
        match self.credentials.resolve().await {
            Ok(credentials) => run_queries(self.metrics, &self.queries, &credentials).await,
            Err(e) => {
                warn!(error = %e, "Skipping Prometheus queries");
                vec![CheckOutcome::fail(PROMETHEUS_AUTH, e.to_string())]
            }
        }
    }

    /// Run all categories and return the finalized result.
    pub async fn run(&self) -> GateCheckResult {
        let mut aggregator = ScoreAggregator::new();

        self.section(1, "Pod Health Check");
        let pods = match self.check_pods().await {
            Ok(report) => {
                if self.render {
                    ui::print_pod_report(&report);
                }
                report.outcome()
            }
            Err(e) => self.category_error(POD_HEALTH, &e),
        };
        aggregator.record(pods);

        self.section(2, "Flux Resources Check");
        let flux = match self.check_flux().await {
            Ok(report) => {
                if self.render {
                    ui::print_flux_report(&report);
                }
                report.outcome()
            }
            Err(e) => self.category_error(FLUX_RESOURCES, &e),
        };
        aggregator.record(flux);

        self.section(3, "Prometheus Monitoring Check");
        let metrics = self.check_metrics().await;
        if self.render {
            for outcome in &metrics {
                println!("{}", ui::gate_metric_line(outcome));
            }
            println!();
            if metrics.iter().all(|m| m.passed) {
                ui::print_success("All Prometheus checks passed");
            } else {
                ui::print_warning("Some Prometheus checks failed");
            }
            println!();
        }
        aggregator.record_all(metrics);

        let result = aggregator.finalize();
        info!(
            total = result.total_checks,
            passed = result.passed_checks,
            score = result.health_score,
            "Gate check complete"
        );
        result
    }

    fn section(&self, current: u8, title: &str) {
        if self.render {
            ui::print_section(current, SECTIONS, title);
        }
    }

    fn category_error(&self, name: &str, err: &CheckError) -> CheckOutcome {
        warn!(check = name, error = %err, "Check category failed");
        if self.render {
            ui::print_error(&err.to_string());
            println!();
        }
        CheckOutcome::fail(name, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::CheckPolarity;
    use crate::cluster::{PodState, ReconciledResource};
    use crate::credentials::{Credentials, StaticCredentials};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyCluster;

    #[async_trait]
    impl ClusterProbe for EmptyCluster {
        async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodState>, CheckError> {
            Ok(Vec::new())
        }

        async fn list_reconciled_resources(
            &self,
            _namespace: &str,
        ) -> Result<Vec<ReconciledResource>, CheckError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricSource for CountingSource {
        async fn query_scalar(
            &self,
            _expression: &str,
            _credentials: &Credentials,
        ) -> Result<String, CheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("1".to_string())
        }
    }

    struct FailingCredentials;

    #[async_trait]
    impl CredentialSource for FailingCredentials {
        async fn resolve(&self) -> Result<Credentials, CheckError> {
            Err(CheckError::Credentials(
                "Failed to get Bitwarden credentials: not logged in".to_string(),
            ))
        }
    }

    fn queries(n: usize) -> Vec<MetricQuerySpec> {
        (0..n)
            .map(|i| MetricQuerySpec {
                description: format!("Q{i}"),
                expression: format!("up{{job=\"{i}\"}}"),
                polarity: CheckPolarity::Normal,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_credential_failure_skips_queries() {
        let probe = EmptyCluster;
        let source = CountingSource::default();
        let gate = GateCheck::new(&probe, &source, &FailingCredentials, "", queries(12));

        let result = gate.run().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.total_checks, 3);
        let auth = &result.check_results[2];
        assert_eq!(auth.name, PROMETHEUS_AUTH);
        assert!(!auth.passed);
        assert!(auth.message.contains("not logged in"));
    }

    #[tokio::test]
    async fn test_categories_run_in_order() {
        let probe = EmptyCluster;
        let source = CountingSource::default();
        let creds = StaticCredentials(Credentials::default());
        let gate = GateCheck::new(&probe, &source, &creds, "kube-system", queries(2));

        let result = gate.run().await;

        let names: Vec<_> = result.check_results.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, [POD_HEALTH, FLUX_RESOURCES, "Q0", "Q1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(result.overall_passed);
    }
}
