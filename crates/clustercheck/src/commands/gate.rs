//! Gate command - full cluster health check with a pass/fail decision.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tracing::info;

use clustercheck::aggregate::{GateCheckResult, HealthBand};
use clustercheck::cluster;
use clustercheck::config::CheckConfig;
use clustercheck::prometheus::PrometheusClient;
use clustercheck::{cluster_queries, ui, GateCheck};

/// Run all checks and apply the quality gate.
#[derive(Args)]
pub struct GateCommand {
    /// Output report as JSON after the summary.
    #[arg(long, default_value = "false")]
    json: bool,
}

/// Machine-readable gate report.
#[derive(Serialize)]
struct GateReport<'a> {
    context: &'a str,
    cluster: &'a str,
    timestamp: DateTime<Utc>,
    band: HealthBand,
    #[serde(flatten)]
    result: &'a GateCheckResult,
}

impl GateCommand {
    /// Run the gate check.
    ///
    /// # Errors
    ///
    /// Returns an error if the health score is below the pass threshold.
    pub async fn run(&self, config: &CheckConfig) -> Result<()> {
        info!(context = %config.context, "Starting cluster gate check");
        ui::print_banner(&config.context);

        let probe = cluster::connect(config.kubeconfig.as_deref(), config.timeout_secs).await;
        let metrics = PrometheusClient::new(config.prometheus_config())
            .context("failed to create Prometheus client")?;
        let credentials = config.credential_source();

        let result = GateCheck::new(
            probe.as_ref(),
            &metrics,
            credentials.as_ref(),
            config.namespace.clone(),
            cluster_queries(&config.cluster),
        )
        .with_output(true)
        .run()
        .await;

        ui::print_gate_summary(&result);

        if self.json {
            let report = GateReport {
                context: &config.context,
                cluster: &config.cluster.qualified,
                timestamp: Utc::now(),
                band: result.band(),
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        gate_outcome(&result)
    }
}

/// Exit decision: success iff the gate passed.
fn gate_outcome(result: &GateCheckResult) -> Result<()> {
    if result.overall_passed {
        Ok(())
    } else {
        bail!(
            "cluster health check failed with score {:.1}%",
            result.health_score
        );
    }
}
