use anyhow::{Context, Result};
use clap::Args;

use clustercheck::config::CheckConfig;
use clustercheck::credentials::Credentials;
use clustercheck::monitoring::run_queries;
use clustercheck::prometheus::{MetricSource, PrometheusClient};
use clustercheck::{cluster_queries, ui, MetricQuerySpec};

/// Run the Prometheus monitoring checks
#[derive(Args, Default)]
pub struct MonitorCommand {}

impl MonitorCommand {
    pub async fn run(&self, config: &CheckConfig) -> Result<()> {
        ui::print_header("clustercheck", &config.cluster.qualified);

        let credentials = match config.credential_source().resolve().await {
            Ok(credentials) => credentials,
            Err(e) => {
                ui::print_warning(&e.to_string());
                config.environment_credentials().cloned().unwrap_or_default()
            }
        };

        let client = PrometheusClient::new(config.prometheus_config())
            .context("failed to create Prometheus client")?;

        report(&client, &cluster_queries(&config.cluster), &credentials).await
    }
}

/// Print one line per query. Failures are shown, never turned into an exit
/// code.
async fn report(
    source: &dyn MetricSource,
    queries: &[MetricQuerySpec],
    credentials: &Credentials,
) -> Result<()> {
    for outcome in run_queries(source, queries, credentials).await {
        println!("{}", ui::metric_line(&outcome));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clustercheck::{CheckError, ClusterTarget};

    /// Listed expressions report "0", everything else errors.
    struct BrokenBackend {
        answering: Vec<String>,
    }

    #[async_trait]
    impl MetricSource for BrokenBackend {
        async fn query_scalar(
            &self,
            expression: &str,
            _credentials: &Credentials,
        ) -> Result<String, CheckError> {
            if self.answering.iter().any(|e| e == expression) {
                Ok("0".to_string())
            } else {
                Err(CheckError::Timeout(10))
            }
        }
    }

    #[tokio::test]
    async fn test_report_succeeds_with_failing_and_erroring_queries() {
        let queries = cluster_queries(&ClusterTarget::new("prod-1", None));
        let source = BrokenBackend {
            answering: queries
                .iter()
                .take(6)
                .map(|q| q.expression.clone())
                .collect(),
        };

        let outcomes = run_queries(&source, &queries, &Credentials::default()).await;
        assert!(outcomes.iter().any(|o| !o.passed && o.raw_value.is_some()));
        assert!(outcomes.iter().any(|o| !o.passed && o.raw_value.is_none()));

        assert!(report(&source, &queries, &Credentials::default()).await.is_ok());
    }
}
