use anyhow::{bail, Context, Result};
use clap::Args;

use clustercheck::cluster::{ClusterProbe, KubeProbe};
use clustercheck::config::CheckConfig;
use clustercheck::pods::PodReport;
use clustercheck::ui;

/// Check pod phases
#[derive(Args)]
pub struct PodsCommand {}

impl PodsCommand {
    pub async fn run(&self, config: &CheckConfig) -> Result<()> {
        ui::print_header("podcheck", &config.context);

        let kubeconfig = config
            .kubeconfig
            .as_deref()
            .context("could not locate a kubeconfig")?;
        let probe = KubeProbe::from_kubeconfig(kubeconfig, config.timeout_secs).await?;

        let pods = probe.list_pods(&config.namespace).await?;
        let report = PodReport::evaluate(pods);
        ui::print_pod_report(&report);

        if !report.all_healthy() {
            bail!(report.failure_message());
        }
        Ok(())
    }
}
