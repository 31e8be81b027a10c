use anyhow::{bail, Context, Result};
use clap::Args;

use clustercheck::cluster::{ClusterProbe, KubeProbe};
use clustercheck::config::CheckConfig;
use clustercheck::flux::FluxReport;
use clustercheck::ui;

/// Check Flux HelmReleases and Kustomizations
#[derive(Args)]
pub struct FluxCommand {}

impl FluxCommand {
    pub async fn run(&self, config: &CheckConfig) -> Result<()> {
        ui::print_header("fluxcheck", &config.context);

        let kubeconfig = config
            .kubeconfig
            .as_deref()
            .context("could not locate a kubeconfig")?;
        let probe = KubeProbe::from_kubeconfig(kubeconfig, config.timeout_secs).await?;

        let resources = probe.list_reconciled_resources(&config.namespace).await?;
        let report = FluxReport::evaluate(resources);
        ui::print_flux_report(&report);

        if !report.all_ready() {
            bail!(report.failure_message());
        }
        Ok(())
    }
}
