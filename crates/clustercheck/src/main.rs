//! Cluster health check CLI.
//!
//! Scores a cluster from pod phases, Flux resource readiness and a fixed set
//! of Prometheus queries, and exits non-zero when the gate fails.

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use clustercheck::config::{CheckConfig, CheckOptions, ProcessEnv};

mod commands;

use commands::flux::FluxCommand;
use commands::gate::GateCommand;
use commands::monitor::MonitorCommand;
use commands::pods::PodsCommand;

/// Cluster health gate for Kubernetes.
#[derive(Parser)]
#[command(
    name = "clustercheck",
    version,
    about = "Kubernetes cluster health check",
    long_about = "Check the health of a Kubernetes cluster.\n\n\
                  Without a subcommand, runs the Prometheus monitoring checks and\n\
                  prints one line per check. `gate` runs pod, Flux and Prometheus\n\
                  checks and exits non-zero when fewer than 80% of them pass."
)]
#[command(propagate_version = true)]
struct Cli {
    /// Restrict pod and Flux checks to one namespace (default: all).
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// FQDN appended to the cluster name, e.g. example.com.
    #[arg(short, long, global = true)]
    fqdn: Option<String>,

    /// Fetch Prometheus credentials from Bitwarden.
    #[arg(long, global = true)]
    bw: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Path to kubeconfig file.
    #[arg(long, global = true, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Prometheus base URL.
    #[arg(long, global = true, value_name = "URL")]
    prometheus_url: Option<String>,

    /// Prometheus request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verify the Prometheus TLS certificate.
    #[arg(long, global = true)]
    verify_tls: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Prometheus monitoring checks (default).
    Monitor(MonitorCommand),

    /// Check that every pod is Running or Succeeded.
    Pods(PodsCommand),

    /// Check that every HelmRelease and Kustomization is Ready.
    Flux(FluxCommand),

    /// Run all checks and apply the 80% quality gate.
    Gate(GateCommand),
}

impl Cli {
    fn options(&self) -> CheckOptions {
        CheckOptions {
            namespace: self.namespace.clone(),
            fqdn: self.fqdn.clone(),
            bitwarden: self.bw,
            kubeconfig: self.kubeconfig.clone(),
            prometheus_url: self.prometheus_url.clone(),
            timeout_secs: self.timeout,
            verify_tls: self.verify_tls,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("info,clustercheck=debug,kube=debug")
        } else {
            EnvFilter::new("warn,clustercheck=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = CheckConfig::resolve(&cli.options(), &ProcessEnv);
    debug!(
        context = %config.context,
        cluster = %config.cluster.qualified,
        prometheus = %config.prometheus_url,
        "Resolved configuration"
    );

    match &cli.command {
        None => MonitorCommand::default().run(&config).await,
        Some(Commands::Monitor(cmd)) => cmd.run(&config).await,
        Some(Commands::Pods(cmd)) => cmd.run(&config).await,
        Some(Commands::Flux(cmd)) => cmd.run(&config).await,
        Some(Commands::Gate(cmd)) => cmd.run(&config).await,
    }
}
