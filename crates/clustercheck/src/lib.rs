//! Cluster health gate.
//!
//! Scores a Kubernetes cluster from three categories of checks: pod phases,
//! Flux HelmRelease/Kustomization readiness, and a fixed table of Prometheus
//! queries. The gate passes when at least 80% of the executed checks pass.
//!
//! # Example
//!
//! ```ignore
//! use clustercheck::{cluster, cluster_queries, CheckConfig, CheckOptions, GateCheck};
//! use clustercheck::config::ProcessEnv;
//! use clustercheck::prometheus::PrometheusClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CheckConfig::resolve(&CheckOptions::default(), &ProcessEnv);
//!     let probe = cluster::connect(config.kubeconfig.as_deref(), config.timeout_secs).await;
//!     let metrics = PrometheusClient::new(config.prometheus_config())?;
//!     let credentials = config.credential_source();
//!     let result = GateCheck::new(
//!         probe.as_ref(),
//!         &metrics,
//!         credentials.as_ref(),
//!         config.namespace.clone(),
//!         cluster_queries(&config.cluster),
//!     )
//!     .run()
//!     .await;
//!     println!("{:.1}%", result.health_score);
//!     Ok(())
//! }
//! ```

// Allow product names without backticks in doc comments
#![allow(clippy::doc_markdown)]

pub mod aggregate;
pub mod check;
pub mod cluster;
pub mod config;
pub mod credentials;
pub mod error;
pub mod flux;
pub mod gate;
pub mod monitoring;
pub mod pods;
pub mod prometheus;
pub mod queries;
pub mod ui;

// Re-export commonly used types at the crate root
pub use aggregate::{GateCheckResult, HealthBand, ScoreAggregator, PASS_THRESHOLD};
pub use check::{classify, CheckOutcome, CheckPolarity};
pub use config::{CheckConfig, CheckOptions};
pub use error::CheckError;
pub use gate::GateCheck;
pub use queries::{cluster_queries, ClusterTarget, MetricQuerySpec};
