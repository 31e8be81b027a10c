//! Kubernetes access: kubeconfig resolution, pod listing and Flux resources.
//!
//! Flux objects are read as [`DynamicObject`]s so the crate does not need the
//! Flux CRD types, only their group/version/kind.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Client, Config};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CheckError;

/// Placeholder used when the current context cannot be resolved.
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Get the default kubeconfig path (~/.kube/config).
#[must_use]
pub fn default_kubeconfig_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".kube").join("config"))
}

/// Pick the kubeconfig path from an explicit path, a `KUBECONFIG` value, or
/// the default location. A `KUBECONFIG` list contributes its first entry.
#[must_use]
pub fn resolve_kubeconfig_path(explicit: Option<&Path>, env: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    env.and_then(|value| std::env::split_paths(value).find(|p| !p.as_os_str().is_empty()))
        .or_else(default_kubeconfig_path)
}

/// Read the current context name from a kubeconfig file.
pub fn current_context(path: &Path) -> Result<String, CheckError> {
    let kubeconfig = Kubeconfig::read_from(path)
        .map_err(|e| CheckError::Kubeconfig(format!("{}: {e}", path.display())))?;

    kubeconfig
        .current_context
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            CheckError::Kubeconfig(format!("{}: no current-context set", path.display()))
        })
}

/// Observed state of one pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodState {
    pub namespace: String,
    pub name: String,
    /// Pod phase as reported by the API server (`Running`, `Pending`, ...).
    pub phase: String,
}

/// The Flux resource kinds that carry a Ready condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    HelmRelease,
    Kustomization,
}

impl ResourceKind {
    /// API resource definition for listing this kind.
    #[must_use]
    pub fn api_resource(self) -> ApiResource {
        match self {
            Self::HelmRelease => ApiResource {
                group: "helm.toolkit.fluxcd.io".to_string(),
                version: "v2".to_string(),
                api_version: "helm.toolkit.fluxcd.io/v2".to_string(),
                kind: "HelmRelease".to_string(),
                plural: "helmreleases".to_string(),
            },
            Self::Kustomization => ApiResource {
                group: "kustomize.toolkit.fluxcd.io".to_string(),
                version: "v1".to_string(),
                api_version: "kustomize.toolkit.fluxcd.io/v1".to_string(),
                kind: "Kustomization".to_string(),
                plural: "kustomizations".to_string(),
            },
        }
    }

    /// Status field holding the revision shown next to a ready resource.
    fn revision_field(self) -> &'static str {
        match self {
            Self::HelmRelease => "lastAttemptedRevision",
            Self::Kustomization => "lastAppliedRevision",
        }
    }

    /// Display name, plural.
    #[must_use]
    pub fn plural_label(self) -> &'static str {
        match self {
            Self::HelmRelease => "HelmReleases",
            Self::Kustomization => "Kustomizations",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HelmRelease => write!(f, "HelmRelease"),
            Self::Kustomization => write!(f, "Kustomization"),
        }
    }
}

/// Readiness derived from a resource's `Ready` condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Readiness {
    Ready,
    NotReady,
    /// No recognizable Ready condition. Counts as not ready.
    Unknown,
}

/// Observed state of one reconciled resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledResource {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
    pub readiness: Readiness,
    /// Ready condition message, or the reason readiness is unknown.
    pub message: String,
    pub revision: String,
}

impl ReconciledResource {
    /// Build from a dynamic object's `status` block.
    #[must_use]
    pub fn from_dynamic(kind: ResourceKind, obj: &DynamicObject) -> Self {
        let status = obj.data.get("status");
        let (readiness, message) = ready_condition(status);

        let revision = status
            .and_then(|s| s.get(kind.revision_field()))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            kind,
            namespace: obj.metadata.namespace.clone().unwrap_or_default(),
            name: obj
                .metadata
                .name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            readiness,
            message,
            revision,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }
}

/// Interpret `status.conditions`.
fn ready_condition(status: Option<&Value>) -> (Readiness, String) {
    let conditions = status
        .and_then(|s| s.get("conditions"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if conditions.is_empty() {
        return (Readiness::Unknown, "No conditions set".to_string());
    }

    let ready = conditions
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some("Ready"));

    match ready {
        Some(condition) => {
            let message = condition
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if condition.get("status").and_then(Value::as_str) == Some("True") {
                (Readiness::Ready, message)
            } else {
                (Readiness::NotReady, message)
            }
        }
        None => (Readiness::Unknown, "No Ready condition".to_string()),
    }
}

/// Read-only access to workload and GitOps state.
///
/// An empty namespace means all namespaces.
#[async_trait]
pub trait ClusterProbe: Send + Sync {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodState>, CheckError>;

    /// HelmReleases first, then Kustomizations.
    async fn list_reconciled_resources(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReconciledResource>, CheckError>;
}

/// [`ClusterProbe`] backed by the Kubernetes API.
///
/// Every list call is bounded by the probe timeout; expiry is reported as
/// [`CheckError::Timeout`].
pub struct KubeProbe {
    client: Client,
    timeout: Duration,
}

impl KubeProbe {
    /// Create a probe from a kubeconfig file path.
    pub async fn from_kubeconfig(path: &Path, timeout_secs: u64) -> Result<Self, CheckError> {
        debug!(kubeconfig = %path.display(), "Loading kubeconfig");

        let kubeconfig = Kubeconfig::read_from(path)
            .map_err(|e| CheckError::Kubeconfig(format!("{}: {e}", path.display())))?;

        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| CheckError::Kubeconfig(e.to_string()))?;

        let timeout = Duration::from_secs(timeout_secs);
        config.connect_timeout = Some(timeout);

        debug!(api_server = %config.cluster_url, "Kubernetes API server");

        let client = Client::try_from(config)
            .map_err(|e| CheckError::kube("failed to create client", e))?;

        Ok(Self { client, timeout })
    }

    /// Run one API call under the probe timeout.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, kube::Error>>,
    ) -> Result<T, CheckError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| CheckError::kube(operation, e)),
            Err(_) => {
                warn!(
                    operation,
                    timeout_secs = self.timeout.as_secs(),
                    "Kubernetes API call timed out"
                );
                Err(CheckError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    async fn list_kind(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<ReconciledResource>, CheckError> {
        let api_resource = kind.api_resource();
        let api: Api<DynamicObject> = if namespace.is_empty() {
            Api::all_with(self.client.clone(), &api_resource)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &api_resource)
        };

        debug!(kind = %kind, namespace = %scope(namespace), "Listing resources");

        let operation = format!("failed to list {}", kind.plural_label());
        let list = self
            .bounded(&operation, api.list(&ListParams::default()))
            .await?;

        debug!(kind = %kind, found = list.items.len(), "Listed resources");

        Ok(list
            .items
            .iter()
            .map(|obj| ReconciledResource::from_dynamic(kind, obj))
            .collect())
    }
}

#[async_trait]
impl ClusterProbe for KubeProbe {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodState>, CheckError> {
        let api: Api<Pod> = if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        };

        debug!(namespace = %scope(namespace), "Listing pods");

        let list = self
            .bounded("failed to list pods", api.list(&ListParams::default()))
            .await?;

        debug!(total = list.items.len(), "Listed pods");

        Ok(list
            .items
            .into_iter()
            .map(|pod| PodState {
                namespace: pod.metadata.namespace.unwrap_or_default(),
                name: pod.metadata.name.unwrap_or_default(),
                phase: pod
                    .status
                    .and_then(|s| s.phase)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    async fn list_reconciled_resources(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReconciledResource>, CheckError> {
        let mut resources = self.list_kind(ResourceKind::HelmRelease, namespace).await?;
        resources.extend(self.list_kind(ResourceKind::Kustomization, namespace).await?);
        Ok(resources)
    }
}

/// Stands in for a probe whose client could not be built. Every listing
/// fails with the construction error, so each category is recorded as failed
/// instead of aborting the run.
#[derive(Debug, Clone)]
pub struct UnavailableProbe {
    reason: String,
}

impl UnavailableProbe {
    pub fn new(err: &CheckError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl ClusterProbe for UnavailableProbe {
    async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodState>, CheckError> {
        Err(CheckError::Unavailable(self.reason.clone()))
    }

    async fn list_reconciled_resources(
        &self,
        _namespace: &str,
    ) -> Result<Vec<ReconciledResource>, CheckError> {
        Err(CheckError::Unavailable(self.reason.clone()))
    }
}

/// Connect to the cluster, falling back to an [`UnavailableProbe`].
pub async fn connect(kubeconfig: Option<&Path>, timeout_secs: u64) -> Box<dyn ClusterProbe> {
    let result = match kubeconfig {
        Some(path) => KubeProbe::from_kubeconfig(path, timeout_secs).await,
        None => Err(CheckError::Kubeconfig(
            "no kubeconfig path available".to_string(),
        )),
    };

    match result {
        Ok(probe) => Box::new(probe),
        Err(e) => {
            warn!(error = %e, "Failed to create Kubernetes client");
            Box::new(UnavailableProbe::new(&e))
        }
    }
}

fn scope(namespace: &str) -> &str {
    if namespace.is_empty() {
        "all namespaces"
    } else {
        namespace
    }
}
