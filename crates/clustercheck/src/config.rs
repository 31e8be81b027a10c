//! Run configuration.
//!
//! Flags and environment variables are read once at startup into a
//! [`CheckConfig`]; nothing below this module looks at the process
//! environment. Environment values override flags, and an empty value
//! counts as unset.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::cluster::{self, UNKNOWN_CONTEXT};
use crate::credentials::{
    BitwardenCredentials, CredentialSource, Credentials, StaticCredentials, DEFAULT_BITWARDEN_ITEM,
};
use crate::error::CheckError;
use crate::prometheus::{PrometheusConfig, DEFAULT_PROMETHEUS_URL, DEFAULT_TIMEOUT_SECS};
use crate::queries::ClusterTarget;

/// Metrics endpoint override.
pub const ENV_PROMETHEUS_URL: &str = "PROMETHEUS_URL";
/// Replaces the qualified cluster name used in query labels.
pub const ENV_CLUSTER: &str = "CLUSTER";
pub const ENV_PROM_USER: &str = "PROM_USER";
pub const ENV_PROM_PASS: &str = "PROM_PASS";
/// FQDN suffix appended to the context name.
pub const ENV_FQDN: &str = "CLUSTERCHECK_FQDN";
/// Any non-empty value enables the Bitwarden credential source.
pub const ENV_BITWARDEN: &str = "CLUSTERCHECK_BW";
pub const ENV_BW_SESSION: &str = "BW_SESSION";
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";

/// Read access to environment variables.
pub trait EnvSource {
    /// Value of `key`, `None` when unset or empty.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Options given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub namespace: Option<String>,
    pub fqdn: Option<String>,
    pub bitwarden: bool,
    pub kubeconfig: Option<PathBuf>,
    pub prometheus_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verify_tls: bool,
}

/// How Prometheus credentials are obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialMode {
    Environment(Credentials),
    Bitwarden {
        item: String,
        session: Option<String>,
    },
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckConfig {
    /// Current kube context, or `unknown`.
    pub context: String,
    pub cluster: ClusterTarget,
    /// Empty means all namespaces.
    pub namespace: String,
    pub kubeconfig: Option<PathBuf>,
    pub prometheus_url: String,
    pub timeout_secs: u64,
    pub insecure_tls: bool,
    #[serde(skip)]
    pub credentials: CredentialMode,
}

impl CheckConfig {
    /// Resolve flags and environment, reading the current context from the
    /// kubeconfig.
    pub fn resolve(options: &CheckOptions, env: &impl EnvSource) -> Self {
        let kubeconfig = cluster::resolve_kubeconfig_path(
            options.kubeconfig.as_deref(),
            env.var(ENV_KUBECONFIG).as_deref(),
        );

        let context = match &kubeconfig {
            Some(path) => cluster::current_context(path),
            None => Err(CheckError::Kubeconfig(
                "could not determine home directory".to_string(),
            )),
        };

        Self::resolve_with_context(options, env, kubeconfig, context)
    }

    /// Resolve with an already looked-up context. A failed lookup degrades
    /// to the `unknown` placeholder.
    pub fn resolve_with_context(
        options: &CheckOptions,
        env: &impl EnvSource,
        kubeconfig: Option<PathBuf>,
        context: Result<String, CheckError>,
    ) -> Self {
        let context = context.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to get current kube context");
            UNKNOWN_CONTEXT.to_string()
        });

        let fqdn = env.var(ENV_FQDN).or_else(|| options.fqdn.clone());
        let cluster = ClusterTarget::new(&context, fqdn.as_deref())
            .with_override(env.var(ENV_CLUSTER).as_deref());

        let prometheus_url = env
            .var(ENV_PROMETHEUS_URL)
            .or_else(|| options.prometheus_url.clone())
            .unwrap_or_else(|| DEFAULT_PROMETHEUS_URL.to_string());

        let credentials = if options.bitwarden || env.var(ENV_BITWARDEN).is_some() {
            CredentialMode::Bitwarden {
                item: DEFAULT_BITWARDEN_ITEM.to_string(),
                session: env.var(ENV_BW_SESSION),
            }
        } else {
            CredentialMode::Environment(Credentials {
                username: env.var(ENV_PROM_USER).unwrap_or_default(),
                password: env.var(ENV_PROM_PASS).unwrap_or_default(),
            })
        };

        Self {
            context,
            cluster,
            namespace: options.namespace.clone().unwrap_or_default(),
            kubeconfig,
            prometheus_url,
            timeout_secs: options.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            insecure_tls: !options.verify_tls,
            credentials,
        }
    }

    /// The credential source selected by this configuration.
    #[must_use]
    pub fn credential_source(&self) -> Box<dyn CredentialSource> {
        match &self.credentials {
            CredentialMode::Environment(creds) => Box::new(StaticCredentials(creds.clone())),
            CredentialMode::Bitwarden { item, session } => {
                Box::new(BitwardenCredentials::new(item.clone(), session.clone()))
            }
        }
    }

    /// Prometheus client settings.
    #[must_use]
    pub fn prometheus_config(&self) -> PrometheusConfig {
        PrometheusConfig {
            base_url: self.prometheus_url.clone(),
            timeout_secs: self.timeout_secs,
            insecure_tls: self.insecure_tls,
        }
    }

    /// Static credentials from the environment, when that mode is active.
    #[must_use]
    pub fn environment_credentials(&self) -> Option<&Credentials> {
        match &self.credentials {
            CredentialMode::Environment(creds) => Some(creds),
            CredentialMode::Bitwarden { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    impl EnvSource for HashMap<String, String> {
        fn var(&self, key: &str) -> Option<String> {
            self.get(key).filter(|v| !v.is_empty()).cloned()
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn resolve(options: &CheckOptions, vars: &[(&str, &str)]) -> CheckConfig {
        CheckConfig::resolve_with_context(options, &env(vars), None, Ok("prod-1".to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&CheckOptions::default(), &[]);
        assert_eq!(config.context, "prod-1");
        assert_eq!(config.cluster.qualified, "prod-1");
        assert_eq!(config.prometheus_url, "https://127.0.0.1:9090");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.insecure_tls);
        assert_eq!(config.namespace, "");
        assert_eq!(
            config.credentials,
            CredentialMode::Environment(Credentials::default())
        );
    }

    #[test]
    fn test_context_failure_uses_placeholder() {
        let config = CheckConfig::resolve_with_context(
            &CheckOptions::default(),
            &env(&[]),
            None,
            Err(CheckError::Kubeconfig("missing".to_string())),
        );
        assert_eq!(config.context, "unknown");
        assert_eq!(config.cluster.short, "unknown");
    }

    #[test]
    fn test_env_overrides_flags() {
        let options = CheckOptions {
            fqdn: Some("flag.example".to_string()),
            prometheus_url: Some("https://flag:9090".to_string()),
            ..CheckOptions::default()
        };
        let config = resolve(
            &options,
            &[
                (ENV_FQDN, "env.example"),
                (ENV_PROMETHEUS_URL, "https://env:9090"),
            ],
        );
        assert_eq!(config.cluster.qualified, "prod-1.env.example");
        assert_eq!(config.prometheus_url, "https://env:9090");

        let flag_only = resolve(&options, &[(ENV_FQDN, "")]);
        assert_eq!(flag_only.cluster.qualified, "prod-1.flag.example");
        assert_eq!(flag_only.prometheus_url, "https://flag:9090");
    }

    #[test]
    fn test_cluster_override() {
        let options = CheckOptions {
            fqdn: Some("example.com".to_string()),
            ..CheckOptions::default()
        };
        let config = resolve(&options, &[(ENV_CLUSTER, "edge-7")]);
        assert_eq!(config.cluster.qualified, "edge-7");
        assert_eq!(config.cluster.short, "prod-1");
    }

    #[test]
    fn test_credentials_from_env() {
        let config = resolve(
            &CheckOptions::default(),
            &[(ENV_PROM_USER, "agent"), (ENV_PROM_PASS, "s3cret")],
        );
        let creds = config.environment_credentials().unwrap();
        assert_eq!(creds.username, "agent");
        assert_eq!(creds.password, "s3cret");

        let prom = config.prometheus_config();
        assert_eq!(prom.base_url, "https://127.0.0.1:9090");
        assert!(prom.insecure_tls);
    }

    #[test]
    fn test_bitwarden_toggle() {
        let by_env = resolve(
            &CheckOptions::default(),
            &[(ENV_BITWARDEN, "1"), (ENV_BW_SESSION, "token")],
        );
        assert_eq!(
            by_env.credentials,
            CredentialMode::Bitwarden {
                item: DEFAULT_BITWARDEN_ITEM.to_string(),
                session: Some("token".to_string()),
            }
        );

        let by_flag = resolve(
            &CheckOptions {
                bitwarden: true,
                ..CheckOptions::default()
            },
            &[],
        );
        assert!(by_flag.environment_credentials().is_none());
    }

    #[test]
    fn test_verify_tls_flag() {
        let config = resolve(
            &CheckOptions {
                verify_tls: true,
                timeout_secs: Some(3),
                ..CheckOptions::default()
            },
            &[],
        );
        assert!(!config.insecure_tls);
        assert_eq!(config.timeout_secs, 3);
    }
}
