//! Error types shared by the probes and the metrics client.

use thiserror::Error;

/// Errors that can occur while talking to a check dependency.
///
/// None of these abort a gate run: the orchestrator turns each one into a
/// failed [`CheckOutcome`](crate::check::CheckOutcome).
#[derive(Error, Debug)]
pub enum CheckError {
    /// HTTP request failed (connect, TLS, proxy, body read).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not finish within the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The backend answered with a non-success HTTP status.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Prometheus answered, but reported a failed query.
    #[error("Prometheus returned status '{status}': {message}")]
    Backend { status: String, message: String },

    /// Kubernetes API call failed.
    #[error("{operation}: {source}")]
    Kube {
        operation: String,
        #[source]
        source: kube::Error,
    },

    /// The kubeconfig could not be loaded or turned into a client config.
    #[error("failed to build config: {0}")]
    Kubeconfig(String),

    /// No Kubernetes client could be created for this run.
    #[error("cluster unavailable: {0}")]
    Unavailable(String),

    /// Credential lookup in the secret manager failed.
    #[error("{0}")]
    Credentials(String),
}

impl CheckError {
    /// Wrap a kube error with the operation that produced it.
    pub fn kube(operation: impl Into<String>, source: kube::Error) -> Self {
        Self::Kube {
            operation: operation.into(),
            source,
        }
    }
}
