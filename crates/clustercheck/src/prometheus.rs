//! Prometheus client for the metric-query checks.
//!
//! Each check is a single instant query that reduces to one scalar. The
//! client makes exactly one attempt per query with a fixed timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::CheckError;

/// Scalar reported when a query matches no series.
pub const EMPTY_RESULT: &str = "0";

/// Default Prometheus endpoint (port-forwarded or local agent).
pub const DEFAULT_PROMETHEUS_URL: &str = "https://127.0.0.1:9090";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Something that can evaluate a PromQL expression to a scalar string.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Run one instant query and return the first sample's value.
    ///
    /// Returns [`EMPTY_RESULT`] when no series match.
    async fn query_scalar(
        &self,
        expression: &str,
        credentials: &Credentials,
    ) -> Result<String, CheckError>;
}

/// Configuration for the Prometheus client
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Base URL for the Prometheus API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Skip certificate validation
    pub insecure_tls: bool,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROMETHEUS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            insecure_tls: true,
        }
    }
}

/// Prometheus query response
#[derive(Debug, Deserialize)]
struct PrometheusResponse {
    status: String,
    #[serde(default)]
    data: Option<PrometheusData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrometheusData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryResult {
    Vector(Vec<PrometheusSample>),
    Scalar((f64, String)),
}

#[derive(Debug, Deserialize)]
struct PrometheusSample {
    #[serde(default)]
    #[allow(dead_code)]
    metric: HashMap<String, String>,
    value: (f64, String),
}

/// Prometheus client for querying metrics
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    config: PrometheusConfig,
    client: reqwest::Client,
}

impl PrometheusClient {
    /// Create a new Prometheus client with the given configuration.
    ///
    /// Proxy settings are taken from the standard `*_PROXY` environment
    /// variables by reqwest.
    pub fn new(config: PrometheusConfig) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure_tls)
            .build()?;

        Ok(Self { config, client })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn transport_error(&self, err: reqwest::Error) -> CheckError {
        if err.is_timeout() {
            CheckError::Timeout(self.config.timeout_secs)
        } else {
            CheckError::Transport(err)
        }
    }
}

#[async_trait]
impl MetricSource for PrometheusClient {
    async fn query_scalar(
        &self,
        expression: &str,
        credentials: &Credentials,
    ) -> Result<String, CheckError> {
        let url = format!(
            "{}/api/v1/query",
            self.config.base_url.trim_end_matches('/')
        );

        debug!(url = %url, query = %expression, "Executing Prometheus query");

        let response = self
            .client
            .get(&url)
            .query(&[("query", expression)])
            .basic_auth(&credentials.username, Some(&credentials.password))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        debug!(status = %status, bytes = body.len(), "Prometheus response");

        if !status.is_success() {
            return Err(CheckError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_scalar(&body)
    }
}

/// Extract the first scalar from a query response body.
fn parse_scalar(body: &str) -> Result<String, CheckError> {
    let response: PrometheusResponse = serde_json::from_str(body)?;

    if response.status != "success" {
        return Err(CheckError::Backend {
            status: response.status,
            message: response.error.unwrap_or_default(),
        });
    }

    let Some(data) = response.data else {
        return Ok(EMPTY_RESULT.to_string());
    };

    debug!(result_type = %data.result_type, "Decoded Prometheus result");

    let value = match data.result {
        QueryResult::Vector(samples) => samples.into_iter().next().map(|s| s.value.1),
        QueryResult::Scalar((_, value)) => Some(value),
    };

    Ok(value.unwrap_or_else(|| EMPTY_RESULT.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = PrometheusConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, "https://127.0.0.1:9090");
        assert!(config.insecure_tls);
    }

    #[test]
    fn test_client_creation() {
        let client = PrometheusClient::new(PrometheusConfig::default()).unwrap();
        assert!(!client.base_url().is_empty());
    }

    #[test]
    fn test_parse_vector_takes_first_sample() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"cluster":"a"},"value":[1700000000.1,"1"]},
            {"metric":{"cluster":"b"},"value":[1700000000.1,"0"]}]}}"#;
        assert_eq!(parse_scalar(body).unwrap(), "1");
    }

    #[test]
    fn test_parse_empty_vector_is_sentinel() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
        assert_eq!(parse_scalar(body).unwrap(), EMPTY_RESULT);
    }

    #[test]
    fn test_parse_scalar_result() {
        let body = r#"{"status":"success","data":{"resultType":"scalar","result":[1700000000,"0.5"]}}"#;
        assert_eq!(parse_scalar(body).unwrap(), "0.5");
    }

    #[test]
    fn test_parse_backend_error() {
        let body = r#"{"status":"error","errorType":"bad_data","error":"parse error"}"#;
        let err = parse_scalar(body).unwrap_err();
        assert!(matches!(err, CheckError::Backend { .. }));
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_scalar("<html>login</html>").unwrap_err();
        assert!(matches!(err, CheckError::Decode(_)));
    }
}
