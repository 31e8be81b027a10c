//! Metric-query category: run the query table against Prometheus.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::check::CheckOutcome;
use crate::credentials::Credentials;
use crate::prometheus::MetricSource;
use crate::queries::MetricQuerySpec;

/// Check name recorded when credentials cannot be resolved.
pub const PROMETHEUS_AUTH: &str = "Prometheus Authentication";

/// Run one query and classify its result. Errors become failed outcomes.
pub async fn run_query(
    source: &dyn MetricSource,
    query: &MetricQuerySpec,
    credentials: &Credentials,
) -> CheckOutcome {
    match source.query_scalar(&query.expression, credentials).await {
        Ok(raw) => {
            debug!(check = %query.description, value = %raw, "Query result");
            CheckOutcome::from_metric(&query.description, query.polarity, raw)
        }
        Err(e) => {
            warn!(check = %query.description, error = %e, "Query failed");
            CheckOutcome::fail(&query.description, format!("Query error: {e}"))
        }
    }
}

/// Run every query concurrently. Outcomes come back in table order.
pub async fn run_queries(
    source: &dyn MetricSource,
    queries: &[MetricQuerySpec],
    credentials: &Credentials,
) -> Vec<CheckOutcome> {
    join_all(
        queries
            .iter()
            .map(|query| run_query(source, query, credentials)),
    )
    .await
}

/// Whether an outcome came from a query that errored rather than returned a value.
#[must_use]
pub fn is_query_error(outcome: &CheckOutcome) -> bool {
    !outcome.passed && outcome.raw_value.is_none()
}
