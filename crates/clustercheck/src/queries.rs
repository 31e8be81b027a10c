//! The static battery of Prometheus health queries.
//!
//! Every query is expected to evaluate to `1` for a healthy cluster, except
//! the error-count checks which are tagged [`CheckPolarity::Inverted`].

use serde::Serialize;

use crate::check::CheckPolarity;

/// The cluster a run is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterTarget {
    /// Bare kube context name, used for the tenant-cluster label.
    pub short: String,
    /// Context name qualified with the FQDN suffix, or the `CLUSTER` override.
    pub qualified: String,
}

impl ClusterTarget {
    /// Build a target from a context name and optional FQDN suffix.
    #[must_use]
    pub fn new(context: &str, fqdn: Option<&str>) -> Self {
        let qualified = match fqdn {
            Some(suffix) if !suffix.is_empty() => format!("{context}.{suffix}"),
            _ => context.to_string(),
        };

        Self {
            short: context.to_string(),
            qualified,
        }
    }

    /// Replace the qualified name, keeping the short name.
    #[must_use]
    pub fn with_override(mut self, cluster: Option<&str>) -> Self {
        if let Some(cluster) = cluster.filter(|c| !c.is_empty()) {
            self.qualified = cluster.to_string();
        }
        self
    }
}

/// A named query against the metrics backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricQuerySpec {
    /// Check name shown in reports.
    pub description: String,
    /// PromQL expression, already parameterized with the cluster label.
    pub expression: String,
    /// How the scalar result maps onto pass/fail.
    pub polarity: CheckPolarity,
}

impl MetricQuerySpec {
    fn new(description: &str, expression: String, polarity: CheckPolarity) -> Self {
        Self {
            description: description.to_string(),
            expression,
            polarity,
        }
    }
}

/// Build the query table for a cluster, in report order.
#[must_use]
pub fn cluster_queries(target: &ClusterTarget) -> Vec<MetricQuerySpec> {
    use CheckPolarity::{Inverted, Normal};

    let cluster = &target.qualified;
    let short = &target.short;

    vec![
        MetricQuerySpec::new(
            "APISERVER",
            format!(r#"avg(up{{job="kube-apiserver",cluster="{cluster}"}})"#),
            Normal,
        ),
        MetricQuerySpec::new(
            "CLUSTER",
            format!(
                r#"capi_cluster_status_phase{{phase="Provisioned", tenantcluster="{short}"}} == 1"#
            ),
            Normal,
        ),
        MetricQuerySpec::new(
            "FLUENTBITERRORS",
            format!(
                r#"clamp((sum(rate(fluentbit_output_errors_total{{cluster="{cluster}"}}[1h])) > 0),1,1)"#
            ),
            Inverted,
        ),
        MetricQuerySpec::new(
            "FLUENTDERRORS",
            format!(
                r#"clamp((avg(fluentd_output_status_num_errors{{cluster="{cluster}"}}) > 0),1,1)"#
            ),
            Inverted,
        ),
        MetricQuerySpec::new(
            "GOLDPINGER",
            format!(r#"avg(goldpinger_cluster_health_total{{cluster="{cluster}"}})"#),
            Normal,
        ),
        MetricQuerySpec::new(
            "KUBEDNS",
            format!(r#"avg(up{{job="kube-dns", cluster="{cluster}"}})"#),
            Normal,
        ),
        MetricQuerySpec::new(
            "KUBELET",
            format!(r#"clamp((count(up{{job="kubelet", cluster="{cluster}"}}) > 3),1,1)"#),
            Normal,
        ),
        MetricQuerySpec::new(
            "NETWORKOPERATOR",
            format!(
                r#"clamp(avg(nwop_netlink_routes_fib{{protocol="bgp",vrf="main",cluster="{cluster}"}}),1,1)"#
            ),
            Normal,
        ),
        MetricQuerySpec::new(
            "NODE",
            format!(
                r#"min(kube_node_status_condition{{condition="Ready",status="true",cluster="{cluster}"}})"#
            ),
            Normal,
        ),
        MetricQuerySpec::new(
            "STORAGECHECK",
            // Any failure pins the result to 0, even alongside recent successes.
            format!(
                r#"(clamp((increase(storage_check_success_total{{cluster="{cluster}"}}[1h]) > 1),1,1) unless on(cluster) (storage_check_failure_total{{cluster="{cluster}"}} > 0)) or on(cluster) clamp((storage_check_failure_total{{cluster="{cluster}"}} > 0),0,0)"#
            ),
            Normal,
        ),
        MetricQuerySpec::new(
            "PROMETHEUSAGENT",
            format!(r#"avg(up{{job="prometheus-agent",cluster="{cluster}"}})"#),
            Normal,
        ),
        MetricQuerySpec::new(
            "SYSTEMPODS",
            format!(
                r#"clamp(sum(kube_pod_status_phase{{namespace=~".*-system", phase!~"Running|Succeeded",cluster="{cluster}"}} == 0),1,1)"#
            ),
            Normal,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_target_fqdn() {
        let target = ClusterTarget::new("prod-1", Some("example.com"));
        assert_eq!(target.short, "prod-1");
        assert_eq!(target.qualified, "prod-1.example.com");

        let bare = ClusterTarget::new("prod-1", Some(""));
        assert_eq!(bare.qualified, "prod-1");
    }

    #[test]
    fn test_cluster_override_keeps_short_name() {
        let target = ClusterTarget::new("prod-1", Some("example.com")).with_override(Some("other"));
        assert_eq!(target.short, "prod-1");
        assert_eq!(target.qualified, "other");

        let untouched = ClusterTarget::new("prod-1", None).with_override(Some(""));
        assert_eq!(untouched.qualified, "prod-1");
    }

    #[test]
    fn test_query_table_order_and_polarity() {
        let queries = cluster_queries(&ClusterTarget::new("c1", None));
        let names: Vec<_> = queries.iter().map(|q| q.description.as_str()).collect();
        assert_eq!(
            names,
            [
                "APISERVER",
                "CLUSTER",
                "FLUENTBITERRORS",
                "FLUENTDERRORS",
                "GOLDPINGER",
                "KUBEDNS",
                "KUBELET",
                "NETWORKOPERATOR",
                "NODE",
                "STORAGECHECK",
                "PROMETHEUSAGENT",
                "SYSTEMPODS",
            ]
        );

        // The explicit tags agree with the name prefix rule.
        for query in &queries {
            assert_eq!(
                query.polarity,
                CheckPolarity::for_name(&query.description),
                "{}",
                query.description
            );
        }
    }

    #[test]
    fn test_queries_are_parameterized() {
        let target = ClusterTarget::new("c1", Some("example.com"));
        let queries = cluster_queries(&target);

        let apiserver = &queries[0];
        assert_eq!(
            apiserver.expression,
            r#"avg(up{job="kube-apiserver",cluster="c1.example.com"})"#
        );

        let provisioned = &queries[1];
        assert!(provisioned.expression.contains(r#"tenantcluster="c1""#));

        for query in &queries[2..] {
            assert!(
                query.expression.contains(r#"cluster="c1.example.com""#),
                "{}",
                query.description
            );
        }
    }

    #[test]
    fn test_storage_failures_never_report_one() {
        let queries = cluster_queries(&ClusterTarget::new("c1", None));
        let storage = queries
            .iter()
            .find(|q| q.description == "STORAGECHECK")
            .unwrap();

        // Successes are dropped when failures exist, and the failure branch
        // is clamped to 0 so a single failure cannot read as "1".
        assert!(storage.expression.contains(
            r#"unless on(cluster) (storage_check_failure_total{cluster="c1"} > 0)"#
        ));
        assert!(storage
            .expression
            .ends_with(r#"clamp((storage_check_failure_total{cluster="c1"} > 0),0,0)"#));
        assert!(!storage.expression.contains("OR (storage_check_failure_total"));
    }
}
