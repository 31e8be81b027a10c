//! Terminal rendering for check results.
//!
//! Line builders return strings so they can be tested with colors turned
//! off; the `print_*` helpers write to stdout.

use colored::Colorize;

use crate::aggregate::{GateCheckResult, HealthBand};
use crate::check::CheckOutcome;
use crate::cluster::{PodState, Readiness, ReconciledResource, ResourceKind};
use crate::flux::FluxReport;
use crate::monitoring::is_query_error;
use crate::pods::{is_healthy_phase, PodReport};

const RULE_WIDTH: usize = 50;

/// Print the `<tool> on <cluster>` header of a single-category run.
pub fn print_header(tool: &str, cluster: &str) {
    println!("{} on {}", tool.cyan(), cluster);
}

/// Print the gate check banner.
pub fn print_banner(context: &str) {
    println!("{}", format!("╔{}╗", "═".repeat(RULE_WIDTH)).cyan());
    println!("{}", format!("║         CLUSTER GATE CHECK - {context}").cyan());
    println!("{}", format!("╚{}╝", "═".repeat(RULE_WIDTH)).cyan());
    println!();
}

/// Print a numbered section header.
pub fn print_section(current: u8, total: u8, title: &str) {
    println!("{}", format!("[{current}/{total}] {title}").bold());
    println!("{}", "━".repeat(RULE_WIDTH).bright_black());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// One pod with its phase.
#[must_use]
pub fn pod_line(pod: &PodState) -> String {
    let name = format!("{}/{}", pod.namespace, pod.name);
    if is_healthy_phase(&pod.phase) {
        format!("{name} {}", format!("🟢 {}", pod.phase).green())
    } else {
        format!("{name} {}", format!("🔴 {}", pod.phase).red())
    }
}

/// Print every pod, the summary and the failed pods.
pub fn print_pod_report(report: &PodReport) {
    for pod in &report.pods {
        println!("{}", pod_line(pod));
    }

    println!();
    println!("Summary: {}", report.summary());

    if !report.all_healthy() {
        println!("{}", "Failed pods:".red());
        for pod in &report.failed {
            println!("  - {pod}");
        }
    }
}

/// One reconciled resource with its readiness.
#[must_use]
pub fn resource_line(resource: &ReconciledResource) -> String {
    let name = format!("{}/{}", resource.namespace, resource.name);
    match resource.readiness {
        Readiness::Ready => format!(
            "{name} {} (revision: {})",
            "🟢 Ready".green(),
            resource.revision
        ),
        Readiness::NotReady => format!("{name} {} - {}", "🔴 Not Ready".red(), resource.message),
        Readiness::Unknown => format!("{name} {} - {}", "⚠️  Unknown".yellow(), resource.message),
    }
}

/// Print resources grouped by kind, the summary and the failed resources.
pub fn print_flux_report(report: &FluxReport) {
    for kind in [ResourceKind::HelmRelease, ResourceKind::Kustomization] {
        println!();
        println!("{}", format!("{}:", kind.plural_label()).bold());
        for resource in report.of_kind(kind) {
            println!("{}", resource_line(resource));
        }
    }

    println!();
    println!("{} {}", "Summary:".bold(), report.summary());

    if !report.all_ready() {
        println!();
        println!("{}", "Failed resources:".red());
        for resource in &report.failed {
            println!("  - {resource}");
        }
    } else if report.total() == 0 {
        println!("{}", "No Flux resources found".yellow());
    }
}

/// Metric line for the standalone monitoring run.
#[must_use]
pub fn metric_line(outcome: &CheckOutcome) -> String {
    if is_query_error(outcome) {
        format!("{} {}", outcome.name, format!("✗ ERROR - {}", outcome.message).red())
    } else if outcome.passed {
        format!("{} {}", outcome.name, "🟢 OK (1)".green())
    } else {
        format!("{} {}", outcome.name, "🔴 FAIL (0)".red())
    }
}

/// Indented metric line inside the gate report.
#[must_use]
pub fn gate_metric_line(outcome: &CheckOutcome) -> String {
    if is_query_error(outcome) {
        format!("  {} {} - {}", outcome.name, "✗ ERROR".red(), outcome.message)
    } else if outcome.passed {
        format!("  {} {}", outcome.name, "✓ OK".green())
    } else {
        format!(
            "  {} {} - Value: {}",
            outcome.name,
            "✗ FAIL".red(),
            outcome.raw_value.as_deref().unwrap_or_default()
        )
    }
}

/// One line of the detailed results table.
#[must_use]
pub fn detail_line(outcome: &CheckOutcome) -> String {
    let name = format!("{:<30}", outcome.name);
    if outcome.passed {
        format!("✓ {} PASS", name.green())
    } else {
        format!("✗ {} FAIL - {}", name.red(), outcome.message)
    }
}

/// Score line, e.g. `Health Score: 83.3% (10 of 12 checks passed)`.
#[must_use]
pub fn score_line(result: &GateCheckResult) -> String {
    format!(
        "Health Score: {:.1}% ({} of {} checks passed)",
        result.health_score, result.passed_checks, result.total_checks
    )
}

/// Quality gate decision line for a band.
#[must_use]
pub fn band_line(band: HealthBand) -> String {
    let text = format!("{band} - {}", band.verdict());
    match band {
        HealthBand::Excellent => format!("🟢 {text}").green().bold().to_string(),
        HealthBand::Good => format!("🟡 {text}").green().bold().to_string(),
        HealthBand::Fair => format!("🟠 {text}").yellow().bold().to_string(),
        HealthBand::Poor => format!("🔴 {text}").red().bold().to_string(),
    }
}

/// Print the final summary, detailed results and quality gate decision.
pub fn print_gate_summary(result: &GateCheckResult) {
    println!("{}", format!("╔{}╗", "═".repeat(RULE_WIDTH)).cyan());
    println!("{}", "║              GATE CHECK SUMMARY                  ║".cyan());
    println!("{}", format!("╚{}╝", "═".repeat(RULE_WIDTH)).cyan());
    println!();

    if result.overall_passed {
        println!("{}", "✓ CLUSTER HEALTH: PASSED".green().bold());
    } else {
        println!("{}", "✗ CLUSTER HEALTH: FAILED".red().bold());
    }

    println!();
    println!("{}", score_line(result).bold());
    println!();

    println!("Detailed Results:");
    println!("{}", "─".repeat(RULE_WIDTH - 1));
    for check in &result.check_results {
        println!("{}", detail_line(check));
    }
    println!();

    println!("Quality Gate Decision:");
    println!("{}", "─".repeat(RULE_WIDTH - 1));
    println!("{}", band_line(result.band()));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ScoreAggregator;
    use crate::check::CheckPolarity;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_pod_line() {
        plain();
        let pod = PodState {
            namespace: "default".to_string(),
            name: "web-0".to_string(),
            phase: "Pending".to_string(),
        };
        assert_eq!(pod_line(&pod), "default/web-0 🔴 Pending");
    }

    #[test]
    fn test_resource_lines() {
        plain();
        let mut resource = ReconciledResource {
            kind: ResourceKind::HelmRelease,
            namespace: "flux-system".to_string(),
            name: "podinfo".to_string(),
            readiness: Readiness::Ready,
            message: String::new(),
            revision: "6.5.4".to_string(),
        };
        assert_eq!(
            resource_line(&resource),
            "flux-system/podinfo 🟢 Ready (revision: 6.5.4)"
        );

        resource.readiness = Readiness::Unknown;
        resource.message = "No conditions set".to_string();
        assert_eq!(
            resource_line(&resource),
            "flux-system/podinfo ⚠️  Unknown - No conditions set"
        );
    }

    #[test]
    fn test_metric_lines() {
        plain();
        let ok = CheckOutcome::from_metric("NODE", CheckPolarity::Normal, "1".to_string());
        assert_eq!(metric_line(&ok), "NODE 🟢 OK (1)");
        assert_eq!(gate_metric_line(&ok), "  NODE ✓ OK");

        let fluent =
            CheckOutcome::from_metric("FLUENTDERRORS", CheckPolarity::Inverted, "1".to_string());
        assert_eq!(metric_line(&fluent), "FLUENTDERRORS 🔴 FAIL (0)");
        assert_eq!(gate_metric_line(&fluent), "  FLUENTDERRORS ✗ FAIL - Value: 1");

        let err = CheckOutcome::fail("KUBEDNS", "Query error: timeout");
        assert_eq!(gate_metric_line(&err), "  KUBEDNS ✗ ERROR - Query error: timeout");
    }

    #[test]
    fn test_summary_lines() {
        plain();
        let mut agg = ScoreAggregator::new();
        agg.record(CheckOutcome::pass("Pod Health", "ok"));
        agg.record(CheckOutcome::fail("Flux Resources", "1 resources not Ready"));
        let result = agg.finalize();

        assert_eq!(score_line(&result), "Health Score: 50.0% (1 of 2 checks passed)");
        assert_eq!(
            detail_line(&result.check_results[1]),
            format!("✗ {:<30} FAIL - 1 resources not Ready", "Flux Resources")
        );
        assert_eq!(band_line(result.band()), "🔴 POOR - Not ready for production");
    }
}
