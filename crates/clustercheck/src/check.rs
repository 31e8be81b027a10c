//! Individual check outcomes and pass/fail classification.
//!
//! Metric queries return a scalar as text, conventionally `"0"` or `"1"`.
//! Most checks are healthy when the backend answers `"1"`. Error-count
//! checks (the `FLUENT*` log shipper checks) are the other way round: a `1`
//! means errors are present.

use serde::{Deserialize, Serialize};

/// Name prefix that marks an error-count check in the query table.
pub const INVERTED_PREFIX: &str = "FLUENT";

/// The literal scalar that counts as "signal present".
const SIGNAL: &str = "1";

/// How a raw metric scalar maps onto healthy/unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckPolarity {
    /// `"1"` is healthy, anything else is a failure.
    #[default]
    Normal,
    /// `"1"` signals an error condition, anything else is healthy.
    Inverted,
}

impl CheckPolarity {
    /// Derive the polarity from a check name using the `FLUENT` prefix rule.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        if name.starts_with(INVERTED_PREFIX) {
            Self::Inverted
        } else {
            Self::Normal
        }
    }

    /// Classify a raw scalar. The comparison is lexical: `"1.0"` is not `"1"`.
    #[must_use]
    pub fn classify(self, raw: &str) -> bool {
        let signal = raw == SIGNAL;
        match self {
            Self::Normal => signal,
            Self::Inverted => !signal,
        }
    }

    /// The raw value a healthy check is expected to report.
    #[must_use]
    pub fn expected(self) -> &'static str {
        match self {
            Self::Normal => "1",
            Self::Inverted => "0",
        }
    }
}

/// Classify a named check result using the name-prefix polarity rule.
#[must_use]
pub fn classify(name: &str, raw: &str) -> bool {
    CheckPolarity::for_name(name).classify(raw)
}

/// Result of one atomic check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Check identifier, e.g. `APISERVER` or `Pod Health`.
    pub name: String,
    /// Scalar returned by the metrics backend, absent for resource checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    /// Final pass/fail after polarity classification.
    pub passed: bool,
    /// Human-readable detail: error text, or "Healthy".
    pub message: String,
}

impl CheckOutcome {
    /// A passing check without a metric value.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: None,
            passed: true,
            message: message.into(),
        }
    }

    /// A failing check without a metric value.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: None,
            passed: false,
            message: message.into(),
        }
    }

    /// Build the outcome of a metric query from its raw scalar.
    pub fn from_metric(name: impl Into<String>, polarity: CheckPolarity, raw: String) -> Self {
        let passed = polarity.classify(&raw);
        let message = if passed {
            "Healthy".to_string()
        } else {
            format!("Value: {raw} (expected: {})", polarity.expected())
        };

        Self {
            name: name.into(),
            raw_value: Some(raw),
            passed,
            message,
        }
    }
}
