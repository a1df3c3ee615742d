use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single probe for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Success { value: Value },
    Failure { reason: String },
    TimedOut,
    Cancelled,
}

impl ProbeOutcome {
    pub fn success(value: impl Into<Value>) -> Self {
        ProbeOutcome::Success {
            value: value.into(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        ProbeOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            ProbeOutcome::Success { value } => Some(value),
            _ => None,
        }
    }

    /// Short status word used in progress output.
    pub fn status_label(&self) -> &'static str {
        match self {
            ProbeOutcome::Success { .. } => "ok",
            ProbeOutcome::Failure { .. } => "failed",
            ProbeOutcome::TimedOut => "timeout",
            ProbeOutcome::Cancelled => "cancelled",
        }
    }

    /// Human-readable rendering of a successful value. Strings are used
    /// verbatim, string arrays become one line per entry, anything else is
    /// compact JSON. A blank or null success renders as an empty string;
    /// only non-success outcomes return `None`.
    pub fn display_value(&self) -> Option<String> {
        let text = match self.value()? {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) if items.iter().all(Value::is_string) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        };
        Some(if text.trim().is_empty() { String::new() } else { text })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Failure { reason } => Some(reason),
            ProbeOutcome::TimedOut => Some("timed out"),
            ProbeOutcome::Cancelled => Some("cancelled"),
            ProbeOutcome::Success { .. } => None,
        }
    }
}

/// Aggregate of one audit run: one outcome per registered probe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    host_id: String,
    collected_at: DateTime<Utc>,
    probes: BTreeMap<String, ProbeOutcome>,
}

impl AuditResult {
    pub fn from_outcomes(
        host_id: impl Into<String>,
        collected_at: DateTime<Utc>,
        probes: BTreeMap<String, ProbeOutcome>,
    ) -> Self {
        AuditResult {
            host_id: host_id.into(),
            collected_at,
            probes,
        }
    }

    /// Returns the same outcomes stamped with a new identity and time.
    pub fn stamped(self, host_id: impl Into<String>, collected_at: DateTime<Utc>) -> Self {
        AuditResult {
            host_id: host_id.into(),
            collected_at,
            probes: self.probes,
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn collected_at(&self) -> DateTime<Utc> {
        self.collected_at
    }

    pub fn get(&self, name: &str) -> Option<&ProbeOutcome> {
        self.probes.get(name)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &ProbeOutcome)> {
        self.probes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.probes.values().filter(|o| !o.is_success()).count()
    }
}
