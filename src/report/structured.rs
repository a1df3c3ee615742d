use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::catalog::FIELDS;
use crate::collector::{AuditResult, ProbeOutcome};
use crate::error::ReportError;

/// Builds the JSON document: identity and timestamps, one flat key per known
/// field (null when the probe is absent or did not succeed), and the full
/// outcome map under `probes`.
pub fn to_document(result: &AuditResult, exported_at: DateTime<Utc>) -> Value {
    let mut doc = Map::new();
    doc.insert("host_id".into(), Value::String(result.host_id().to_string()));
    doc.insert("collected_at".into(), timestamp(result.collected_at()));
    doc.insert("exported_at".into(), timestamp(exported_at));

    for spec in FIELDS {
        doc.insert(spec.key.into(), flat_value(result.get(spec.key)));
    }
    for (name, outcome) in result.outcomes() {
        if !doc.contains_key(name) {
            doc.insert(name.into(), flat_value(Some(outcome)));
        }
    }

    let probes: Map<String, Value> = result
        .outcomes()
        .map(|(name, outcome)| {
            let encoded = serde_json::to_value(outcome).unwrap_or(Value::Null);
            (name.to_string(), encoded)
        })
        .collect();
    doc.insert("probes".into(), Value::Object(probes));
    Value::Object(doc)
}

/// Recovers the [`AuditResult`] from a structured document.
pub fn parse_structured(raw: &str) -> Result<AuditResult, ReportError> {
    let doc: Value = serde_json::from_str(raw)?;
    let host_id = doc
        .get("host_id")
        .and_then(Value::as_str)
        .ok_or(ReportError::MissingField("host_id"))?
        .to_string();
    let collected_at: DateTime<Utc> = serde_json::from_value(
        doc.get("collected_at")
            .cloned()
            .ok_or(ReportError::MissingField("collected_at"))?,
    )?;
    let probes: BTreeMap<String, ProbeOutcome> = serde_json::from_value(
        doc.get("probes")
            .cloned()
            .ok_or(ReportError::MissingField("probes"))?,
    )?;
    Ok(AuditResult::from_outcomes(host_id, collected_at, probes))
}

fn flat_value(outcome: Option<&ProbeOutcome>) -> Value {
    outcome.and_then(ProbeOutcome::value).cloned().unwrap_or(Value::Null)
}

fn timestamp(at: DateTime<Utc>) -> Value {
    serde_json::to_value(at).unwrap_or(Value::Null)
}
