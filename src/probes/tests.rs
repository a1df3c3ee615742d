#![cfg(test)]

use super::*;
use crate::catalog::FIELDS;
use std::collections::HashMap;
use std::time::Duration;

#[test]
fn default_registry_covers_catalog() {
    let registry = default_registry(&AuditConfig::default()).unwrap();
    let names: Vec<&str> = registry.names().collect();
    let expected: Vec<&str> = FIELDS.iter().map(|f| f.key).collect();
    assert_eq!(names, expected);
}

#[test]
fn disabled_probes_are_skipped() {
    let config = AuditConfig {
        disabled_probes: vec!["av".to_string(), "net_ping".to_string()],
        ..AuditConfig::default()
    };
    let registry = default_registry(&config).unwrap();
    assert!(!registry.contains("av"));
    assert!(!registry.contains("net_ping"));
    assert_eq!(registry.len(), FIELDS.len() - 2);
}

#[test]
fn per_probe_timeouts_apply() {
    let mut overrides = HashMap::new();
    overrides.insert("net_ping".to_string(), 4_000);
    let config = AuditConfig {
        default_timeout_ms: 1_500,
        probe_timeouts_ms: overrides,
        ..AuditConfig::default()
    };
    let registry = default_registry(&config).unwrap();
    assert_eq!(registry.get("net_ping").unwrap().timeout(), Duration::from_secs(4));
    assert_eq!(registry.get("cpu").unwrap().timeout(), Duration::from_millis(1_500));
    assert_eq!(registry.max_timeout(), Duration::from_secs(4));
}

#[test]
fn unknown_key_has_no_builtin() {
    assert!(builtin_probe("toaster", &AuditConfig::default()).is_none());
}

#[test]
fn host_identity_is_never_blank() {
    assert!(!host_identity().trim().is_empty());
}
