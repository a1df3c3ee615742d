#![cfg(test)]

use super::{Collector, Probe, ProbeOutcome, ProbeRegistry};
use crate::error::RegistryError;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

fn ok_probe(name: &str, value: &'static str) -> Probe {
    Probe::new(name, Duration::from_secs(1), move || async move { Ok(json!(value)) })
}

fn slow_probe(name: &str, delay: Duration, timeout: Duration) -> Probe {
    Probe::new(name, timeout, move || async move {
        sleep(delay).await;
        Ok(json!("late"))
    })
}

#[test]
fn registry_rejects_duplicate_names() {
    let mut registry = ProbeRegistry::new();
    registry.register(ok_probe("os", "x")).unwrap();
    let err = registry.register(ok_probe("os", "y")).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateProbe("os".to_string()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn registry_rejects_blank_names() {
    let mut registry = ProbeRegistry::new();
    assert_eq!(
        registry.register(ok_probe("  ", "x")).unwrap_err(),
        RegistryError::EmptyName
    );
}

#[test]
fn display_value_joins_string_lists() {
    let outcome = ProbeOutcome::success(json!(["C: 10 GB", "D: 20 GB"]));
    assert_eq!(outcome.display_value().unwrap(), "C: 10 GB\nD: 20 GB");
    assert_eq!(ProbeOutcome::success(json!(42)).display_value().unwrap(), "42");
    assert_eq!(ProbeOutcome::success(json!("  ")).display_value().as_deref(), Some(""));
    assert_eq!(ProbeOutcome::success(json!(null)).display_value().as_deref(), Some(""));
    assert!(ProbeOutcome::TimedOut.display_value().is_none());
}

#[tokio::test(start_paused = true)]
async fn success_and_timeout_scenario() {
    let registry = ProbeRegistry::new()
        .with(ok_probe("os", "Windows 11"))
        .unwrap()
        .with(slow_probe("ping", Duration::from_secs(30), Duration::from_secs(2)))
        .unwrap();

    let started = Instant::now();
    let result = Collector::new(8).collect(&registry, "PC-01").await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.get("os"), Some(&ProbeOutcome::success("Windows 11")));
    assert_eq!(result.get("ping"), Some(&ProbeOutcome::TimedOut));
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2500), "took {:?}", elapsed);
}

#[tokio::test]
async fn failure_is_recorded_not_raised() {
    let registry = ProbeRegistry::new()
        .with(Probe::new("cpu", Duration::from_secs(1), || async {
            Err("access denied".to_string())
        }))
        .unwrap();

    let result = Collector::new(4).collect(&registry, "PC-01").await.unwrap();
    assert_eq!(result.get("cpu"), Some(&ProbeOutcome::failure("access denied")));
    assert_eq!(result.failed_count(), 1);
}

#[tokio::test]
async fn panicking_probe_does_not_abort_siblings() {
    let registry = ProbeRegistry::new()
        .with(Probe::new("boom", Duration::from_secs(1), || async {
            if true {
                panic!("wmi exploded");
            }
            Ok(json!(null))
        }))
        .unwrap()
        .with(ok_probe("ram", "16 GB"))
        .unwrap();

    let result = Collector::new(4).collect(&registry, "PC-01").await.unwrap();
    match result.get("boom") {
        Some(ProbeOutcome::Failure { reason }) => assert!(reason.contains("wmi exploded")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(result.get("ram").unwrap().is_success());
}

#[tokio::test]
async fn blocking_probe_runs_off_the_runtime() {
    let registry = ProbeRegistry::new()
        .with(Probe::blocking("user", Duration::from_secs(5), || {
            std::thread::sleep(Duration::from_millis(20));
            Ok(json!("operator"))
        }))
        .unwrap();

    let result = Collector::new(1).collect(&registry, "PC-01").await.unwrap();
    assert_eq!(result.get("user"), Some(&ProbeOutcome::success("operator")));
}

#[tokio::test(start_paused = true)]
async fn key_set_matches_registry_under_mixed_outcomes() {
    let mut registry = ProbeRegistry::new();
    for i in 0..12 {
        let name = format!("p{}", i);
        let probe = match i % 3 {
            0 => ok_probe(&name, "ok"),
            1 => Probe::new(name, Duration::from_secs(1), || async { Err("nope".to_string()) }),
            _ => slow_probe(&name, Duration::from_secs(10), Duration::from_millis(500)),
        };
        registry.register(probe).unwrap();
    }

    let result = Collector::new(3).collect(&registry, "PC-01").await.unwrap();
    let mut expected: Vec<&str> = registry.names().collect();
    expected.sort();
    let actual: Vec<&str> = result.names().collect();
    assert_eq!(actual, expected);
    assert_eq!(result.failed_count(), 8);
}

#[tokio::test(start_paused = true)]
async fn runs_are_concurrent_not_serial() {
    let mut registry = ProbeRegistry::new();
    for i in 0..5 {
        registry
            .register(slow_probe(
                &format!("slow{}", i),
                Duration::from_secs(1),
                Duration::from_secs(3),
            ))
            .unwrap();
    }

    let started = Instant::now();
    let result = Collector::new(16).collect(&registry, "PC-01").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(result.failed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn progress_reports_in_completion_order() {
    let registry = ProbeRegistry::new()
        .with(slow_probe("a_slow", Duration::from_millis(300), Duration::from_secs(1)))
        .unwrap()
        .with(slow_probe("b_fast", Duration::from_millis(100), Duration::from_secs(1)))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    Collector::new(4)
        .collect_with(&registry, "PC-01", &CancellationToken::new(), |name, _| {
            sink.lock().unwrap().push(name.to_string());
        })
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["b_fast", "a_slow"]);
}

#[tokio::test(start_paused = true)]
async fn cancellation_marks_running_probes() {
    let registry = ProbeRegistry::new()
        .with(ok_probe("os", "Linux"))
        .unwrap()
        .with(slow_probe("net_ping", Duration::from_secs(60), Duration::from_secs(120)))
        .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = Collector::new(4)
        .collect_with(&registry, "PC-01", &cancel, |_, _| {})
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(result.get("os").unwrap().is_success());
    assert_eq!(result.get("net_ping"), Some(&ProbeOutcome::Cancelled));
}

#[tokio::test]
async fn empty_registry_yields_empty_result() {
    let result = Collector::new(4)
        .collect(&ProbeRegistry::new(), "PC-01")
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.host_id(), "PC-01");
}

#[tokio::test]
async fn default_collector_uses_global_config() {
    let registry = ProbeRegistry::new().with(ok_probe("os", "Windows 11")).unwrap();
    let result = Collector::default().collect(&registry, "PC-01").await.unwrap();
    assert!(result.get("os").unwrap().is_success());
}
