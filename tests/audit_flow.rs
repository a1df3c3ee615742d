use std::fs;
use std::time::{Duration, Instant};

use host_audit::export;
use host_audit::{
    format, parse_structured, AuditSession, Collector, Probe, ProbeOutcome, ProbeRegistry,
    ReportMode, SessionError, SessionEvent,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::time::sleep;

fn fake(name: &str, delay_ms: u64, timeout_ms: u64, outcome: Result<&'static str, &'static str>) -> Probe {
    Probe::new(name, Duration::from_millis(timeout_ms), move || async move {
        sleep(Duration::from_millis(delay_ms)).await;
        outcome.map(|v| json!(v)).map_err(str::to_string)
    })
}

fn workstation_registry() -> ProbeRegistry {
    ProbeRegistry::new()
        .with(fake("os", 10, 1_000, Ok("Windows 11 Pro")))
        .unwrap()
        .with(fake("cpu", 20, 1_000, Err("access denied")))
        .unwrap()
        .with(fake("ram", 5, 1_000, Ok("16.0 GiB")))
        .unwrap()
        .with(fake("net_ping", 5_000, 300, Ok("online, 12 ms")))
        .unwrap()
}

#[tokio::test]
async fn partial_failures_still_produce_a_full_report() {
    let session = AuditSession::new(Collector::new(8));
    let started = Instant::now();
    let result = session
        .run(&workstation_registry(), "RECEPCION-01")
        .await
        .expect("run with failing probes is still a successful run");

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert_eq!(result.len(), 4);
    assert_eq!(result.get("cpu"), Some(&ProbeOutcome::failure("access denied")));
    assert_eq!(result.get("net_ping"), Some(&ProbeOutcome::TimedOut));

    let text = format(&result, ReportMode::Text).render();
    assert!(text.contains("Operating system: Windows 11 Pro"));
    assert!(text.contains("Processor: -"));
    assert!(text.contains("Internet: -"));
    assert!(text.contains("Memory: 16.0 GiB"));
}

#[tokio::test]
async fn host_export_round_trips_through_disk() {
    let dir = TempDir::new().expect("temp dir");
    let session = AuditSession::new(Collector::new(8));
    let result = session
        .run(&workstation_registry(), "RECEPCION-01")
        .await
        .unwrap();

    let report = format(&result, ReportMode::Structured);
    let reports_dir = dir.path().join("Reportes");
    let path = export::write_host_report(&report, &reports_dir).unwrap();
    assert_eq!(path, reports_dir.join("RECEPCION-01.json"));

    let raw = fs::read_to_string(&path).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["os"], json!("Windows 11 Pro"));
    assert!(doc["cpu"].is_null());
    assert!(doc["mobo"].is_null());
    assert!(doc.get("exported_at").is_some());

    assert_eq!(parse_structured(&raw).unwrap(), result);
}

#[tokio::test]
async fn text_export_writes_file() {
    let dir = TempDir::new().expect("temp dir");
    let session = AuditSession::new(Collector::new(8));
    let result = session
        .run(&workstation_registry(), "RECEPCION-01")
        .await
        .unwrap();

    let path = dir.path().join("nested").join(export::DEFAULT_TEXT_REPORT);
    export::write_report(&format(&result, ReportMode::Text), &path).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("========================================\nHOST AUDIT REPORT"));
}

#[tokio::test]
async fn export_failure_leaves_result_intact() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file in the way").unwrap();

    let session = AuditSession::new(Collector::new(8));
    let result = session
        .run(&workstation_registry(), "RECEPCION-01")
        .await
        .unwrap();
    let snapshot = result.clone();

    let report = format(&result, ReportMode::Structured);
    let err = export::write_host_report(&report, &blocker).unwrap_err();
    assert!(matches!(err, host_audit::ExportError::CreateDir { .. }));
    assert_eq!(result, snapshot);
}

#[tokio::test]
async fn busy_host_does_not_disturb_first_run() {
    let mut session = AuditSession::new(Collector::new(8));
    let mut events = session.subscribe();

    let first = session.spawn(workstation_registry(), "RECEPCION-01").unwrap();
    let second = session.run(&workstation_registry(), "RECEPCION-01").await;
    assert!(matches!(second, Err(SessionError::Busy { .. })));

    let result = first.await.unwrap().unwrap();
    assert_eq!(result.len(), 4);

    let mut started = 0;
    let mut completed = 0;
    let mut finished = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Started { .. } => started += 1,
            SessionEvent::ProbeCompleted { .. } => completed += 1,
            SessionEvent::Finished { result: ref done, .. } => {
                assert_eq!(done, &result);
                finished += 1;
            }
            SessionEvent::Failed { .. } => panic!("run should not fail"),
        }
    }
    assert_eq!((started, completed, finished), (1, 4, 1));
}
