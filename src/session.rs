mod registry;

use chrono::Utc;
use log::{info, warn};
use tokio::runtime::{Builder, Handle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::collector::{AuditResult, Collector, ProbeOutcome, ProbeRegistry};
use crate::config::{AuditConfig, RunTimer};
use crate::error::{CollectionError, SessionError};

pub use registry::{RunGuard, RunId, RunStage, RunState, SessionRegistry};

/// Lifecycle notifications for one run. They may arrive on a different task
/// or thread than the one that started the run.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Started {
        run_id: RunId,
        host_id: String,
        probes: usize,
    },
    ProbeCompleted {
        run_id: RunId,
        name: String,
        outcome: ProbeOutcome,
    },
    Finished {
        run_id: RunId,
        result: AuditResult,
    },
    Failed {
        run_id: RunId,
        error: String,
    },
}

/// Orchestrates audit runs: one active run per host, collect, stamp, notify.
#[derive(Clone)]
pub struct AuditSession {
    collector: Collector,
    active: SessionRegistry,
    events: Option<UnboundedSender<SessionEvent>>,
}

impl AuditSession {
    pub fn new(collector: Collector) -> Self {
        AuditSession {
            collector,
            active: SessionRegistry::new(),
            events: None,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(Collector::from_config(config))
    }

    pub fn with_events(mut self, events: UnboundedSender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Installs a fresh event channel and returns its receiving end.
    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn is_active(&self, host_id: &str) -> bool {
        self.active.is_active(host_id)
    }

    pub fn state(&self, host_id: &str) -> Option<RunState> {
        self.active.get(host_id)
    }

    /// Signals the active run for `host_id`; still-running probes are
    /// recorded as cancelled.
    pub fn cancel(&self, host_id: &str) -> bool {
        self.active.cancel(host_id)
    }

    pub async fn run(
        &self,
        registry: &ProbeRegistry,
        host_id: &str,
    ) -> Result<AuditResult, SessionError> {
        let guard = self.active.try_acquire(host_id, registry.len())?;
        self.drive(guard, registry).await
    }

    /// Claims the host now and runs in the background. Must be called from
    /// within a tokio runtime.
    pub fn spawn(
        &self,
        registry: ProbeRegistry,
        host_id: &str,
    ) -> Result<JoinHandle<Result<AuditResult, SessionError>>, SessionError> {
        let guard = self.active.try_acquire(host_id, registry.len())?;
        let session = self.clone();
        Ok(tokio::spawn(async move {
            session.drive(guard, &registry).await
        }))
    }

    /// Drives a run to completion from synchronous code.
    pub fn run_blocking(
        &self,
        registry: &ProbeRegistry,
        host_id: &str,
    ) -> Result<AuditResult, SessionError> {
        if Handle::try_current().is_err() {
            return self.run_on_own_runtime(registry, host_id);
        }
        // Blocking inside a runtime would stall its workers.
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.run_on_own_runtime(registry, host_id))
                .join()
                .unwrap_or_else(|_| {
                    Err(CollectionError::Scheduler("audit thread panicked".to_string()).into())
                })
        })
    }

    fn run_on_own_runtime(
        &self,
        registry: &ProbeRegistry,
        host_id: &str,
    ) -> Result<AuditResult, SessionError> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CollectionError::Runtime)?;
        let result = runtime.block_on(self.run(registry, host_id));
        // Timed-out blocking probes are abandoned, not joined.
        runtime.shutdown_background();
        result
    }

    async fn drive(
        &self,
        guard: RunGuard,
        registry: &ProbeRegistry,
    ) -> Result<AuditResult, SessionError> {
        let run_id = guard.run_id().to_string();
        let host_id = guard.host_id().to_string();
        let mut timer = RunTimer::new(format!("audit {}", host_id));

        info!(
            "audit {} started for {} with {} probes",
            run_id,
            host_id,
            registry.len()
        );
        self.emit(SessionEvent::Started {
            run_id: run_id.clone(),
            host_id: host_id.clone(),
            probes: registry.len(),
        });

        let collected = self
            .collector
            .collect_with(registry, &host_id, guard.token(), |name, outcome| {
                guard.record_progress();
                self.emit(SessionEvent::ProbeCompleted {
                    run_id: run_id.clone(),
                    name: name.to_string(),
                    outcome: outcome.clone(),
                });
            })
            .await;
        timer.checkpoint("collect");
        drop(guard);

        match collected {
            Ok(result) => {
                let result = result.stamped(host_id.as_str(), Utc::now());
                timer.checkpoint("stamp");
                let report = timer.complete();
                info!(
                    "audit {} finished for {}: {} probes, {} without data, {} ms",
                    run_id,
                    host_id,
                    result.len(),
                    result.failed_count(),
                    report.total_duration.as_millis()
                );
                self.emit(SessionEvent::Finished {
                    run_id,
                    result: result.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                warn!("audit {} failed for {}: {}", run_id, host_id, err);
                self.emit(SessionEvent::Failed {
                    run_id,
                    error: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }
}

impl Default for AuditSession {
    fn default() -> Self {
        Self::new(Collector::default())
    }
}
