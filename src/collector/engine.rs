use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use log::{debug, warn};
use tokio::select;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::probe::{Probe, ProbeRegistry};
use super::types::{AuditResult, ProbeOutcome};
use crate::config::{AuditConfig, DEFAULT_CONFIG};
use crate::error::CollectionError;

/// Fans a registry out over a bounded worker pool and gathers one outcome
/// per probe.
#[derive(Clone, Debug)]
pub struct Collector {
    max_concurrency: usize,
}

impl Collector {
    pub fn new(max_concurrency: usize) -> Self {
        Collector {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.max_concurrency)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub async fn collect(
        &self,
        registry: &ProbeRegistry,
        host_id: &str,
    ) -> Result<AuditResult, CollectionError> {
        self.collect_with(registry, host_id, &CancellationToken::new(), |_, _| {})
            .await
    }

    /// Runs every probe and returns once each has succeeded, failed, timed
    /// out or been cancelled. `on_complete` fires in completion order.
    pub async fn collect_with<F>(
        &self,
        registry: &ProbeRegistry,
        host_id: &str,
        cancel: &CancellationToken,
        mut on_complete: F,
    ) -> Result<AuditResult, CollectionError>
    where
        F: FnMut(&str, &ProbeOutcome),
    {
        let started = Instant::now();
        let permits = registry.len().min(self.max_concurrency).max(1);
        let pool = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();

        for probe in registry.iter() {
            let probe = probe.clone();
            let pool = Arc::clone(&pool);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let outcome = run_probe(&probe, &pool, &cancel).await;
                (probe.name().to_string(), outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        let mut lost = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, outcome)) => {
                    match &outcome {
                        ProbeOutcome::Failure { reason } => {
                            warn!("probe {} failed: {}", name, reason)
                        }
                        ProbeOutcome::TimedOut => warn!("probe {} timed out", name),
                        _ => {}
                    }
                    on_complete(name.as_str(), &outcome);
                    outcomes.insert(name, outcome);
                }
                Err(join_err) => {
                    lost += 1;
                    warn!("probe task did not complete: {}", join_err);
                }
            }
        }

        if !registry.is_empty() && outcomes.is_empty() && lost > 0 {
            return Err(CollectionError::Scheduler(format!(
                "all {} probe tasks were lost",
                lost
            )));
        }

        for probe in registry.iter() {
            if !outcomes.contains_key(probe.name()) {
                let outcome = ProbeOutcome::failure("probe task aborted");
                on_complete(probe.name(), &outcome);
                outcomes.insert(probe.name().to_string(), outcome);
            }
        }

        debug!(
            "collected {} probes for {} in {} ms",
            outcomes.len(),
            host_id,
            started.elapsed().as_millis()
        );
        Ok(AuditResult::from_outcomes(host_id, Utc::now(), outcomes))
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::from_config(&DEFAULT_CONFIG)
    }
}

async fn run_probe(probe: &Probe, pool: &Semaphore, cancel: &CancellationToken) -> ProbeOutcome {
    let _permit = select! {
        biased;
        _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
        permit = pool.acquire() => match permit {
            Ok(permit) => permit,
            Err(_) => return ProbeOutcome::failure("probe pool closed"),
        },
    };

    let started = Instant::now();
    let work = AssertUnwindSafe(async { probe.invoke().await }).catch_unwind();
    let outcome = select! {
        biased;
        _ = cancel.cancelled() => ProbeOutcome::Cancelled,
        finished = timeout(probe.timeout(), work) => match finished {
            Err(_) => ProbeOutcome::TimedOut,
            Ok(Err(panic)) => {
                ProbeOutcome::failure(format!("probe panicked: {}", panic_message(panic.as_ref())))
            }
            Ok(Ok(Ok(value))) => ProbeOutcome::Success { value },
            Ok(Ok(Err(reason))) => ProbeOutcome::Failure { reason },
        },
    };
    debug!(
        "probe {} finished as {} after {} ms",
        probe.name(),
        outcome.status_label(),
        started.elapsed().as_millis()
    );
    outcome
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
