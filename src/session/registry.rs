use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Collecting,
    Cancelling,
}

/// Live view of the run currently holding a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub id: RunId,
    pub host_id: String,
    pub started_at: DateTime<Utc>,
    pub stage: RunStage,
    pub probes_total: usize,
    pub probes_done: usize,
}

impl RunState {
    pub fn progress(&self) -> f32 {
        if self.probes_total == 0 {
            100.0
        } else {
            self.probes_done as f32 / self.probes_total as f32 * 100.0
        }
    }
}

#[derive(Debug)]
struct RunHandle {
    token: CancellationToken,
}

/// One busy flag per host. Holding a [`RunGuard`] is holding the flag.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<DashMap<String, (RunState, Arc<RunHandle>)>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `host_id` or fails fast when another run holds it.
    pub fn try_acquire(&self, host_id: &str, probes_total: usize) -> Result<RunGuard, SessionError> {
        match self.inner.entry(host_id.to_string()) {
            Entry::Occupied(_) => Err(SessionError::Busy {
                host_id: host_id.to_string(),
            }),
            Entry::Vacant(slot) => {
                let id = uuid::Uuid::new_v4().to_string();
                let token = CancellationToken::new();
                let state = RunState {
                    id: id.clone(),
                    host_id: host_id.to_string(),
                    started_at: Utc::now(),
                    stage: RunStage::Collecting,
                    probes_total,
                    probes_done: 0,
                };
                slot.insert((state, Arc::new(RunHandle { token: token.clone() })));
                Ok(RunGuard {
                    registry: self.clone(),
                    host_id: host_id.to_string(),
                    run_id: id,
                    token,
                })
            }
        }
    }

    pub fn get(&self, host_id: &str) -> Option<RunState> {
        self.inner.get(host_id).map(|e| e.0.clone())
    }

    pub fn is_active(&self, host_id: &str) -> bool {
        self.inner.contains_key(host_id)
    }

    pub fn cancel(&self, host_id: &str) -> bool {
        if let Some(mut entry) = self.inner.get_mut(host_id) {
            entry.0.stage = RunStage::Cancelling;
            entry.1.token.cancel();
            true
        } else {
            false
        }
    }

    fn record_progress(&self, host_id: &str, run_id: &str) {
        if let Some(mut entry) = self.inner.get_mut(host_id) {
            if entry.0.id == run_id {
                entry.0.probes_done = entry.0.probes_done.saturating_add(1);
            }
        }
    }

    fn release(&self, host_id: &str, run_id: &str) {
        let _ = self.inner.remove_if(host_id, |_, (state, _)| state.id == run_id);
    }
}

/// Releases the host's busy flag on drop, including when the owning future
/// is dropped mid-run.
pub struct RunGuard {
    registry: SessionRegistry,
    host_id: String,
    run_id: RunId,
    token: CancellationToken,
}

impl RunGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn record_progress(&self) {
        self.registry.record_progress(&self.host_id, &self.run_id);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.release(&self.host_id, &self.run_id);
    }
}
