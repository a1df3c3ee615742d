use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::task;

use crate::error::RegistryError;

pub type ProbeFuture = BoxFuture<'static, Result<Value, String>>;

type RunFn = dyn Fn() -> ProbeFuture + Send + Sync;

/// A named unit of telemetry collection with its own time budget.
#[derive(Clone)]
pub struct Probe {
    name: String,
    timeout: Duration,
    run: Arc<RunFn>,
}

impl Probe {
    pub fn new<F, Fut>(name: impl Into<String>, timeout: Duration, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        Probe {
            name: name.into(),
            timeout,
            run: Arc::new(move || run().boxed()),
        }
    }

    /// Wraps synchronous work (sysinfo calls, file reads) so it runs on the
    /// blocking pool. On timeout the thread is abandoned, not joined.
    pub fn blocking<F>(name: impl Into<String>, timeout: Duration, run: F) -> Self
    where
        F: Fn() -> Result<Value, String> + Send + Sync + 'static,
    {
        let run = Arc::new(run);
        Probe::new(name, timeout, move || {
            let run = Arc::clone(&run);
            async move {
                match task::spawn_blocking(move || run()).await {
                    Ok(result) => result,
                    Err(join_err) => Err(format!("probe worker failed: {}", join_err)),
                }
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn invoke(&self) -> ProbeFuture {
        (self.run)()
    }
}

impl fmt::Debug for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The fixed set of probes for one audit pass, in registration order.
#[derive(Clone, Debug, Default)]
pub struct ProbeRegistry {
    probes: Vec<Probe>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, probe: Probe) -> Result<(), RegistryError> {
        if probe.name().trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.contains(probe.name()) {
            return Err(RegistryError::DuplicateProbe(probe.name().to_string()));
        }
        self.probes.push(probe);
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, probe: Probe) -> Result<Self, RegistryError> {
        self.register(probe)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.probes.iter().any(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&Probe> {
        self.probes.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(Probe::name)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Longest single-probe budget; the bound on an unsaturated run.
    pub fn max_timeout(&self) -> Duration {
        self.probes
            .iter()
            .map(Probe::timeout)
            .max()
            .unwrap_or_default()
    }
}
