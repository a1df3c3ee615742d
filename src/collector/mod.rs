mod engine;
mod probe;
#[cfg(test)]
mod tests;
mod types;

pub use engine::Collector;
pub use probe::{Probe, ProbeFuture, ProbeRegistry};
pub use types::{AuditResult, ProbeOutcome};
