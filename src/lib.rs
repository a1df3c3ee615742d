pub mod catalog;
mod collector;
mod config;
mod error;
pub mod export;
pub mod probes;
pub mod report;
mod session;

pub use collector::{AuditResult, Collector, Probe, ProbeFuture, ProbeOutcome, ProbeRegistry};
pub use config::{default_config_path, AuditConfig, RunReport, RunTimer, DEFAULT_CONFIG};
pub use error::{
    CollectionError, ConfigError, ExportError, RegistryError, ReportError, SessionError,
};
pub use report::{format, format_at, parse_structured, Report, ReportBody, ReportMode};
pub use session::{AuditSession, RunId, RunStage, RunState, SessionEvent, SessionRegistry};
