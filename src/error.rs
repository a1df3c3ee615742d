use std::path::PathBuf;

use thiserror::Error;

/// Rejected probe registrations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("probe `{0}` is already registered")]
    DuplicateProbe(String),
    #[error("probe name must not be empty")]
    EmptyName,
}

/// Infrastructure failure that prevented a run from producing any data.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("failed to start probe runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("probe scheduler unavailable: {0}")]
    Scheduler(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("an audit is already running for host `{host_id}`")]
    Busy { host_id: String },
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed structured report: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("structured report is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}
