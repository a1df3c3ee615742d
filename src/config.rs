// src/config.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_DIR_NAME: &str = "host-audit";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    // Parallelism
    pub max_concurrency: usize, // Default: max(num_cpus, 4)

    // Timeouts
    pub default_timeout_ms: u64,                 // Default: 10 000
    pub probe_timeouts_ms: HashMap<String, u64>, // Per-probe overrides

    // Probe selection
    pub disabled_probes: Vec<String>,
    pub ping_target: String, // Default: 8.8.8.8

    // Output
    pub report_dir: PathBuf, // Default: Reportes
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            max_concurrency: num_cpus::get().max(4),
            default_timeout_ms: 10_000,
            probe_timeouts_ms: HashMap::new(),
            disabled_probes: Vec::new(),
            ping_target: "8.8.8.8".to_string(),
            report_dir: PathBuf::from("Reportes"),
        }
    }
}

// Global defaults
lazy_static! {
    pub static ref DEFAULT_CONFIG: AuditConfig = AuditConfig::default();
}

impl AuditConfig {
    /// Defaults, then the JSON file (explicit path, else the per-user config
    /// file when present), then `HOST_AUDIT_*` environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => AuditConfig::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("HOST_AUDIT_MAX_CONCURRENCY") {
            self.max_concurrency = parse_positive("HOST_AUDIT_MAX_CONCURRENCY", &raw)? as usize;
        }
        if let Some(raw) = lookup("HOST_AUDIT_TIMEOUT_MS") {
            self.default_timeout_ms = parse_positive("HOST_AUDIT_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = lookup("HOST_AUDIT_REPORT_DIR") {
            if !raw.trim().is_empty() {
                self.report_dir = PathBuf::from(raw.trim());
            }
        }
        if let Some(raw) = lookup("HOST_AUDIT_PING_TARGET") {
            if !raw.trim().is_empty() {
                self.ping_target = raw.trim().to_string();
            }
        }
        Ok(())
    }

    pub fn timeout_for(&self, probe: &str) -> Duration {
        let ms = self
            .probe_timeouts_ms
            .get(probe)
            .copied()
            .unwrap_or(self.default_timeout_ms);
        Duration::from_millis(ms.max(1))
    }

    pub fn is_enabled(&self, probe: &str) -> bool {
        !self.disabled_probes.iter().any(|p| p == probe)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Env {
            var,
            value: raw.to_string(),
        }),
    }
}

// Run timing with named checkpoints
#[derive(Debug, Clone)]
pub struct RunTimer {
    pub operation: String,
    pub start_time: Instant,
    pub checkpoints: Vec<(String, Duration)>,
}

impl RunTimer {
    pub fn new(operation: String) -> Self {
        RunTimer {
            operation,
            start_time: Instant::now(),
            checkpoints: Vec::new(),
        }
    }

    pub fn checkpoint(&mut self, name: &str) {
        self.checkpoints
            .push((name.to_string(), self.start_time.elapsed()));
    }

    pub fn complete(self) -> RunReport {
        let report = RunReport {
            operation: self.operation,
            total_duration: self.start_time.elapsed(),
            checkpoints: self.checkpoints,
        };
        debug!(
            "{} took {} ms ({})",
            report.operation,
            report.total_duration.as_millis(),
            report
                .checkpoints
                .iter()
                .map(|(name, at)| format!("{}@{}ms", name, at.as_millis()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        report
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub operation: String,
    pub total_duration: Duration,
    pub checkpoints: Vec<(String, Duration)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "default_timeout_ms": 2500, "probe_timeouts_ms": {{ "net_ping": 4000 }} }}"#
        )
        .unwrap();

        let config = AuditConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_timeout_ms, 2500);
        assert_eq!(config.timeout_for("net_ping"), Duration::from_millis(4000));
        assert_eq!(config.timeout_for("cpu"), Duration::from_millis(2500));
        assert_eq!(config.ping_target, "8.8.8.8");
        assert_eq!(config.report_dir, PathBuf::from("Reportes"));
    }

    #[test]
    fn malformed_file_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = AuditConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AuditConfig::default();
        config
            .apply_env(|key| match key {
                "HOST_AUDIT_MAX_CONCURRENCY" => Some("2".to_string()),
                "HOST_AUDIT_PING_TARGET" => Some(" 1.1.1.1 ".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.ping_target, "1.1.1.1");
    }

    #[test]
    fn env_rejects_zero_concurrency() {
        let mut config = AuditConfig::default();
        let err = config
            .apply_env(|key| (key == "HOST_AUDIT_MAX_CONCURRENCY").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "HOST_AUDIT_MAX_CONCURRENCY", .. }));
    }

    #[test]
    fn disabled_probes_are_filtered() {
        let config = AuditConfig {
            disabled_probes: vec!["av".to_string()],
            ..AuditConfig::default()
        };
        assert!(!config.is_enabled("av"));
        assert!(config.is_enabled("os"));
    }
}
