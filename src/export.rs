use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::ExportError;
use crate::report::{Report, ReportMode};

pub const DEFAULT_TEXT_REPORT: &str = "Reporte_PC.txt";

/// Writes the rendered report, creating the parent directory if needed.
pub fn write_report(report: &Report, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, report.render()).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("report for {} written to {}", report.host_id(), path.display());
    Ok(())
}

/// Per-host report path inside `dir`, e.g. `Reportes/RECEPCION-01.json`.
pub fn host_report_path(dir: &Path, host_id: &str, mode: ReportMode) -> PathBuf {
    dir.join(format!("{}.{}", file_stem(host_id), mode.file_extension()))
}

/// Unattended export: one file per host under `dir`.
pub fn write_host_report(report: &Report, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = host_report_path(dir, report.host_id(), report.mode());
    write_report(report, &path)?;
    Ok(path)
}

fn file_stem(host_id: &str) -> String {
    let stem: String = host_id
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "unknown-host".to_string()
    } else {
        stem
    }
}
