use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use host_audit::ReportMode;

#[derive(Parser, Debug)]
#[command(name = "host-audit", version, about = "Host hardware, health and network audit")]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (JSON); defaults to the per-user config")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Host identity to stamp on the report")]
    pub host: Option<String>,
    #[arg(short, long, global = true, help = "Debug logging to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all probes and print the report
    Scan {
        #[arg(long, help = "Print the structured JSON document instead of text")]
        json: bool,
    },
    /// Run all probes and save the report to a file
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        #[arg(long, help = "Output path (default: Reporte_PC.txt or <host>.json)")]
        out: Option<PathBuf>,
    },
    /// Unattended run: write <dir>/<host>.json and print one status line
    Audit {
        #[arg(long, help = "Report directory (default from config: Reportes)")]
        dir: Option<PathBuf>,
    },
    /// List the probe catalog and effective timeouts
    Probes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Text,
    Json,
}

impl From<ExportFormat> for ReportMode {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Text => ReportMode::Text,
            ExportFormat::Json => ReportMode::Structured,
        }
    }
}
