mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::warn;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

use host_audit::catalog::FIELDS;
use host_audit::export::{self, DEFAULT_TEXT_REPORT};
use host_audit::probes;
use host_audit::{
    AuditConfig, AuditResult, AuditSession, ConfigError, ExportError, RegistryError, ReportMode,
    SessionError, SessionEvent,
};

use cli::{Cli, Commands};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Session(SessionError::Busy { .. }) => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = match Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start runtime: {}", err);
            return ExitCode::from(1);
        }
    };
    let outcome = runtime.block_on(run(cli));
    // Blocking probes that timed out may still be parked on a worker thread.
    runtime.shutdown_background();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            err.exit_code()
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Also installs the bridge that forwards `log` records from the library.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = AuditConfig::load(cli.config.as_deref())?;
    let host = cli.host.clone().unwrap_or_else(probes::host_identity);

    match cli.command {
        Commands::Scan { json } => {
            let result = collect(&config, &host, true).await?;
            let mode = if json {
                ReportMode::Structured
            } else {
                ReportMode::Text
            };
            println!("{}", host_audit::format(&result, mode).render());
        }
        Commands::Export { format, out } => {
            let mode = ReportMode::from(format);
            let result = collect(&config, &host, true).await?;
            let report = host_audit::format(&result, mode);
            let path = out.unwrap_or_else(|| default_export_path(&host, mode));
            export::write_report(&report, &path)?;
            println!("Report saved to {}", path.display());
        }
        Commands::Audit { dir } => {
            let dir = dir.unwrap_or_else(|| config.report_dir.clone());
            println!("Scanning {}...", host);
            let result = collect(&config, &host, false).await?;
            let report = host_audit::format(&result, ReportMode::Structured);
            let path = export::write_host_report(&report, &dir)?;
            println!(
                "Audit complete ({} of {} probes returned data): {}",
                result.len() - result.failed_count(),
                result.len(),
                path.display()
            );
        }
        Commands::Probes => {
            for spec in FIELDS {
                let state = if config.is_enabled(spec.key) {
                    "enabled"
                } else {
                    "disabled"
                };
                println!(
                    "{:<10} {:<9} {:>6} ms  {:<8} {}",
                    spec.key,
                    format!("{:?}", spec.section).to_lowercase(),
                    config.timeout_for(spec.key).as_millis(),
                    state,
                    spec.label
                );
            }
        }
    }
    Ok(())
}

/// Runs the default registry for `host`, printing per-probe progress to
/// stderr. Ctrl-C cancels the run; probes still running are recorded as
/// cancelled.
async fn collect(
    config: &AuditConfig,
    host: &str,
    show_progress: bool,
) -> Result<AuditResult, CliError> {
    let registry = probes::default_registry(config)?;
    let mut session = AuditSession::from_config(config);
    let mut events = session.subscribe();

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let SessionEvent::ProbeCompleted { name, outcome, .. } = event {
                if show_progress {
                    eprintln!("[{}] {}", outcome.status_label(), name);
                }
            }
        }
    });

    let canceller = {
        let session = session.clone();
        let host = host.to_string();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling audit of {}", host);
                session.cancel(&host);
            }
        })
    };

    let result = session.run(&registry, host).await;

    canceller.abort();
    let _ = canceller.await;
    drop(session);
    let _ = printer.await;

    Ok(result?)
}

fn default_export_path(host: &str, mode: ReportMode) -> PathBuf {
    match mode {
        ReportMode::Text => PathBuf::from(DEFAULT_TEXT_REPORT),
        ReportMode::Structured => export::host_report_path(Path::new("."), host, mode),
    }
}
