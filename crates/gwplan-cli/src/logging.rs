use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    let level = logging.level().unwrap_or(Level::INFO);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber. Structured runs write JSON lines next to the
/// markdown summary; otherwise events go to stderr.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter(logging))
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        // Ignore error if a global subscriber is already set (e.g., when running in tests)
        let _ = tracing::subscriber::set_global_default(subscriber);
        return Ok(None);
    }

    let telemetry_dir = outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&telemetry_dir).with_context(|| {
        format!(
            "creating telemetry directory at {}",
            telemetry_dir.display()
        )
    })?;

    let telemetry_path = telemetry_dir.join("telemetry.jsonl");
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter(logging))
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Ignore error if a global subscriber is already set (e.g., when running in tests)
    let _ = tracing::subscriber::set_global_default(subscriber);
    info!(target: "gwplan_cli::plan", run_id, "structured telemetry enabled");

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}
