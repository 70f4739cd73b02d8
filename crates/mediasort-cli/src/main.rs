use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use mediasort_core::{Config, SortError};

#[derive(Parser)]
#[command(
    name = "mediasort",
    version,
    about = "Organize photos and videos into a dated archive with duplicate detection"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "mediasort.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Process the source directory (default)
    Run,
    /// Delete the record database, log file and generated destination folders
    Reset,
}

/// Exit code for the fatal capacity pre-flight failure, distinct from
/// ordinary errors.
const EXIT_CAPACITY: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&config.log) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config),
        Command::Reset => mediasort_core::reset::reset(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if matches!(
                err.downcast_ref::<SortError>(),
                Some(SortError::InsufficientSpace { .. })
            ) {
                ExitCode::from(EXIT_CAPACITY)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let t_total = std::time::Instant::now();

    let bar = ProgressBar::hidden();
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);

    let cb_bar = bar.clone();
    let report = mediasort_core::process(config, &move |_stage, current, total, message| {
        if cb_bar.is_hidden() {
            cb_bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        }
        cb_bar.set_length(total);
        cb_bar.set_position(current + 1);
        cb_bar.set_message(message.to_string());
    })?;
    bar.finish_and_clear();

    eprintln!(
        "Done! {} moved, {} duplicates, {} to review, {} failed, {} skipped, {} unsupported ({:.2}s)",
        report.moved,
        report.duplicates,
        report.review,
        report.failed,
        report.skipped,
        report.unsupported,
        t_total.elapsed().as_secs_f64()
    );
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(())
}

/// File layer (append-only, one line per processed file) plus a terse stderr
/// layer; RUST_LOG overrides the default info filter.
fn init_logging(log_path: &Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let file_name = log_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "mediasort.log".to_string());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_filter(LevelFilter::WARN),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .init();

    Ok(guard)
}
