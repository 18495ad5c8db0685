//! boba - scene exporter command line

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod export;

use cli::{Cli, level_filter};
use export::{ExportOutcome, export_file};

/// An explicit `--loglevel` wins over `RUST_LOG`; otherwise `RUST_LOG` wins
/// over the configured level.
fn init_logging(explicit: bool, log_level: u8) {
    let filter = level_filter(log_level);
    let mut builder = if explicit {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(filter);
        builder
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter.as_str()))
    };
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = match cli.options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("boba: {err}");
            return ExitCode::from(2);
        }
    };
    init_logging(cli.loglevel.is_some(), options.log_level);

    let mut failed = 0usize;
    for input in &cli.inputs {
        match export_file(input, &options) {
            Ok(ExportOutcome::Exported { stats, sidecar }) => {
                tracing::info!(
                    input = %input.display(),
                    blob_bytes = stats.map(|s| s.total()),
                    sidecar = ?sidecar.map(|files| files.json),
                    "Exported"
                );
            }
            Ok(ExportOutcome::Skipped) => {}
            Err(err) => {
                tracing::error!(input = %input.display(), %err, "Export failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::error!(failed, total = cli.inputs.len(), "Some exports failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
