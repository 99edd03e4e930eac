//! swissknife: file conversion, batch processing and summarization.
//!
//!   swissknife convert report.docx report.pdf
//!   swissknife batch-convert ./scans ./out png jpg --parallel
//!   swissknife split book.pdf 1-3,5,7-9
//!   swissknife logs --failures

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use swissknife_core::{load_effective_config, Engine};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_effective_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let (engine, writer) = Engine::open(config).context("Failed to initialise")?;

    // The writer owns the operation log until every handle is dropped.
    let writer_handle = tokio::spawn(writer.run());

    let cancel = engine.cancel_flag().clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing running conversions");
            cancel.cancel();
        }
    });

    let result = dispatch(&engine, cli.command).await;

    drop(engine);
    if writer_handle.await.is_err() {
        warn!("Operation log writer stopped abnormally");
    } else {
        info!("Operation log flushed");
    }

    result
}

async fn dispatch(engine: &Engine, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Convert {
            source,
            target,
            preserve_original,
            password,
            force,
        } => commands::convert(engine, source, target, preserve_original, password, force).await,
        Commands::BatchConvert {
            source_dir,
            target_dir,
            source_ext,
            target_ext,
            parallel,
            workers,
            delete_originals,
            password,
            force,
        } => {
            commands::batch_convert(
                engine,
                &source_dir,
                &target_dir,
                &source_ext,
                &target_ext,
                parallel,
                workers,
                delete_originals,
                password,
                force,
            )
            .await
        }
        Commands::Summarize { file, length } => commands::summarize(engine, &file, length).await,
        Commands::Merge {
            inputs,
            output,
            force,
        } => commands::merge(engine, &inputs, &output, force).await,
        Commands::Split {
            input,
            ranges,
            output_dir,
            force,
        } => commands::split(engine, &input, &ranges, output_dir.as_deref(), force).await,
        Commands::Info { file, json } => commands::info(engine, &file, json).await,
        Commands::Logs {
            operation,
            failures,
            since,
            limit,
            json,
        } => commands::logs(engine, operation, failures, since, limit, json),
        Commands::Cleanup { older_than_hours } => commands::cleanup(engine, older_than_hours).await,
        Commands::Version => commands::version(engine).await,
    }
}

/// Diagnostics go to stderr so command output stays clean.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
