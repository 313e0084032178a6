//! # binsize - Main Entry Point
//!
//! Parses arguments, validates inputs, runs the resolution pipeline and prints
//! the final statistics.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use binsize::cli::Args;
use binsize::domain::AnalysisError;
use binsize::pipeline;
use binsize::preflight::run_preflight_checks;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_CONFIG: i32 = 78;

fn main() {
    // Missing or malformed arguments exit with clap's usage message (status 2)
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AnalysisError>() {
        Some(
            AnalysisError::LibraryUnreadable { .. } | AnalysisError::ProjectRootNotFound(_),
        ) => EXIT_CONFIG,
        _ => EXIT_ERROR,
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.pipeline_config();
    run_preflight_checks(&config)?;

    let summary = pipeline::run(&config)?;
    eprintln!("\n{summary}");
    Ok(())
}
