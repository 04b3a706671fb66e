//! taskcycle - periodic real-time task runner
//!
//! Runs one or more periodic tasks from a YAML or JSON description, stops
//! them after a fixed duration and prints the cycle-time statistics.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod config;
mod error;
mod output;
mod workload;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::run::RunOptions;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "taskcycle")]
#[command(about = "Run periodic real-time tasks and report their cycle-time statistics")]
#[command(version)]
#[command(long_about = "
taskcycle starts periodic tasks on dedicated threads, paces them with
absolute-deadline sleeps, busy waits or SCHED_DEADLINE, and prints the
distribution of the measured cycle times once they stop.

Without --config the built-in demonstration is run: a 1 ms busy-wait task
and a 7.5 ms sleeping task. Real-time properties the process may not set
are reported and skipped.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run tasks for a fixed duration and print statistics
    Run {
        /// Run configuration (.yaml, .yml or .json); the demo if omitted
        #[arg(short, long, env = "TASKCYCLE_CONFIG")]
        config: Option<PathBuf>,

        /// Override the configured run duration
        #[arg(short, long)]
        duration_ms: Option<u64>,

        /// Skip all real-time thread setup
        #[arg(long)]
        no_rt: bool,
    },

    /// Check a run configuration without starting anything
    Validate {
        /// Run configuration (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the built-in demonstration configuration
    Defaults,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("taskcycle={log_level},taskcycle_scheduler={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }

            let exit_code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            std::process::exit(exit_code);
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            config,
            duration_ms,
            no_rt,
        } => {
            let options = RunOptions {
                config: config.as_deref(),
                duration_ms: *duration_ms,
                no_rt: *no_rt,
            };
            commands::run::execute(&options, cli.json)
        }
        Commands::Validate { config } => commands::validate::execute(config, cli.json),
        Commands::Defaults => commands::defaults::execute(cli.json),
    }
}
