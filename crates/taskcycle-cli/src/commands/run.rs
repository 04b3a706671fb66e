//! Run periodic tasks for a fixed duration and report their timing.

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use taskcycle_scheduler::{PeriodicTask, RTSetup};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::CliError;
use crate::output::{self, TaskOutcome};
use crate::workload::Workload;

/// Options of the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    pub config: Option<&'a Path>,
    pub duration_ms: Option<u64>,
    pub no_rt: bool,
}

pub fn execute(options: &RunOptions<'_>, json: bool) -> Result<()> {
    let config = match options.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::demo(),
    };
    let duration = Duration::from_millis(options.duration_ms.unwrap_or(config.duration_ms));

    let mut task_configs = config.task_configs()?;
    if options.no_rt {
        for task_config in &mut task_configs {
            task_config.rt = RTSetup::minimal();
        }
    }

    let mut running = Vec::with_capacity(task_configs.len());
    for (task_config, spec) in task_configs.into_iter().zip(&config.tasks) {
        let workload = Workload::new(spec.workload.clone());
        let name = task_config.name.clone();
        let task = PeriodicTask::start(task_config, workload.callback())
            .map_err(|source| CliError::Task { name, source })?;
        running.push((task, workload));
    }

    info!(tasks = running.len(), duration = ?duration, "tasks started");
    thread::sleep(duration);

    for (task, _) in &running {
        task.request_stop();
    }

    let mut outcomes = Vec::with_capacity(running.len());
    for (task, workload) in running {
        let name = task.name().to_string();
        let report = task
            .join()
            .map_err(|source| CliError::Task { name, source })?;
        outcomes.push(TaskOutcome {
            report,
            workload_result: workload.result(),
        });
    }

    let failure = outcomes
        .iter()
        .find_map(|o| o.report.error.map(|e| (o.report.name.clone(), e)));

    match failure {
        None => {
            output::print_run(&outcomes, json);
            Ok(())
        }
        Some((name, source)) => {
            warn!(task = %name, error = %source, "task ended with an error");
            // Keep stdout a single JSON document; the error is printed by main.
            if !json {
                output::print_run(&outcomes, json);
            }
            Err(CliError::TaskFailed { name, source }.into())
        }
    }
}
