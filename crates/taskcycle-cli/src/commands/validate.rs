//! Configuration validation command

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::RunConfig;
use crate::output;

pub fn execute(path: &Path, json: bool) -> Result<()> {
    let config = RunConfig::load(path)?;
    let tasks = config.task_configs()?;
    info!(path = %path.display(), tasks = tasks.len(), "configuration valid");

    output::print_validation(&config, json);
    Ok(())
}
