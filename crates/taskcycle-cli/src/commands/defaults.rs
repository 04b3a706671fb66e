//! Print the built-in demonstration configuration

use anyhow::Result;

use crate::config::RunConfig;
use crate::error::CliError;

/// Emit the demo run as YAML, or as JSON with `--json`.
pub fn execute(json: bool) -> Result<()> {
    let config = RunConfig::demo();
    let text = if json {
        serde_json::to_string_pretty(&config).map_err(CliError::from)?
    } else {
        serde_yaml::to_string(&config).map_err(CliError::from)?
    };
    println!("{}", text.trim_end());
    Ok(())
}
