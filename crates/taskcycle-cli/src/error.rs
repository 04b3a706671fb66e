//! Error types for the taskcycle CLI

use std::path::PathBuf;

use taskcycle_scheduler::{RTError, TaskError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unsupported config format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid task '{name}': {source}")]
    InvalidTask {
        name: String,
        #[source]
        source: RTError,
    },

    #[error("Task '{name}': {source}")]
    Task {
        name: String,
        #[source]
        source: TaskError,
    },

    #[error("Task '{name}' failed: {source}")]
    TaskFailed {
        name: String,
        #[source]
        source: RTError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Task { .. } | CliError::TaskFailed { .. } => 2,
            CliError::UnsupportedFormat(_)
            | CliError::ValidationError(_)
            | CliError::InvalidTask { .. }
            | CliError::JsonError(_)
            | CliError::YamlError(_) => 4,
            CliError::IoError(_) => 1,
        }
    }

    /// Short machine-readable name used in JSON error output.
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::UnsupportedFormat(_) => "unsupported_format",
            CliError::ValidationError(_) => "validation",
            CliError::InvalidTask { .. } => "invalid_task",
            CliError::Task { .. } => "task",
            CliError::TaskFailed { .. } => "task_failed",
            CliError::IoError(_) => "io",
            CliError::JsonError(_) => "json",
            CliError::YamlError(_) => "yaml",
        }
    }
}
