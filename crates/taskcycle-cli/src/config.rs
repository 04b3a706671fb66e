//! Run configuration files.
//!
//! A run is a list of task specs plus a default duration. Files are YAML or
//! JSON, chosen by extension. Each spec maps onto a `TaskConfig` and a
//! workload that plays the role of the per-cycle callback.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use taskcycle_scheduler::{
    BusyWait, DeadlineParams, RTSetup, SchedulingClass, TaskConfig, TaskMode,
};

use crate::error::CliError;

fn default_duration_ms() -> u64 {
    1_000
}

fn default_sample_capacity() -> usize {
    taskcycle_scheduler::task::DEFAULT_SAMPLE_CAPACITY
}

fn default_tolerance() -> f64 {
    -1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// How long `run` keeps the tasks alive.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpec {
    pub name: String,
    pub period_ns: u64,
    #[serde(default)]
    pub offset_ns: i64,
    /// Negative disables drift correction.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,
    pub mode: ModeSpec,
    #[serde(default)]
    pub rt: RtSpec,
    #[serde(default)]
    pub workload: WorkloadSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ModeSpec {
    Sleep,
    Busy {
        step_sleep: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lazy_sleep_ns: Option<u64>,
    },
    Deadline {
        runtime_ns: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deadline_ns: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingSpec {
    Other,
    Fifo,
    RoundRobin,
    Batch,
    Idle,
}

impl From<SchedulingSpec> for SchedulingClass {
    fn from(spec: SchedulingSpec) -> Self {
        match spec {
            SchedulingSpec::Other => SchedulingClass::Other,
            SchedulingSpec::Fifo => SchedulingClass::Fifo,
            SchedulingSpec::RoundRobin => SchedulingClass::RoundRobin,
            SchedulingSpec::Batch => SchedulingClass::Batch,
            SchedulingSpec::Idle => SchedulingClass::Idle,
        }
    }
}

/// Thread properties; everything off unless set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RtSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<SchedulingSpec>,
    pub priority_offset: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_affinity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_slack_ns: Option<u64>,
    pub lock_memory: bool,
}

impl From<&RtSpec> for RTSetup {
    fn from(spec: &RtSpec) -> Self {
        RTSetup {
            scheduling: spec.scheduling.map(SchedulingClass::from),
            priority_offset: spec.priority_offset,
            cpu_affinity: spec.cpu_affinity,
            nice: spec.nice,
            timer_slack_ns: spec.timer_slack_ns,
            lock_memory: spec.lock_memory,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum WorkloadSpec {
    /// Do nothing.
    #[default]
    Idle,
    /// Sum of `sin` over a fixed data set.
    Sine { data: Vec<f64> },
    /// Spin for a fixed time.
    Spin { duration_ns: u64 },
}

impl TaskSpec {
    pub fn mode(&self) -> TaskMode {
        match &self.mode {
            ModeSpec::Sleep => TaskMode::Sleep,
            ModeSpec::Busy {
                step_sleep,
                lazy_sleep_ns,
            } => TaskMode::Busy(BusyWait {
                lazy_sleep_ns: *lazy_sleep_ns,
                step_sleep: *step_sleep,
            }),
            ModeSpec::Deadline {
                runtime_ns,
                deadline_ns,
            } => TaskMode::Deadline(DeadlineParams {
                runtime_ns: *runtime_ns,
                deadline_ns: *deadline_ns,
            }),
        }
    }

    /// Build and validate the scheduler configuration.
    pub fn to_task_config(&self) -> Result<TaskConfig, CliError> {
        let config = TaskConfig::new(self.name.clone(), self.period_ns)
            .with_offset_ns(self.offset_ns)
            .with_tolerance(self.tolerance)
            .with_sample_capacity(self.sample_capacity)
            .with_mode(self.mode())
            .with_rt_setup(RTSetup::from(&self.rt));

        config.validate().map_err(|source| CliError::InvalidTask {
            name: self.name.clone(),
            source,
        })?;
        Ok(config)
    }
}

impl RunConfig {
    /// Read a YAML or JSON file, picked by extension.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            _ => Err(CliError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Check every task and return the scheduler configurations.
    pub fn task_configs(&self) -> Result<Vec<TaskConfig>, CliError> {
        if self.tasks.is_empty() {
            return Err(CliError::ValidationError(
                "configuration defines no tasks".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for task in &self.tasks {
            if !names.insert(task.name.as_str()) {
                return Err(CliError::ValidationError(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
        }

        self.tasks.iter().map(TaskSpec::to_task_config).collect()
    }

    /// Built-in demonstration: a 1 ms busy-wait task and a 7.5 ms sleeping
    /// task, each computing a sum of sines per cycle.
    pub fn demo() -> Self {
        let pattern = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 1.0];
        let sleep_data: Vec<f64> = pattern.iter().copied().cycle().take(75).collect();
        let busy_data: Vec<f64> = sleep_data.iter().map(|v| v + 1.0).collect();

        let rt = |scheduling, cpu_affinity| RtSpec {
            scheduling: Some(scheduling),
            priority_offset: 0,
            cpu_affinity: Some(cpu_affinity),
            nice: Some(-20),
            timer_slack_ns: Some(1),
            lock_memory: true,
        };

        Self {
            duration_ms: default_duration_ms(),
            tasks: vec![
                TaskSpec {
                    name: "busy".to_string(),
                    period_ns: 1_000_000,
                    offset_ns: 700,
                    tolerance: 0.005,
                    sample_capacity: default_sample_capacity(),
                    mode: ModeSpec::Busy {
                        step_sleep: 150,
                        lazy_sleep_ns: None,
                    },
                    rt: rt(SchedulingSpec::RoundRobin, 0),
                    workload: WorkloadSpec::Sine { data: busy_data },
                },
                TaskSpec {
                    name: "sleep".to_string(),
                    period_ns: 7_500_000,
                    offset_ns: 700,
                    tolerance: 0.005,
                    sample_capacity: default_sample_capacity(),
                    mode: ModeSpec::Sleep,
                    rt: rt(SchedulingSpec::Fifo, 1),
                    workload: WorkloadSpec::Sine { data: sleep_data },
                },
            ],
        }
    }
}
