//! Integration tests for the scheduler crate.
//!
//! These run real task threads against the system clock. Thread control is
//! either `NoopThreadControl` or a recording double, so no privileges are
//! needed.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use taskcycle_scheduler::{
    BusyWait, DeadlineAttr, DeadlineParams, NoopThreadControl, PeriodicTask, RTError, RTResult,
    RTSetup, RealtimeThreadControl, RtOp, SchedulingClass, TaskConfig, TaskMode, TaskState,
};
use taskcycle_test_helpers::prelude::*;

fn config(name: &str, period_ns: u64) -> TaskConfig {
    TaskConfig::new(name, period_ns)
        .with_rt_setup(RTSetup::minimal())
        .with_sample_capacity(32)
}

/// Records every request and refuses the ones it is told to.
#[derive(Clone, Default)]
struct ScriptedControl {
    calls: Arc<Mutex<Vec<String>>>,
    refuse_scheduler: bool,
    refuse_deadline: bool,
}

impl ScriptedControl {
    fn log(&self, entry: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(entry);
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl RealtimeThreadControl for ScriptedControl {
    fn online_cpus(&self) -> usize {
        2
    }

    fn set_affinity(&self, cpu: usize) -> RTResult {
        self.log(format!("affinity {cpu}"));
        Ok(())
    }

    fn max_priority(&self, _class: SchedulingClass) -> RTResult<i32> {
        Ok(99)
    }

    fn set_scheduler(&self, class: SchedulingClass, priority: i32) -> RTResult {
        if self.refuse_scheduler {
            return Err(RTError::Os {
                op: RtOp::Scheduler,
                errno: 1,
            });
        }
        self.log(format!("scheduler {class:?} {priority}"));
        Ok(())
    }

    fn set_nice(&self, nice: i32) -> RTResult {
        self.log(format!("nice {nice}"));
        Ok(())
    }

    fn set_timer_slack(&self, slack_ns: u64) -> RTResult {
        self.log(format!("slack {slack_ns}"));
        Ok(())
    }

    fn lock_memory(&self) -> RTResult {
        self.log("mlock".to_string());
        Ok(())
    }

    fn set_deadline(&self, attr: &DeadlineAttr) -> RTResult {
        if self.refuse_deadline {
            return Err(RTError::Os {
                op: RtOp::Deadline,
                errno: 1,
            });
        }
        self.log(format!(
            "deadline {} {} {}",
            attr.runtime_ns, attr.deadline_ns, attr.period_ns
        ));
        Ok(())
    }

    fn yield_now(&self) {
        thread::yield_now();
    }
}

#[test]
fn test_sleep_task_runs_and_joins() {
    let calls = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&calls);

    let task = must(PeriodicTask::start_with(
        config("sleeper", 1_000_000),
        move || {
            counter.fetch_add(1, Ordering::Relaxed);
        },
        NoopThreadControl,
    ));

    thread::sleep(Duration::from_millis(50));
    assert_eq!(task.state(), TaskState::Running);

    task.request_stop();
    let report = must_with(task.join(), "joining ticker");

    assert_eq!(report.final_state, TaskState::Terminated);
    assert_eq!(report.cycle.iterations, calls.load(Ordering::Relaxed));
    assert!(report.cycle.iterations >= 10, "{} iterations", report.cycle.iterations);
    assert!(report.error.is_none());

    // Absolute deadlines: no cycle completes before its period.
    for sample in report.samples.samples() {
        assert!(*sample >= 1_000_000.0, "cycle of {sample} ns");
    }
}

#[test]
fn test_busy_task_never_wakes_early() {
    let task = must(PeriodicTask::start_with(
        config("spinner", 500_000)
            .with_mode(TaskMode::Busy(BusyWait::new(100).with_lazy_sleep_ns(300_000))),
        || {},
        NoopThreadControl,
    ));

    thread::sleep(Duration::from_millis(30));
    task.request_stop();
    let report = must(task.join());

    assert!(report.cycle.iterations > 0);
    assert!(!report.cycle.current.before(&report.cycle.deadline));
    for sample in report.samples.samples() {
        assert!(*sample >= 500_000.0, "cycle of {sample} ns");
    }
}

#[test]
fn test_stop_from_callback_ends_after_that_iteration() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let stop = Arc::new(Mutex::new(None::<taskcycle_scheduler::StopHandle>));
    let stop_in_callback = Arc::clone(&stop);

    let task = must(PeriodicTask::start_with(
        config("self-stopping", 200_000),
        move || {
            if counter.fetch_add(1, Ordering::Relaxed) + 1 >= 10
                && let Ok(guard) = stop_in_callback.lock()
                && let Some(handle) = guard.as_ref()
            {
                handle.request_stop();
            }
        },
        NoopThreadControl,
    ));
    if let Ok(mut slot) = stop.lock() {
        *slot = Some(task.stop_handle());
    }

    let report = must(task.join());

    // The handle may be installed after the tenth call on a slow machine.
    let total = calls.load(Ordering::Relaxed);
    assert_eq!(report.cycle.iterations, u64::from(total));
    assert!(total >= 10);
}

#[test]
fn test_rt_setup_failures_are_reported_not_fatal() {
    let control = ScriptedControl {
        refuse_scheduler: true,
        ..ScriptedControl::default()
    };
    let setup = RTSetup::default().with_cpu_affinity(0).with_nice(-5);

    let task = must(PeriodicTask::start_with(
        config("degraded", 1_000_000).with_rt_setup(setup),
        || {},
        control.clone(),
    ));
    thread::sleep(Duration::from_millis(10));
    task.request_stop();
    let report = must(task.join());

    assert!(report.error.is_none());
    assert!(report.cycle.iterations > 0);
    assert_eq!(
        report.setup.failed,
        vec![RTError::Os {
            op: RtOp::Scheduler,
            errno: 1
        }]
    );
    assert_eq!(
        control.calls(),
        vec![
            "affinity 1".to_string(),
            "nice -5".to_string(),
            "slack 1".to_string(),
            "mlock".to_string(),
        ]
    );
}

#[test]
fn test_deadline_install_failure_is_fatal() {
    let control = ScriptedControl {
        refuse_deadline: true,
        ..ScriptedControl::default()
    };
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);

    let task = must(PeriodicTask::start_with(
        config("deadline", 1_000_000).with_mode(TaskMode::Deadline(DeadlineParams::new(100_000))),
        move || {
            counter.fetch_add(1, Ordering::Relaxed);
        },
        control,
    ));

    let report = must(task.join());

    assert_eq!(calls.load(Ordering::Relaxed), 0);
    assert!(report.samples.is_empty());
    assert_eq!(report.cycle.iterations, 0);
    assert_eq!(
        report.error,
        Some(RTError::Os {
            op: RtOp::Deadline,
            errno: 1
        })
    );
    assert!(report.summary().is_err_and(|e| e.to_string().contains("empty")));
}

#[test]
fn test_deadline_task_runs_with_installed_policy() {
    let control = ScriptedControl::default();
    let task = must(PeriodicTask::start_with(
        config("deadline-ok", 1_000_000).with_mode(TaskMode::Deadline(
            DeadlineParams::new(100_000).with_deadline_ns(400_000),
        )),
        || {},
        control.clone(),
    ));

    thread::sleep(Duration::from_millis(10));
    let running_before_stop = task.is_running();
    task.request_stop();
    let report = must(task.join());

    assert!(running_before_stop);
    assert!(report.error.is_none());
    assert!(report.cycle.iterations > 0);
    assert_eq!(control.calls(), vec!["deadline 100000 400000 1000000".to_string()]);
}

#[test]
fn test_loaded_callback_keeps_period() {
    // The 300 µs callback is absorbed by the absolute deadline.
    let task = must(PeriodicTask::start_with(
        config("loaded", 1_000_000).with_tolerance(0.5),
        || thread::sleep(Duration::from_micros(300)),
        NoopThreadControl,
    ));

    thread::sleep(Duration::from_millis(100));
    task.request_stop();
    let report = must(task.join());

    let summary = must(report.summary());
    assert!(summary.mean >= 1_000_000.0);
    assert_eq!(report.cycle.corrections, 0);
    assert_eq!(report.cycle.period_cmp_ns, 1_000_000);
}
