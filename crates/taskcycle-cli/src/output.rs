//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use serde_json::{Value, json};
use taskcycle_scheduler::{RTError, TaskReport};
use taskcycle_stats::DistributionSummary;

use crate::config::RunConfig;
use crate::error::CliError;

/// A finished task together with its workload's last value.
#[derive(Debug)]
pub struct TaskOutcome {
    pub report: TaskReport,
    pub workload_result: f64,
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format error as JSON: {}", e),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    error
        .downcast_ref::<CliError>()
        .map_or("internal", CliError::kind)
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to format output as JSON: {}", e),
    }
}

/// Print the results of a run.
pub fn print_run(outcomes: &[TaskOutcome], json: bool) {
    if json {
        let tasks: Vec<Value> = outcomes.iter().map(outcome_json).collect();
        print_json(&json!({
            "success": outcomes.iter().all(|o| o.report.error.is_none()),
            "tasks": tasks
        }));
        return;
    }

    for outcome in outcomes {
        print_outcome_human(outcome);
    }
}

fn outcome_json(outcome: &TaskOutcome) -> Value {
    let report = &outcome.report;
    let summary = if report.samples.is_empty() {
        None
    } else {
        report.summary().ok()
    };

    json!({
        "name": report.name,
        "period_ns": report.period_ns,
        "state": report.final_state.to_string(),
        "iterations": report.cycle.iterations,
        "corrections": report.cycle.corrections,
        "period_cmp_ns": report.cycle.period_cmp_ns,
        "setup": {
            "applied": report.setup.applied.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "failed": report.setup.failed.iter().map(failure_json).collect::<Vec<_>>(),
        },
        "error": report.error.map(|e| e.to_string()),
        "summary": summary,
        "workload_result": outcome.workload_result,
    })
}

fn failure_json(failure: &RTError) -> Value {
    json!({
        "message": failure.to_string(),
        "permission_denied": failure.is_permission_denied(),
    })
}

fn privilege_hint(failure: &RTError) -> &'static str {
    if failure.is_permission_denied() {
        " (needs root or CAP_SYS_NICE / CAP_IPC_LOCK; --no-rt skips it)"
    } else {
        ""
    }
}

fn print_outcome_human(outcome: &TaskOutcome) {
    let report = &outcome.report;

    println!();
    println!("{} {}", "Task".bold(), report.name.cyan().bold());
    println!(
        "  state: {}, iterations: {}, corrections: {}, period_cmp: {} ns",
        report.final_state, report.cycle.iterations, report.cycle.corrections,
        report.cycle.period_cmp_ns
    );

    for failure in &report.setup.failed {
        println!("  {} {}{}", "rt setup:".yellow(), failure, privilege_hint(failure).dimmed());
    }
    if let Some(error) = report.error {
        println!("  {} {}", "failed:".red().bold(), error);
    }

    if report.samples.is_empty() {
        println!("  {}", "no cycles recorded".yellow());
        return;
    }

    match report.summary() {
        Ok(summary) => print_summary_human(&summary),
        Err(e) => println!("  {} {}", "statistics:".red(), e),
    }
    println!("  workload result: {:.6}", outcome.workload_result);
}

fn print_summary_human(summary: &DistributionSummary) {
    println!("  sample size:    {}", summary.size);
    println!(
        "  period:         {:.3} us ({:.3} Hz)",
        summary.target / 1e3,
        summary.target_frequency_hz()
    );
    println!(
        "  mean:           {:.3} us ({:.3} Hz)",
        summary.mean / 1e3,
        summary.mean_frequency_hz()
    );
    println!("  deviation:      {:.3} us", summary.standard_deviation / 1e3);
    println!("  periodic dev:   {:.3} us", summary.periodic_deviation / 1e3);
    println!("  min:            {:.3} us", summary.min / 1e3);
    println!("  max:            {:.3} us", summary.max / 1e3);
    println!("  diff min max:   {}", spread_text(summary));
    println!(
        "  % deviation:    {}",
        percent(summary.percent_periodic_deviation)
    );
    println!(
        "  % min/max:      {} / {}",
        percent(summary.percent_min),
        percent(summary.percent_max)
    );
}

/// `max - min` with both extremes' combined distance from the target.
fn spread_text(summary: &DistributionSummary) -> String {
    format!(
        "{:.3} us ({:.3}%)",
        summary.spread() / 1e3,
        summary.spread_percent() * 100.0
    )
}

fn percent(fraction: f64) -> ColoredString {
    let text = format!("{:.3}%", fraction * 100.0);
    if fraction <= 0.01 {
        text.green()
    } else if fraction <= 0.05 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Print a validated configuration summary.
pub fn print_validation(config: &RunConfig, json: bool) {
    if json {
        let tasks: Vec<Value> = config
            .tasks
            .iter()
            .map(|t| json!({ "name": t.name, "period_ns": t.period_ns, "mode": t.mode }))
            .collect();
        print_json(&json!({
            "success": true,
            "valid": true,
            "tasks": tasks
        }));
        return;
    }

    println!("{} Configuration is valid", "✓".green());
    for task in &config.tasks {
        println!(
            "  {} {} every {} ns",
            "•".cyan(),
            task.name.bold(),
            task.period_ns
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcycle_scheduler::RtOp;
    use taskcycle_stats::{SampleBuffer, summarize};
    use taskcycle_test_helpers::must;

    #[test]
    fn spread_is_max_minus_min_with_combined_percent() {
        let mut buffer = SampleBuffer::with_capacity(4);
        for sample in [900_000.0, 1_000_000.0, 1_050_000.0, 1_200_000.0] {
            must(buffer.push(sample));
        }
        let summary = must(summarize(&buffer, 1_000_000));

        assert_eq!(spread_text(&summary), "300.000 us (30.000%)");
    }

    #[test]
    fn permission_failures_are_flagged() {
        let denied = RTError::Os {
            op: RtOp::Scheduler,
            // EPERM
            errno: 1,
        };
        let refused = RTError::Unsupported(RtOp::Deadline);

        assert_eq!(failure_json(&denied)["permission_denied"], true);
        assert!(!privilege_hint(&denied).is_empty());
        assert_eq!(failure_json(&refused)["permission_denied"], false);
        assert_eq!(privilege_hint(&refused), "");
    }
}

