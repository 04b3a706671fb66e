//! Per-cycle workloads driven by the runner.

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::WorkloadSpec;

/// A workload callback plus the last value it produced.
///
/// The value is kept so the optimizer cannot drop the computation, and so
/// the runner can print it after the task stops.
#[derive(Debug, Clone)]
pub struct Workload {
    spec: WorkloadSpec,
    result: Arc<AtomicU64>,
}

impl Workload {
    pub fn new(spec: WorkloadSpec) -> Self {
        Self {
            spec,
            result: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    /// Callback to hand to the periodic task.
    pub fn callback(&self) -> Box<dyn FnMut() + Send + 'static> {
        let result = Arc::clone(&self.result);
        match self.spec.clone() {
            WorkloadSpec::Idle => Box::new(|| {}),
            WorkloadSpec::Sine { data } => Box::new(move || {
                let sum = sine_sum(black_box(&data));
                result.store(sum.to_bits(), Ordering::Relaxed);
            }),
            WorkloadSpec::Spin { duration_ns } => {
                let duration = Duration::from_nanos(duration_ns);
                Box::new(move || {
                    let started = Instant::now();
                    let mut spins = 0u64;
                    while started.elapsed() < duration {
                        spins = spins.wrapping_add(1);
                        std::hint::spin_loop();
                    }
                    result.store(spins, Ordering::Relaxed);
                })
            }
        }
    }

    /// Last value produced by the callback.
    ///
    /// Sine workloads report the sum; spin workloads the loop count.
    pub fn result(&self) -> f64 {
        let bits = self.result.load(Ordering::Relaxed);
        match self.spec {
            #[allow(clippy::cast_precision_loss, reason = "display only")]
            WorkloadSpec::Spin { .. } => bits as f64,
            WorkloadSpec::Idle | WorkloadSpec::Sine { .. } => f64::from_bits(bits),
        }
    }
}

fn sine_sum(data: &[f64]) -> f64 {
    data.iter().map(|v| v.sin()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcycle_test_helpers::assert_approx_eq;

    #[test]
    fn sine_workload_stores_sum() {
        let workload = Workload::new(WorkloadSpec::Sine {
            data: vec![0.5, 1.0, 1.5],
        });
        let mut callback = workload.callback();
        callback();

        let expected = 0.5f64.sin() + 1.0f64.sin() + 1.5f64.sin();
        assert_approx_eq!(workload.result(), expected, 1e-12_f64);
    }

    #[test]
    fn idle_workload_reports_zero() {
        let workload = Workload::new(WorkloadSpec::Idle);
        let mut callback = workload.callback();
        callback();
        assert_approx_eq!(workload.result(), 0.0_f64, f64::EPSILON);
    }

    #[test]
    fn spin_workload_takes_at_least_its_duration() {
        let workload = Workload::new(WorkloadSpec::Spin {
            duration_ns: 200_000,
        });
        let mut callback = workload.callback();

        let started = Instant::now();
        callback();
        assert!(started.elapsed() >= Duration::from_nanos(200_000));
        assert!(workload.result() >= 1.0);
    }
}
