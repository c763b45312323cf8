//! CPU utilization derived from cumulative tick counters.
//!
//! This module is the single source of truth for rate computation: a CPU
//! percentage only exists as the delta between two counter snapshots, so the
//! state here tracks exactly one previous snapshot, for whichever pid was
//! queried last. Tracking a different pid discards the old baseline and the
//! next reading for it starts over.

/// Denominator floor, avoids division by zero when the total counter stalls.
const MIN_TOTAL_DELTA: f64 = 1e-6;

/// A point-in-time cumulative counter reading for one process and for the
/// whole system.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuCounterSnapshot {
    pub pid: u32,
    /// Ticks the process has consumed since boot (utime+stime+cutime+cstime).
    pub process_ticks: f64,
    /// Ticks the whole system has consumed since boot, summed over all
    /// counter columns of the aggregate `cpu` line.
    pub total_ticks: f64,
}

/// Single-entry cache of the previous CPU counter snapshot.
#[derive(Debug, Clone, Default)]
pub struct CpuRateState {
    prev: Option<CpuCounterSnapshot>,
}

impl CpuRateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the current counter reading into the cache and returns the CPU
    /// utilization over the elapsed window, if one can be computed.
    ///
    /// The first call for a given pid establishes the baseline and returns
    /// `None`. Counter regressions clamp to zero rather than going negative.
    /// The cache always ends up holding the current snapshot.
    pub fn compute_cpu_percent(
        &mut self,
        pid: u32,
        total_ticks: f64,
        process_ticks: f64,
        cores: u32,
    ) -> Option<f64> {
        let percent = match &self.prev {
            Some(prev) if prev.pid == pid => {
                let delta_proc = (process_ticks - prev.process_ticks).max(0.0);
                let delta_total = (total_ticks - prev.total_ticks).max(MIN_TOTAL_DELTA);
                Some(delta_proc / delta_total * 100.0 * cores as f64)
            }
            _ => None,
        };

        self.prev = Some(CpuCounterSnapshot {
            pid,
            process_ticks,
            total_ticks,
        });

        percent
    }

    /// Drops the cached baseline. The next reading for any pid starts over.
    pub fn reset(&mut self) {
        self.prev = None;
    }
}

/// Resident size as a share of system memory.
///
/// `None` when the resident size is unknown or the system total is zero.
pub fn mem_percent(res_mb: Option<f64>, system_total_kb: f64) -> Option<f64> {
    match res_mb {
        Some(res) if system_total_kb > 0.0 => Some(res * 1024.0 / system_total_kb * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_establishes_baseline() {
        let mut state = CpuRateState::new();
        assert_eq!(state.compute_cpu_percent(100, 5000.0, 40.0, 4), None);
    }

    #[test]
    fn second_sample_computes_percent() {
        let mut state = CpuRateState::new();
        state.compute_cpu_percent(100, 5000.0, 40.0, 4);

        // delta_proc = 50, delta_total = 500, 4 cores => 40%.
        let cpu = state.compute_cpu_percent(100, 5500.0, 90.0, 4).unwrap();
        assert!((cpu - 40.0).abs() < 1e-9);
    }

    #[test]
    fn counter_regression_clamps_to_zero() {
        let mut state = CpuRateState::new();
        state.compute_cpu_percent(100, 5000.0, 40.0, 2);

        let cpu = state.compute_cpu_percent(100, 5500.0, 10.0, 2);
        assert_eq!(cpu, Some(0.0));
    }

    #[test]
    fn stalled_total_does_not_divide_by_zero() {
        let mut state = CpuRateState::new();
        state.compute_cpu_percent(100, 5000.0, 40.0, 1);

        let cpu = state.compute_cpu_percent(100, 5000.0, 40.0, 1);
        assert_eq!(cpu, Some(0.0));
    }

    #[test]
    fn switching_pid_discards_baseline() {
        let mut state = CpuRateState::new();
        state.compute_cpu_percent(100, 5000.0, 40.0, 4);

        // A different pid resets the baseline...
        assert_eq!(state.compute_cpu_percent(200, 5500.0, 90.0, 4), None);
        // ...and so does switching back to the first pid.
        assert_eq!(state.compute_cpu_percent(100, 6000.0, 140.0, 4), None);
        assert!(state.compute_cpu_percent(100, 6500.0, 190.0, 4).is_some());
    }

    #[test]
    fn reset_forces_new_baseline() {
        let mut state = CpuRateState::new();
        state.compute_cpu_percent(100, 5000.0, 40.0, 4);
        state.reset();
        assert_eq!(state.compute_cpu_percent(100, 5500.0, 90.0, 4), None);
    }

    #[test]
    fn mem_percent_basic() {
        let pct = mem_percent(Some(500.0), 4_000_000.0).unwrap();
        assert!((pct - 12.8).abs() < 1e-9);
    }

    #[test]
    fn mem_percent_absent_inputs() {
        assert_eq!(mem_percent(None, 4_000_000.0), None);
        assert_eq!(mem_percent(Some(500.0), 0.0), None);
    }
}
