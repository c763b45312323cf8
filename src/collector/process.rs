//! Per-process metrics for the tracked package.

use crate::collector::parser::{
    parse_cpu_total, parse_page_size_kb, parse_pidof, parse_process_ticks, parse_ps_listing,
    parse_statm,
};
use crate::collector::traits::{AUX_TIMEOUT, CMD_TIMEOUT, RemoteShell, ShellError};
use crate::rates::{CpuRateState, mem_percent};
use crate::storage::model::ProcessMetrics;

/// Page size assumed when `getconf PAGESIZE` is unavailable.
const DEFAULT_PAGE_KB: f64 = 4.0;

/// Collects metrics for one process, looked up by package name each round.
pub struct ProcessCollector<S: RemoteShell> {
    shell: S,
}

impl<S: RemoteShell> ProcessCollector<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    /// Collects one round of process metrics.
    ///
    /// Sub-steps degrade independently: an unreadable `statm` leaves the
    /// sizes absent, a transport failure on the CPU counter reads records
    /// the failure in `error` and returns the fields obtained so far. Only
    /// an unresolvable pid short-circuits the round.
    pub fn collect(
        &self,
        package: &str,
        system_total_kb: f64,
        rates: &mut CpuRateState,
    ) -> ProcessMetrics {
        let Some(pid) = self.resolve_pid(package) else {
            return ProcessMetrics::from_error("process not found");
        };

        let mut metrics = ProcessMetrics {
            pid: Some(pid),
            ..ProcessMetrics::default()
        };

        let page_kb = self.page_size_kb();
        if let Some((virt, res, shr)) = self.statm_mb(pid, page_kb) {
            metrics.virt_mb = Some(virt);
            metrics.res_mb = Some(res);
            metrics.shr_mb = Some(shr);
        }

        match self.cpu_ticks(pid) {
            Ok((total_ticks, cores, process_ticks)) => {
                // The cache is updated even when the per-process reading is
                // missing (recorded as 0 ticks); the percent is only
                // reported when the current reading actually exists.
                let percent = rates.compute_cpu_percent(
                    pid,
                    total_ticks,
                    process_ticks.unwrap_or(0.0),
                    cores,
                );
                metrics.cpu_percent = process_ticks.and(percent);
            }
            Err(e) => {
                metrics.error = Some(e.to_string());
                return metrics;
            }
        }

        metrics.mem_percent = mem_percent(metrics.res_mb, system_total_kb);
        metrics
    }

    /// Resolves the pid for a package: `pidof` first, then a `ps -A` scan.
    pub fn resolve_pid(&self, package: &str) -> Option<u32> {
        if let Ok(out) = self.shell.run(&["pidof", package], AUX_TIMEOUT)
            && let Some(pid) = parse_pidof(&out)
        {
            return Some(pid);
        }

        if let Ok(out) = self.shell.run(&["ps", "-A"], CMD_TIMEOUT)
            && let Some(pid) = parse_ps_listing(&out, package)
        {
            return Some(pid);
        }

        None
    }

    /// Queries the device page size, defaulting to 4 kB.
    fn page_size_kb(&self) -> f64 {
        self.shell
            .run(&["getconf", "PAGESIZE"], AUX_TIMEOUT)
            .ok()
            .and_then(|out| parse_page_size_kb(&out))
            .unwrap_or(DEFAULT_PAGE_KB)
    }

    /// Reads `/proc/[pid]/statm` sizes in MB; absent on any failure.
    fn statm_mb(&self, pid: u32, page_kb: f64) -> Option<(f64, f64, f64)> {
        let path = format!("/proc/{}/statm", pid);
        self.shell
            .run(&["cat", &path], CMD_TIMEOUT)
            .ok()
            .and_then(|out| parse_statm(&out, page_kb))
    }

    /// Reads the system-wide and per-process CPU counters.
    ///
    /// Transport failures propagate (they fail the CPU step of the round); a
    /// malformed per-process record degrades to `None` ticks.
    fn cpu_ticks(&self, pid: u32) -> Result<(f64, u32, Option<f64>), ShellError> {
        let stat = self.shell.run(&["cat", "/proc/stat"], CMD_TIMEOUT)?;
        let (total_ticks, cores) = parse_cpu_total(&stat);

        let path = format!("/proc/{}/stat", pid);
        let pid_stat = self.shell.run(&["cat", &path], CMD_TIMEOUT)?;

        Ok((total_ticks, cores, parse_process_ticks(&pid_stat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockShell, SCENARIO_PACKAGE, SCENARIO_PID};

    #[test]
    fn collects_sizes_and_mem_percent() {
        let collector = ProcessCollector::new(MockShell::typical_device());
        let mut rates = CpuRateState::new();

        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert_eq!(m.pid, Some(SCENARIO_PID));
        assert_eq!(m.virt_mb, Some(1000.0));
        assert_eq!(m.res_mb, Some(500.0));
        assert_eq!(m.shr_mb, Some(125.0));
        assert!((m.mem_percent.unwrap() - 12.8).abs() < 1e-9);
        assert_eq!(m.error, None);
        // First round only establishes the CPU baseline.
        assert_eq!(m.cpu_percent, None);
    }

    #[test]
    fn second_round_reports_cpu_percent() {
        let shell = MockShell::typical_device();
        let collector = ProcessCollector::new(shell.clone());
        let mut rates = CpuRateState::new();

        collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);

        // Total ticks 94800 -> 95800, process ticks 1800 -> 1900, 4 cores:
        // 100 / 1000 * 100 * 4 = 40%.
        shell.set_output(
            &["cat", "/proc/stat"],
            "cpu  11000 500 3000 80000 1000 200 100 0 0 0\n\
             cpu0 2750 125 750 20000 250 50 25 0 0 0\n\
             cpu1 2750 125 750 20000 250 50 25 0 0 0\n\
             cpu2 2750 125 750 20000 250 50 25 0 0 0\n\
             cpu3 2750 125 750 20000 250 50 25 0 0 0\n",
        );
        shell.set_output(
            &["cat", "/proc/1234/stat"],
            "1234 (com.example.app) S 612 612 0 0 -1 1077936448 80000 0 50 0 1050 550 200 100 20 0 32 0 40000 900000000 32000\n",
        );

        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert!((m.cpu_percent.unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn missing_process_reports_error_only() {
        let collector = ProcessCollector::new(MockShell::device_without_target_process());
        let mut rates = CpuRateState::new();

        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert_eq!(m.error.as_deref(), Some("process not found"));
        assert_eq!(m.pid, None);
        assert_eq!(m.res_mb, None);
    }

    #[test]
    fn pid_resolution_falls_back_to_ps_listing() {
        let shell = MockShell::typical_device();
        shell.set_failure(&["pidof", SCENARIO_PACKAGE], "");
        shell.set_output(
            &["ps", "-A"],
            "USER  PID  PPID VSZ RSS WCHAN ADDR S NAME\n\
             u0_a1 1234 612  900 500 0     0    S com.example.app\n",
        );

        let collector = ProcessCollector::new(shell);
        assert_eq!(collector.resolve_pid(SCENARIO_PACKAGE), Some(SCENARIO_PID));
    }

    #[test]
    fn unreadable_statm_leaves_sizes_absent() {
        let shell = MockShell::typical_device();
        shell.remove(&["cat", "/proc/1234/statm"]);

        let collector = ProcessCollector::new(shell);
        let mut rates = CpuRateState::new();

        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert_eq!(m.pid, Some(SCENARIO_PID));
        assert_eq!(m.virt_mb, None);
        assert_eq!(m.mem_percent, None);
        assert_eq!(m.error, None);
    }

    #[test]
    fn cpu_transport_failure_keeps_partial_fields() {
        let shell = MockShell::typical_device();
        shell.set_failure(&["cat", "/proc/stat"], "device offline");

        let collector = ProcessCollector::new(shell);
        let mut rates = CpuRateState::new();

        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert_eq!(m.pid, Some(SCENARIO_PID));
        assert_eq!(m.res_mb, Some(500.0));
        assert_eq!(m.error.as_deref(), Some("device offline"));
        assert_eq!(m.cpu_percent, None);
        assert_eq!(m.mem_percent, None);
    }

    #[test]
    fn default_page_size_when_getconf_fails() {
        let shell = MockShell::typical_device();
        shell.remove(&["getconf", "PAGESIZE"]);

        let collector = ProcessCollector::new(shell);
        let mut rates = CpuRateState::new();

        // Sizes still come out right because the default matches 4 kB pages.
        let m = collector.collect(SCENARIO_PACKAGE, 4_000_000.0, &mut rates);
        assert_eq!(m.res_mb, Some(500.0));
    }
}
