//! Main collector that combines the system and process collectors.
//!
//! One call to [`Collector::collect_sample`] performs one sampling round
//! and always produces a `Sample`: failures surface as absent fields and
//! error messages, never as an aborted round.

use chrono::{DateTime, Local};

use crate::collector::process::ProcessCollector;
use crate::collector::system::SystemCollector;
use crate::collector::traits::RemoteShell;
use crate::rates::CpuRateState;
use crate::storage::model::{Sample, SystemMemorySample};

/// Orchestrates one sampling round per tick.
///
/// Owns the CPU rate state; the scheduling model guarantees one round in
/// flight at a time, so no synchronization is needed around it.
pub struct Collector<S: RemoteShell + Clone> {
    system: SystemCollector<S>,
    process: ProcessCollector<S>,
    package: Option<String>,
    rates: CpuRateState,
}

impl<S: RemoteShell + Clone> Collector<S> {
    /// Creates a collector for one device.
    ///
    /// # Arguments
    /// * `shell` - Device command channel (real or mock)
    /// * `package` - Optional package whose process is tracked
    pub fn new(shell: S, package: Option<String>) -> Self {
        Self {
            system: SystemCollector::new(shell.clone()),
            process: ProcessCollector::new(shell),
            package,
            rates: CpuRateState::new(),
        }
    }

    /// Runs one sampling round.
    ///
    /// Temperature is read first; a wholly unreadable temperature or memory
    /// source becomes the round error (temperature taking precedence), with
    /// the rest of the sample kept best-effort. Process metrics are only
    /// collected when a package is configured, and their failures stay
    /// inside [`crate::storage::model::ProcessMetrics::error`].
    pub fn collect_sample(&mut self, now: DateTime<Local>) -> Sample {
        let mut round_error = None;

        let temperature_c = match self.system.temperature() {
            Ok(t) => Some(t),
            Err(e) => {
                round_error = Some(e.to_string());
                None
            }
        };

        let system_memory = match self.system.system_memory() {
            Ok(mem) => mem,
            Err(e) => {
                if round_error.is_none() {
                    round_error = Some(e.to_string());
                }
                SystemMemorySample::default()
            }
        };

        let process = self
            .package
            .as_ref()
            .map(|pkg| self.process.collect(pkg, system_memory.total_kb, &mut self.rates));

        Sample {
            timestamp_local: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp_iso8601: now.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            temperature_c,
            system_memory,
            process,
            error: round_error,
        }
    }

    /// Drops the CPU baseline, as after a stop/start of the session.
    pub fn reset_rates(&mut self) {
        self.rates.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockShell, SCENARIO_PACKAGE};

    fn now() -> DateTime<Local> {
        "2026-08-07T10:02:30+08:00"
            .parse::<DateTime<Local>>()
            .unwrap()
    }

    #[test]
    fn round_without_package_leaves_process_absent() {
        let mut collector = Collector::new(MockShell::typical_device(), None);
        let sample = collector.collect_sample(now());

        assert_eq!(sample.temperature_c, Some(35.2));
        assert_eq!(sample.system_memory.total_kb, 4_000_000.0);
        assert_eq!(sample.system_memory.used_kb, 3_000_000.0);
        assert_eq!(sample.process, None);
        assert_eq!(sample.error, None);

        // The CSV projection has empty process cells and no error message.
        let row = sample.csv_row();
        assert!(row.contains(",4000000,3000000,1000000,,,,,,,"));
        assert!(row.ends_with(","));
    }

    #[test]
    fn round_with_package_tracks_process() {
        let mut collector = Collector::new(
            MockShell::typical_device(),
            Some(SCENARIO_PACKAGE.to_string()),
        );
        let sample = collector.collect_sample(now());

        let process = sample.process.unwrap();
        assert_eq!(process.pid, Some(1234));
        assert_eq!(process.res_mb, Some(500.0));
        assert_eq!(process.cpu_percent, None);

        // The baseline survives into the next round.
        let again = collector.collect_sample(now());
        assert!(again.process.unwrap().cpu_percent.is_some());
    }

    #[test]
    fn temperature_failure_becomes_round_error() {
        let mut collector = Collector::new(MockShell::device_without_thermal_nodes(), None);
        let sample = collector.collect_sample(now());

        assert_eq!(sample.temperature_c, None);
        assert!(sample.error.as_deref().unwrap().contains("temperature"));
        // Memory is still collected best-effort.
        assert_eq!(sample.system_memory.used_kb, 3_000_000.0);
    }

    #[test]
    fn memory_failure_zeroes_memory_and_sets_error() {
        let shell = MockShell::typical_device();
        shell.set_failure(&["cat", "/proc/meminfo"], "device offline");

        let mut collector = Collector::new(shell, None);
        let sample = collector.collect_sample(now());

        assert_eq!(sample.system_memory, SystemMemorySample::default());
        assert_eq!(sample.error.as_deref(), Some("device offline"));
        // Temperature was read before memory failed.
        assert_eq!(sample.temperature_c, Some(35.2));
    }

    #[test]
    fn temperature_error_takes_precedence() {
        let shell = MockShell::device_without_thermal_nodes();
        shell.set_failure(&["cat", "/proc/meminfo"], "device offline");

        let mut collector = Collector::new(shell, None);
        let sample = collector.collect_sample(now());
        assert!(sample.error.as_deref().unwrap().contains("temperature"));
    }

    #[test]
    fn reset_rates_forces_new_baseline() {
        let mut collector = Collector::new(
            MockShell::typical_device(),
            Some(SCENARIO_PACKAGE.to_string()),
        );
        collector.collect_sample(now());
        collector.reset_rates();

        let sample = collector.collect_sample(now());
        assert_eq!(sample.process.unwrap().cpu_percent, None);
    }

    #[test]
    fn timestamps_are_formatted() {
        let mut collector = Collector::new(MockShell::typical_device(), None);
        let sample = collector.collect_sample(now());

        assert_eq!(sample.timestamp_local.len(), 19);
        assert!(sample.timestamp_iso8601.contains('T'));
    }
}
