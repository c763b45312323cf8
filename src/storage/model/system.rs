//! System-wide memory counters sampled from the device.

use serde::Serialize;

/// Memory totals for the whole device, in kB.
///
/// Source: `/proc/meminfo` read over the device shell.
///
/// `free_kb` is `MemAvailable` when the kernel reports it, otherwise the
/// `MemFree + Cached + Buffers` estimate. `used_kb` is derived and never
/// negative: `max(total_kb - free_kb, 0)`.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct SystemMemorySample {
    pub total_kb: f64,
    pub free_kb: f64,
    pub used_kb: f64,
}

impl SystemMemorySample {
    /// Builds a sample from raw total/free counters, deriving `used_kb`.
    pub fn from_counters(total_kb: f64, free_kb: f64) -> Self {
        Self {
            total_kb,
            free_kb,
            used_kb: (total_kb - free_kb).max(0.0),
        }
    }

    /// Used share of total memory, `None` when the total is unknown.
    pub fn used_percent(&self) -> Option<f64> {
        (self.total_kb > 0.0).then(|| self.used_kb / self.total_kb * 100.0)
    }
}
