//! Per-process metrics for the tracked package.

use serde::Serialize;

/// Metrics for the tracked process, all independently optional.
///
/// Partial data is valid: a failed sub-step leaves the fields obtained so
/// far in place and records the failure in `error`. Sizes come from
/// `/proc/[pid]/statm` (pages × page size), CPU% from `/proc` tick deltas,
/// MEM% is resident size over the system total.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct ProcessMetrics {
    pub pid: Option<u32>,
    pub virt_mb: Option<f64>,
    pub res_mb: Option<f64>,
    pub shr_mb: Option<f64>,
    pub cpu_percent: Option<f64>,
    pub mem_percent: Option<f64>,
    pub error: Option<String>,
}

impl ProcessMetrics {
    /// Metrics carrying nothing but a failure message.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}
