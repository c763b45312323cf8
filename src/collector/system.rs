//! Device-wide metrics: memory totals and temperature.

use crate::collector::parser::{parse_battery_temperature, parse_meminfo, parse_raw_temperature};
use crate::collector::traits::{CMD_TIMEOUT, RemoteShell, ShellError};
use crate::storage::model::SystemMemorySample;

/// Thermal nodes probed, in order, when the battery dump has no usable
/// temperature line. Readings are normalized by magnitude.
const FALLBACK_THERMAL_NODES: [&str; 3] = [
    "/sys/class/thermal/thermal_zone0/temp",
    "/sys/class/thermal/thermal_zone1/temp",
    "/sys/class/power_supply/battery/temp",
];

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// The device command channel failed.
    Shell(ShellError),
    /// Neither the battery dump nor any thermal node yielded a reading.
    NoTemperatureSource,
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Shell(e) => write!(f, "{}", e),
            CollectError::NoTemperatureSource => {
                write!(f, "no readable temperature source (dumpsys and thermal nodes all failed)")
            }
        }
    }
}

impl std::error::Error for CollectError {}

impl From<ShellError> for CollectError {
    fn from(e: ShellError) -> Self {
        CollectError::Shell(e)
    }
}

/// Collects device-wide metrics over the shell.
pub struct SystemCollector<S: RemoteShell> {
    shell: S,
}

impl<S: RemoteShell> SystemCollector<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    /// Reads system memory totals from `/proc/meminfo`.
    ///
    /// `MemAvailable` is preferred as the free figure; kernels that do not
    /// report it (or report 0) fall back to `MemFree + Cached + Buffers`.
    pub fn system_memory(&self) -> Result<SystemMemorySample, CollectError> {
        let content = self.shell.run(&["cat", "/proc/meminfo"], CMD_TIMEOUT)?;
        let info = parse_meminfo(&content);

        let get = |key: &str| info.get(key).copied().unwrap_or(0.0);
        let total = get("MemTotal");
        let mut free = get("MemAvailable");
        if free <= 0.0 {
            free = get("MemFree") + get("Cached") + get("Buffers");
        }

        Ok(SystemMemorySample::from_counters(total, free))
    }

    /// Reads the device temperature in °C.
    ///
    /// Primary source is the battery service dump; a transport failure there
    /// fails the round. When the dump parses but carries no temperature, the
    /// thermal fallback nodes are probed in order, and only when every node
    /// is unreadable does the round fail.
    pub fn temperature(&self) -> Result<f64, CollectError> {
        let dump = self.shell.run(&["dumpsys", "battery"], CMD_TIMEOUT)?;
        if let Some(temp) = parse_battery_temperature(&dump) {
            return Ok(temp);
        }

        for node in FALLBACK_THERMAL_NODES {
            if let Ok(raw) = self.shell.run(&["cat", node], CMD_TIMEOUT)
                && let Some(temp) = parse_raw_temperature(&raw)
            {
                return Ok(temp);
            }
        }

        Err(CollectError::NoTemperatureSource)
    }
}
