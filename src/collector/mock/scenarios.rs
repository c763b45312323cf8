//! Pre-built mock device scenarios for testing.
//!
//! These scenarios provide realistic shell outputs for various device
//! conditions: a healthy phone, vendors without a battery dump, devices
//! with no readable thermal source at all.

use super::MockShell;

/// Package name used by the scenarios that track a process.
pub const SCENARIO_PACKAGE: &str = "com.example.app";

/// Pid the scenarios report for [`SCENARIO_PACKAGE`].
pub const SCENARIO_PID: u32 = 1234;

const MEMINFO: &str = "\
MemTotal:        4000000 kB
MemFree:          600000 kB
MemAvailable:    1000000 kB
Buffers:           80000 kB
Cached:           900000 kB
SwapTotal:       1048576 kB
SwapFree:        1048576 kB
";

const PROC_STAT: &str = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
ctxt 500000
btime 1700000000
processes 10000
";

const BATTERY_DUMP: &str = "\
Current Battery Service state:
  AC powered: false
  USB powered: true
  Max charging current: 500000
  status: 2
  health: 2
  level: 87
  scale: 100
  voltage: 4123
  temperature: 352
  technology: Li-ion
";

impl MockShell {
    /// A healthy device: battery dump with temperature, meminfo, and a
    /// running [`SCENARIO_PACKAGE`] process with 4 kB pages.
    pub fn typical_device() -> Self {
        let shell = Self::new();
        shell.set_output(&["dumpsys", "battery"], BATTERY_DUMP);
        shell.set_output(&["cat", "/proc/meminfo"], MEMINFO);
        shell.set_output(&["cat", "/proc/stat"], PROC_STAT);
        shell.set_output(&["getconf", "PAGESIZE"], "4096\n");
        shell.set_output(&["pidof", SCENARIO_PACKAGE], "1234\n");
        shell.set_output(
            &["cat", "/proc/1234/statm"],
            "256000 128000 32000 180 0 120000 0\n",
        );
        shell.set_output(
            &["cat", "/proc/1234/stat"],
            "1234 (com.example.app) S 612 612 0 0 -1 1077936448 80000 0 50 0 1000 500 200 100 20 0 32 0 40000 900000000 32000 18446744073709551615 1 1 0 0 0 0 0 4612 34040 0 0 0 17 3 0 0 0 0 0 0 0 0 0 0 0 0 0\n",
        );
        shell
    }

    /// A vendor build whose `dumpsys battery` has no temperature line; the
    /// first thermal zone is readable and reports millidegrees.
    pub fn device_without_battery_temperature() -> Self {
        let shell = Self::typical_device();
        shell.set_output(
            &["dumpsys", "battery"],
            "Current Battery Service state:\n  level: 87\n",
        );
        shell.set_output(&["cat", "/sys/class/thermal/thermal_zone0/temp"], "42500\n");
        shell
    }

    /// A device with no readable temperature source at all.
    pub fn device_without_thermal_nodes() -> Self {
        let shell = Self::typical_device();
        shell.set_output(
            &["dumpsys", "battery"],
            "Current Battery Service state:\n  level: 87\n",
        );
        shell
    }

    /// A device with no tracked process running (pidof empty, ps without a
    /// matching line).
    pub fn device_without_target_process() -> Self {
        let shell = Self::typical_device();
        shell.set_failure(&["pidof", SCENARIO_PACKAGE], "");
        shell.set_output(
            &["ps", "-A"],
            "USER  PID  PPID  VSZ  RSS  WCHAN  ADDR S NAME\nroot  1    0     100  80   0      0    S init\n",
        );
        shell
    }
}
