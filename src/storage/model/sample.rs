//! The per-round sample record and its CSV projection.

use serde::Serialize;

use super::process::ProcessMetrics;
use super::system::SystemMemorySample;

/// Fixed header written at the top of every log file.
pub const CSV_HEADER: &str = "timestamp_local,timestamp_iso8601,sys_total_kb,sys_used_kb,\
sys_free_kb,proc_pid,proc_virt_mb,proc_res_mb,proc_shr_mb,proc_cpu_percent,proc_mem_percent,\
error_message";

/// One sampling round, immutable once built.
///
/// `error` carries the round-dominant failure (temperature or memory wholly
/// unreadable); per-process failures stay inside `process.error`. The
/// temperature feeds the status surface and JSON emit only; the CSV row
/// layout does not include it.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Sample {
    pub timestamp_local: String,
    pub timestamp_iso8601: String,
    pub temperature_c: Option<f64>,
    pub system_memory: SystemMemorySample,
    pub process: Option<ProcessMetrics>,
    pub error: Option<String>,
}

impl Sample {
    /// Renders the fixed 12-column CSV row.
    ///
    /// kB totals and the pid are plain integers, sizes and percentages get
    /// one decimal place, absent values render as empty cells. The error
    /// column takes the round error when present, otherwise the process
    /// error.
    pub fn csv_row(&self) -> String {
        let proc = self.process.as_ref();
        let error = self
            .error
            .as_deref()
            .or_else(|| proc.and_then(|p| p.error.as_deref()))
            .unwrap_or("");

        [
            self.timestamp_local.clone(),
            self.timestamp_iso8601.clone(),
            format!("{}", self.system_memory.total_kb as i64),
            format!("{}", self.system_memory.used_kb as i64),
            format!("{}", self.system_memory.free_kb as i64),
            opt_int(proc.and_then(|p| p.pid)),
            opt_f1(proc.and_then(|p| p.virt_mb)),
            opt_f1(proc.and_then(|p| p.res_mb)),
            opt_f1(proc.and_then(|p| p.shr_mb)),
            opt_f1(proc.and_then(|p| p.cpu_percent)),
            opt_f1(proc.and_then(|p| p.mem_percent)),
            csv_escape(error),
        ]
        .join(",")
    }
}

fn opt_int(v: Option<u32>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}

fn opt_f1(v: Option<f64>) -> String {
    v.map(|n| format!("{:.1}", n)).unwrap_or_default()
}

/// Quotes a cell when it contains CSV metacharacters.
fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_without_process() -> Sample {
        Sample {
            timestamp_local: "2026-08-07 10:02:30".to_string(),
            timestamp_iso8601: "2026-08-07T10:02:30+08:00".to_string(),
            temperature_c: Some(35.2),
            system_memory: SystemMemorySample::from_counters(4_000_000.0, 1_000_000.0),
            process: None,
            error: None,
        }
    }

    #[test]
    fn header_has_twelve_columns() {
        assert_eq!(CSV_HEADER.split(',').count(), 12);
    }

    #[test]
    fn row_without_process_has_empty_proc_cells() {
        let row = sample_without_process().csv_row();
        assert_eq!(
            row,
            "2026-08-07 10:02:30,2026-08-07T10:02:30+08:00,4000000,3000000,1000000,,,,,,,"
        );
        assert_eq!(row.split(',').count(), 12);
    }

    #[test]
    fn row_formats_fractions_to_one_decimal() {
        let mut sample = sample_without_process();
        sample.process = Some(ProcessMetrics {
            pid: Some(1234),
            virt_mb: Some(1000.0),
            res_mb: Some(500.26),
            shr_mb: Some(125.0),
            cpu_percent: Some(40.0),
            mem_percent: Some(12.8),
            error: None,
        });

        let row = sample.csv_row();
        assert!(row.ends_with(",1234,1000.0,500.3,125.0,40.0,12.8,"));
    }

    #[test]
    fn round_error_wins_over_process_error() {
        let mut sample = sample_without_process();
        sample.process = Some(ProcessMetrics::from_error("process not found"));
        sample.error = Some("no readable temperature source".to_string());

        assert!(sample.csv_row().ends_with(",no readable temperature source"));
    }

    #[test]
    fn process_error_used_when_no_round_error() {
        let mut sample = sample_without_process();
        sample.process = Some(ProcessMetrics::from_error("process not found"));

        assert!(sample.csv_row().ends_with(",process not found"));
    }

    #[test]
    fn error_cell_is_quoted_when_needed() {
        let mut sample = sample_without_process();
        sample.error = Some("adb: device \"X\" offline, retry".to_string());

        let row = sample.csv_row();
        assert!(row.ends_with(",\"adb: device \"\"X\"\" offline, retry\""));
    }
}
