//! Parsers for raw text returned by the device shell.
//!
//! These are pure functions that turn the loosely-structured output of
//! `dumpsys`, `/proc` reads and other shell commands into typed values.
//! They are designed to be easily testable with string inputs: malformed
//! input degrades to `None`, it never panics.

use std::collections::HashMap;

/// Extracts the battery temperature in °C from a `dumpsys battery` dump.
///
/// Scans for a case-insensitive `temperature:` line; the reported value is
/// in tenths of a degree Celsius. Returns `None` if no such line exists or
/// the value is not numeric.
pub fn parse_battery_temperature(content: &str) -> Option<f64> {
    for line in content.lines() {
        let line = line.trim().to_lowercase();
        if let Some(value) = line.strip_prefix("temperature:")
            && let Ok(tenths) = value.trim().parse::<f64>()
        {
            return Some(tenths / 10.0);
        }
    }
    None
}

/// Normalizes a raw thermal-zone or power-supply node reading to °C.
///
/// Source conventions differ by vendor, so the unit is guessed from the
/// magnitude: values above 1000 are millidegrees, values above 100 are
/// tenths, anything else is already whole degrees. The thresholds are
/// deliberately kept at `>1000` / `>100` to match observed device behavior,
/// ambiguous boundary readings and all.
pub fn parse_raw_temperature(content: &str) -> Option<f64> {
    let value: f64 = content.trim().parse().ok()?;
    if value > 1000.0 {
        Some(value / 1000.0)
    } else if value > 100.0 {
        Some(value / 10.0)
    } else {
        Some(value)
    }
}

/// Parses `/proc/meminfo` content into a key → kB map.
///
/// Each line has the shape `KEY: <number> [unit]`; the first integer run of
/// the value part is taken. Unknown or malformed lines are skipped.
pub fn parse_meminfo(content: &str) -> HashMap<String, f64> {
    let mut info = HashMap::new();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        if let Some(num) = first_integer_run(value) {
            info.insert(key.trim().to_string(), num);
        }
    }
    info
}

/// Returns the first contiguous run of ASCII digits in `s` as a float.
fn first_integer_run(s: &str) -> Option<f64> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Parses `/proc/stat` content into `(total_ticks, core_count)`.
///
/// The aggregate `cpu ` line sums all of its counter fields; per-core lines
/// (`cpu0`, `cpu1`, …) are counted to determine the core count, minimum 1.
pub fn parse_cpu_total(content: &str) -> (f64, u32) {
    let mut total = 0.0;
    let mut cores = 0u32;

    for line in content.lines() {
        if let Some(counters) = line.strip_prefix("cpu ") {
            total = counters
                .split_whitespace()
                .filter_map(|s| s.parse::<f64>().ok())
                .sum();
        } else if let Some(rest) = line.strip_prefix("cpu")
            && rest
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit())
        {
            cores += 1;
        }
    }

    (total, cores.max(1))
}

/// Sums the CPU tick counters of a `/proc/[pid]/stat` record.
///
/// The comm field may contain spaces and parentheses, so fields are split
/// after the *last* `)`. Offsets 11..=14 of the remainder are utime, stime,
/// cutime and cstime. Returns `None` on malformed input.
pub fn parse_process_ticks(content: &str) -> Option<f64> {
    let rest = match content.rfind(')') {
        Some(pos) => content.get(pos + 1..).unwrap_or(""),
        None => content,
    };
    let fields: Vec<&str> = rest.split_whitespace().collect();

    let mut sum = 0.0;
    for idx in 11..=14 {
        sum += fields.get(idx)?.parse::<f64>().ok()?;
    }
    Some(sum)
}

/// Converts `/proc/[pid]/statm` page counts to `(virt_mb, res_mb, shr_mb)`.
///
/// The first three whitespace-separated fields are total/resident/shared
/// program size in pages; each is multiplied by the page size in kB and
/// converted to MB.
pub fn parse_statm(content: &str, page_kb: f64) -> Option<(f64, f64, f64)> {
    let mut fields = content.split_whitespace();
    let size: f64 = fields.next()?.parse().ok()?;
    let resident: f64 = fields.next()?.parse().ok()?;
    let shared: f64 = fields.next()?.parse().ok()?;

    Some((
        size * page_kb / 1024.0,
        resident * page_kb / 1024.0,
        shared * page_kb / 1024.0,
    ))
}

/// Extracts the first pid from `pidof` output.
pub fn parse_pidof(content: &str) -> Option<u32> {
    content
        .split_whitespace()
        .find(|tok| !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit()))
        .and_then(|tok| tok.parse().ok())
}

/// Scans a `ps -A` style process listing for a line containing `needle`.
///
/// On a matching line the first all-digit column is taken as the pid; the
/// first matching line wins, with no further tie-breaking.
pub fn parse_ps_listing(content: &str, needle: &str) -> Option<u32> {
    for line in content.lines() {
        if !line.contains(needle) {
            continue;
        }
        if let Some(pid) = line
            .split_whitespace()
            .find(|tok| !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit()))
            .and_then(|tok| tok.parse().ok())
        {
            return Some(pid);
        }
    }
    None
}

/// Parses `getconf PAGESIZE` output into a page size in kB.
pub fn parse_page_size_kb(content: &str) -> Option<f64> {
    let bytes: f64 = content.trim().parse().ok()?;
    let kb = bytes / 1024.0;
    (kb > 0.0).then_some(kb)
}

/// Parses `adb devices` output into a list of connected serials.
///
/// The banner line is skipped; only entries whose state column reads
/// `device` are kept (unauthorized/offline devices are not usable).
pub fn parse_device_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            (parts.next()? == "device").then(|| serial.to_string())
        })
        .collect()
}
