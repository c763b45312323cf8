//! adbmond - Android device metrics sampling daemon.
//!
//! Samples temperature and memory state of one device over adb and appends
//! the derived metrics to time-bucketed CSV files with automatic retention.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use adbmon::collector::{AdbShell, Collector, list_devices};
use adbmon::storage::{CsvStorage, RotationConfig, Sample};

/// Sampling intervals below this are rejected before scheduling starts.
const MIN_INTERVAL_MS: u64 = 200;

/// Per-sample stdout output format.
#[derive(Clone, Copy, Debug, PartialEq, clap::ValueEnum)]
enum Emit {
    /// No stdout echo; samples go to the CSV log only.
    None,
    /// Echo each sample as a CSV row.
    Csv,
    /// Echo each sample as a JSON object.
    Json,
}

/// Device metrics sampling daemon.
#[derive(Parser)]
#[command(name = "adbmond", about = "Android device metrics sampling daemon", version)]
struct Args {
    /// Device serial. Defaults to the first device `adb devices` reports.
    #[arg(short, long)]
    serial: Option<String>,

    /// Package whose process is tracked (pid, sizes, CPU%, MEM%).
    #[arg(short, long)]
    package: Option<String>,

    /// Sampling interval in milliseconds (minimum 200).
    #[arg(short, long, default_value = "2000", value_parser = parse_interval_ms)]
    interval_ms: u64,

    /// Root directory for CSV logs.
    #[arg(short, long, default_value = "./logs")]
    log_root: String,

    /// Retention period in hours. Older files are removed.
    #[arg(long, default_value = "36")]
    retention_hours: u32,

    /// Disable CSV logging (sampling and pruning still run).
    #[arg(long)]
    no_log: bool,

    /// Echo each sample to stdout in the given format.
    #[arg(long, value_enum, default_value = "none")]
    emit: Emit,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses and validates the sampling interval.
fn parse_interval_ms(s: &str) -> Result<u64, String> {
    let ms: u64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if ms < MIN_INTERVAL_MS {
        return Err(format!(
            "interval must be at least {} ms, got {}",
            MIN_INTERVAL_MS, ms
        ));
    }
    Ok(ms)
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("adbmond={}", level).parse().unwrap())
        .add_directive(format!("adbmon={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves the device serial: explicit flag, else first connected device.
fn resolve_serial(args: &Args) -> Result<String, String> {
    if let Some(serial) = &args.serial {
        return Ok(serial.clone());
    }

    let devices = list_devices().map_err(|e| e.to_string())?;
    match devices.first() {
        Some(serial) => {
            if devices.len() > 1 {
                info!("{} devices connected, using {}", devices.len(), serial);
            }
            Ok(serial.clone())
        }
        None => Err("no device connected; check adb and the USB connection".to_string()),
    }
}

/// One-line status summary of a sample, mirroring the CSV row contents.
fn describe_sample(sample: &Sample) -> String {
    let mut parts: Vec<String> = Vec::new();

    match sample.temperature_c {
        Some(t) => parts.push(format!("temp={:.1}°C", t)),
        None => parts.push("temp=--".to_string()),
    }
    if let Some(pct) = sample.system_memory.used_percent() {
        parts.push(format!("mem={:.1}%", pct));
    }
    if let Some(proc) = &sample.process {
        if let Some(pid) = proc.pid {
            parts.push(format!("pid={}", pid));
        }
        if let Some(res) = proc.res_mb {
            parts.push(format!("res={:.1}MB", res));
        }
        if let Some(cpu) = proc.cpu_percent {
            parts.push(format!("cpu={:.1}%", cpu));
        }
    }
    if let Some(error) = sample
        .error
        .as_deref()
        .or_else(|| sample.process.as_ref().and_then(|p| p.error.as_deref()))
    {
        parts.push(format!("error={}", error));
    }

    parts.join(" ")
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("adbmond {} starting", env!("CARGO_PKG_VERSION"));

    let serial = match resolve_serial(&args) {
        Ok(serial) => serial,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Config: device={}, package={}, interval={}ms, logs={}",
        serial,
        args.package.as_deref().unwrap_or("-"),
        args.interval_ms,
        if args.no_log { "disabled" } else { args.log_root.as_str() }
    );
    info!("Retention policy: {}h", args.retention_hours);

    let shell = AdbShell::new(serial.as_str());
    let mut collector = Collector::new(shell, args.package.clone());

    let mut storage = CsvStorage::new(&args.log_root);
    let rotation_config = RotationConfig::new(args.retention_hours);

    let interval = Duration::from_millis(args.interval_ms);

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting sampling loop");

    let mut tick_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let now = Local::now();
        let sample = collector.collect_sample(now);
        tick_count += 1;

        info!("Sample #{}: {}", tick_count, describe_sample(&sample));

        match args.emit {
            Emit::None => {}
            Emit::Csv => println!("{}", sample.csv_row()),
            Emit::Json => {
                if let Ok(line) = serde_json::to_string(&sample) {
                    println!("{}", line);
                }
            }
        }

        // Persistence failures must not stop sampling; the next tick is
        // scheduled regardless of this round's outcome.
        if !args.no_log
            && let Err(e) = storage.append(&sample, &now)
        {
            error!("Failed to write log row: {}", e);
        }
        storage.prune(&now, &rotation_config);

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete after {} samples", tick_count);
}
