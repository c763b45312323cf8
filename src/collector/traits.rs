//! Abstraction over the device command channel.
//!
//! The `RemoteShell` trait allows the collectors to run against a real
//! device through the `adb` binary or against a mock implementation for
//! testing without hardware.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Timeout for ordinary shell commands.
pub const CMD_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for auxiliary lookups (`pidof`, `getconf`).
pub const AUX_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval between child-exit polls while waiting for a command.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Error type for remote command failures.
#[derive(Debug)]
pub enum ShellError {
    /// The `adb` binary is not installed or not on PATH.
    AdbMissing,
    /// The command could not be spawned or polled.
    Spawn(std::io::Error),
    /// The command ran past its timeout and was killed.
    Timeout(Duration),
    /// The command exited with a non-zero status.
    Exit {
        code: Option<i32>,
        stderr: String,
    },
    /// The command produced output that is not valid UTF-8.
    Utf8,
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::AdbMissing => {
                write!(f, "adb not found; install Android platform tools and add adb to PATH")
            }
            ShellError::Spawn(e) => write!(f, "failed to run adb: {}", e),
            ShellError::Timeout(t) => {
                write!(f, "adb timed out after {:.0}s; check the device connection", t.as_secs_f64())
            }
            ShellError::Exit { code, stderr } => {
                if stderr.is_empty() {
                    match code {
                        Some(c) => write!(f, "command failed with exit code {}", c),
                        None => write!(f, "command terminated by signal"),
                    }
                } else {
                    write!(f, "{}", stderr)
                }
            }
            ShellError::Utf8 => write!(f, "command produced non-UTF-8 output"),
        }
    }
}

impl std::error::Error for ShellError {}

/// Abstraction for running commands on the monitored device.
///
/// Calls are synchronous: they block until the command completes, fails or
/// times out. A failure is surfaced for the current round only; callers
/// never retry automatically.
pub trait RemoteShell: Send + Sync {
    /// Runs a shell command on the device and returns its standard output.
    fn run(&self, args: &[&str], timeout: Duration) -> Result<String, ShellError>;
}

/// Production shell that drives a device over `adb -s <serial> shell …`.
#[derive(Debug, Clone)]
pub struct AdbShell {
    serial: String,
}

impl AdbShell {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }
}

impl RemoteShell for AdbShell {
    fn run(&self, args: &[&str], timeout: Duration) -> Result<String, ShellError> {
        let mut argv = vec!["-s", self.serial.as_str(), "shell"];
        argv.extend_from_slice(args);
        run_adb(&argv, timeout)
    }
}

/// Lists serials of connected devices, via `adb devices`.
pub fn list_devices() -> Result<Vec<String>, ShellError> {
    let out = run_adb(&["devices"], CMD_TIMEOUT)?;
    Ok(crate::collector::parser::parse_device_list(&out))
}

/// Runs the `adb` binary with a hard deadline.
///
/// The child is polled rather than waited on so a hung transport cannot
/// stall the sampling loop; on timeout the child is killed and the call
/// fails with `ShellError::Timeout`.
fn run_adb(argv: &[&str], timeout: Duration) -> Result<String, ShellError> {
    let mut child = Command::new("adb")
        .args(argv)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShellError::AdbMissing
            } else {
                ShellError::Spawn(e)
            }
        })?;

    // Drain both pipes on background threads; a full pipe buffer would
    // otherwise block the child and trip the timeout below.
    let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
    let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().map_err(ShellError::Spawn)? {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ShellError::Timeout(timeout));
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let stdout = join_pipe_reader(stdout_reader);
    let stderr = join_pipe_reader(stderr_reader);

    if !status.success() {
        return Err(ShellError::Exit {
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    String::from_utf8(stdout).map_err(|_| ShellError::Utf8)
}

fn spawn_pipe_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_pipe_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_error_prefers_stderr() {
        let err = ShellError::Exit {
            code: Some(1),
            stderr: "device 'ABC' not found".to_string(),
        };
        assert_eq!(err.to_string(), "device 'ABC' not found");

        let bare = ShellError::Exit {
            code: Some(127),
            stderr: String::new(),
        };
        assert_eq!(bare.to_string(), "command failed with exit code 127");
    }

    #[test]
    fn timeout_message_mentions_duration() {
        let err = ShellError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));
    }
}
