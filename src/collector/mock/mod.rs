//! In-memory mock shell for testing collectors without a device.
//!
//! `MockShell` maps an argv to a canned stdout or failure, allowing tests
//! to simulate device states (and mutate them between ticks) without adb.

mod scenarios;

pub use scenarios::{SCENARIO_PACKAGE, SCENARIO_PID};

use crate::collector::traits::{RemoteShell, ShellError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Responses = HashMap<Vec<String>, Result<String, String>>;

/// In-memory shell for testing.
///
/// Clones share the same response table, so a scenario can be updated
/// between sampling rounds, the way real counter files move between reads.
#[derive(Debug, Clone, Default)]
pub struct MockShell {
    responses: Arc<Mutex<Responses>>,
}

impl MockShell {
    /// Creates a mock shell that fails every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stdout returned for an argv.
    pub fn set_output(&self, args: &[&str], stdout: impl Into<String>) {
        self.lock().insert(to_key(args), Ok(stdout.into()));
    }

    /// Makes an argv fail with the given stderr.
    pub fn set_failure(&self, args: &[&str], stderr: impl Into<String>) {
        self.lock().insert(to_key(args), Err(stderr.into()));
    }

    /// Removes a canned response; the argv fails as unknown afterwards.
    pub fn remove(&self, args: &[&str]) {
        self.lock().remove(&to_key(args));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Responses> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn to_key(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl RemoteShell for MockShell {
    fn run(&self, args: &[&str], _timeout: Duration) -> Result<String, ShellError> {
        match self.lock().get(&to_key(args)) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err(stderr)) => Err(ShellError::Exit {
                code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Err(ShellError::Exit {
                code: Some(127),
                stderr: format!("{}: not found", args.join(" ")),
            }),
        }
    }
}
