//! Metrics collection from an Android device over its shell.
//!
//! This module provides infrastructure for sampling thermal and memory
//! state through a line-oriented device shell, with support for mocking
//! so tests run without hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Collector                           │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  ProcessCollector   │   │     SystemCollector         │  │
//! │  │  - pidof / ps -A    │   │  - /proc/meminfo            │  │
//! │  │  - /proc/[pid]/*    │   │  - dumpsys battery          │  │
//! │  │  - /proc/stat       │   │  - thermal fallback nodes   │  │
//! │  └──────────┬──────────┘   └──────────────┬──────────────┘  │
//! │             └──────────────┬──────────────┘                 │
//! │                            │                                │
//! │                     ┌──────▼──────┐                         │
//! │                     │ RemoteShell │ (trait)                 │
//! │                     └──────┬──────┘                         │
//! └────────────────────────────┼────────────────────────────────┘
//!                              │
//!                    ┌─────────┴─────────┐
//!                    │                   │
//!             ┌──────▼──────┐     ┌──────▼──────┐
//!             │  AdbShell   │     │  MockShell  │
//!             │ (device)    │     │ (testing)   │
//!             └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use adbmon::collector::{Collector, MockShell};
//!
//! let shell = MockShell::typical_device();
//! let mut collector = Collector::new(shell, None);
//! let sample = collector.collect_sample(chrono::Local::now());
//! assert!(sample.temperature_c.is_some());
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod parser;
pub mod process;
pub mod system;
pub mod traits;

pub use collector::Collector;
pub use mock::MockShell;
pub use process::ProcessCollector;
pub use system::{CollectError, SystemCollector};
pub use traits::{AdbShell, RemoteShell, ShellError, list_devices};
