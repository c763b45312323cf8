//! adbmon - Android device thermal/memory monitoring library.
//!
//! This library provides the core functionality behind the `adbmond`
//! sampling daemon:
//! - `collector` — shell abstraction, raw-text parsers, per-round sampling
//! - `rates` — CPU utilization from cumulative counter deltas
//! - `storage` — sample records and time-bucketed CSV logs with retention

pub mod collector;
pub mod rates;
pub mod storage;
