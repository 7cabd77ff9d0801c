//! Time sources for event capture.
//!
//! The probe consults a [`Clock`] exactly once per event. Production code
//! uses [`SystemClock`]; tests substitute deterministic clocks so timestamp
//! assertions do not depend on the machine.

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in seconds since the Unix epoch.
///
/// Implementations are shared across every traced thread, so they must be
/// cheap and lock-free.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// The operating-system wall clock.
///
/// Not guaranteed monotonic; if the system time steps backwards, event
/// timestamps follow it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64())
    }
}

/// Converts clock seconds to whole microseconds, truncating toward zero.
/// Readings before the epoch clamp to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn seconds_to_micros(seconds: f64) -> u64 {
    (seconds * 1_000_000.0) as u64
}
