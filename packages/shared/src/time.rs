//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        current_timestamp()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

/// Render a Unix timestamp (milliseconds) as `HH:MM` in the given offset.
///
/// Out-of-range timestamps render as `--:--`.
pub fn format_clock_time(timestamp_millis: i64, offset: &FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_millis) {
        Some(utc) => utc.with_timezone(offset).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Render a Unix timestamp (milliseconds) as `HH:MM` in the server's local time zone.
pub fn format_local_clock_time(timestamp_millis: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_millis).single() {
        Some(local) => local.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}
