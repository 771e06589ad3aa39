//! Rolling link throughput accounting.

use crate::config::REPORT_INTERVAL_MS;

/// A finished report window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThroughputReport {
    pub bytes: u32,
    pub elapsed_ms: u32,
    pub bytes_per_second: u32,
}

impl ThroughputReport {
    /// Integer kB/s part.
    pub fn kilobytes(&self) -> u32 {
        self.bytes_per_second / 1000
    }

    /// Three-digit remainder after [`kilobytes`](Self::kilobytes).
    pub fn fraction(&self) -> u32 {
        self.bytes_per_second % 1000
    }
}

/// Byte counter with a fixed report window.
///
/// Timestamps are milliseconds from a free-running wrapping clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThroughputMeter {
    bytes_total: u32,
    window_start_ms: u32,
}

impl ThroughputMeter {
    pub const fn new() -> Self {
        Self {
            bytes_total: 0,
            window_start_ms: 0,
        }
    }

    /// Start a fresh window at `now_ms`.
    pub fn reset(&mut self, now_ms: u32) {
        self.bytes_total = 0;
        self.window_start_ms = now_ms;
    }

    pub fn bytes_total(&self) -> u32 {
        self.bytes_total
    }

    pub fn window_start_ms(&self) -> u32 {
        self.window_start_ms
    }

    /// Count `bytes`, closing the window if it has run for the report interval.
    pub fn track(&mut self, bytes: usize, now_ms: u32) -> Option<ThroughputReport> {
        self.bytes_total = self.bytes_total.wrapping_add(bytes as u32);

        let elapsed_ms = now_ms.wrapping_sub(self.window_start_ms);
        if elapsed_ms < REPORT_INTERVAL_MS {
            return None;
        }

        let bytes_per_second = (self.bytes_total as u64 * 1000 / elapsed_ms as u64) as u32;
        let report = ThroughputReport {
            bytes: self.bytes_total,
            elapsed_ms,
            bytes_per_second,
        };
        self.reset(now_ms);
        Some(report)
    }
}
