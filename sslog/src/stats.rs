//! Session statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time snapshot returned by `Collector::get_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub stored_logs: u64,
    pub dropped_logs: u64,
    pub stored_strings: u64,
    pub stored_bytes: u64,
    pub max_usage_data_buffer_bytes: u64,
    pub max_usage_string_buffer_bytes: u64,
}

/// The live, atomically-updated counters backing [`SessionStats`]. Only the
/// writer thread increments `stored_*`; any thread may increment
/// `dropped_logs` (a producer whose reservation failed).
#[derive(Default)]
pub struct StatsInner {
    pub stored_logs: AtomicU64,
    pub dropped_logs: AtomicU64,
    pub stored_strings: AtomicU64,
    pub stored_bytes: AtomicU64,
    pub max_usage_data_buffer_bytes: AtomicU64,
    pub max_usage_string_buffer_bytes: AtomicU64,
}

impl StatsInner {
    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            stored_logs: self.stored_logs.load(Ordering::Relaxed),
            dropped_logs: self.dropped_logs.load(Ordering::Relaxed),
            stored_strings: self.stored_strings.load(Ordering::Relaxed),
            stored_bytes: self.stored_bytes.load(Ordering::Relaxed),
            max_usage_data_buffer_bytes: self.max_usage_data_buffer_bytes.load(Ordering::Relaxed),
            max_usage_string_buffer_bytes: self
                .max_usage_string_buffer_bytes
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_drop(&self) {
        self.dropped_logs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self, bytes: u64) {
        self.stored_logs.fetch_add(1, Ordering::Relaxed);
        self.stored_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_string(&self) {
        self.stored_strings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_buffer_usage(&self, data_peak: u64, string_peak: u64) {
        self.max_usage_data_buffer_bytes
            .fetch_max(data_peak, Ordering::Relaxed);
        self.max_usage_string_buffer_bytes
            .fetch_max(string_peak, Ordering::Relaxed);
    }
}
