//! Collector and sink configuration.

use serde::{Deserialize, Serialize};
use sslog_format::Level;
use std::path::PathBuf;

pub const DEFAULT_DATA_BUFFER_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_STRING_BUFFER_BYTES: usize = 256 * 1024;
pub const DEFAULT_FORMATTER: &str = "[%L] [%Y-%m-%dT%H:%M:%S.%f%z] [%c] [thread %t] %v%Q";

/// Producer-side sizing knobs.
///
/// Both fields fall back to their documented default when zero, so a
/// `CollectorConfig::default()` or a config file that only overrides one
/// field still produces a working collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Size, in bytes, of the per-session record ring buffer.
    pub data_buffer_bytes: usize,
    /// Size, in bytes, of the string staging ring buffer.
    pub string_buffer_bytes: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            data_buffer_bytes: DEFAULT_DATA_BUFFER_BYTES,
            string_buffer_bytes: DEFAULT_STRING_BUFFER_BYTES,
        }
    }
}

impl CollectorConfig {
    /// Normalizes zero/unset fields to their defaults: missing values fall
    /// back to defaults.
    pub fn normalized(mut self) -> Self {
        if self.data_buffer_bytes == 0 {
            self.data_buffer_bytes = DEFAULT_DATA_BUFFER_BYTES;
        }
        if self.string_buffer_bytes == 0 {
            self.string_buffer_bytes = DEFAULT_STRING_BUFFER_BYTES;
        }
        self
    }
}

/// Writer-side configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory the writer persists the catalog and chunks into. Created on
    /// `start()` if missing.
    pub path: PathBuf,
    /// Minimum level written to disk.
    pub storage_level: Level,
    /// Minimum level echoed to stderr.
    pub console_level: Level,
    /// `%`-directive console formatter pattern.
    pub console_formatter: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sslogDb"),
            storage_level: Level::Trace,
            console_level: Level::Off,
            console_formatter: DEFAULT_FORMATTER.to_string(),
        }
    }
}
