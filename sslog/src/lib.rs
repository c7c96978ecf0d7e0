//! `sslog` — the instrumentation core: a lock-free producer API, a single
//! dedicated writer thread, and the on-disk chunk + catalog format shared
//! with the `sslogread` reader crate.
//!
//! Call sites normally go through the [`trace!`], [`debug!`], [`info!`],
//! [`warn!`], [`error!`] and [`critical!`] macros (plus their `*_buffer!`
//! variants), which gate on [`is_enabled`] before touching the global
//! [`Collector`] singleton. Embedders that want more than one independently
//! configured collector in a process (tests, mostly) can construct
//! [`Collector::new`] directly instead of going through the singleton.

pub mod arg_input;
pub mod collector;
pub mod config;
pub mod error;
pub mod format;
pub mod intern;
pub mod render;
pub mod ring;
mod sink;
pub mod staged_string;
pub mod stats;

pub use arg_input::ArgInput;
pub use collector::Collector;
pub use config::{CollectorConfig, SinkConfig, DEFAULT_FORMATTER};
pub use error::SslogError;
pub use format::ConsoleFormatter;
pub use sslog_format::{Arg, Level};
pub use stats::SessionStats;

use once_cell::sync::Lazy;

static GLOBAL: Lazy<Collector> = Lazy::new(Collector::new);

/// The process-wide collector singleton: global mutable state behind a
/// process-wide object with lifecycle start/stop.
pub fn collector() -> &'static Collector {
    &GLOBAL
}

pub fn start() -> Result<(), SslogError> {
    GLOBAL.start()
}

pub fn stop() {
    GLOBAL.stop()
}

pub fn request_details() {
    GLOBAL.request_details()
}

pub fn get_stats() -> SessionStats {
    GLOBAL.get_stats()
}

pub fn is_enabled(level: Level) -> bool {
    GLOBAL.is_enabled(level)
}

pub fn is_enabled_group(group: u32, level: Level) -> bool {
    GLOBAL.is_enabled_group(group, level)
}

pub fn set_thread_name(name: &str) {
    GLOBAL.set_thread_name(name)
}

pub fn set_collector_config(config: CollectorConfig) {
    GLOBAL.set_collector_config(config)
}

pub fn get_collector_config() -> CollectorConfig {
    GLOBAL.get_collector_config()
}

pub fn set_sink_config(config: SinkConfig) {
    GLOBAL.set_sink_config(config)
}

pub fn get_sink_config() -> SinkConfig {
    GLOBAL.get_sink_config()
}

pub fn set_storage_level(level: Level) {
    GLOBAL.set_storage_level(level)
}

pub fn set_console_level(level: Level) {
    GLOBAL.set_console_level(level)
}

pub fn set_console_formatter(pattern: impl Into<String>) -> Result<(), SslogError> {
    GLOBAL.set_console_formatter(pattern)
}

pub fn set_storage_path(path: impl Into<std::path::PathBuf>) {
    GLOBAL.set_storage_path(path)
}

pub fn set_group_level(group: u32, level: Level) {
    GLOBAL.set_group_level(group, level)
}

/// The macro-expansion entry point every level macro funnels through. Not
/// meant to be called directly; use [`trace!`]/[`debug!`]/... instead.
#[doc(hidden)]
#[macro_export]
macro_rules! __sslog_log {
    ($level:expr, $category:expr, $buffer:expr, $format:expr $(, $arg:expr)* $(,)?) => {{
        if $crate::is_enabled($level) {
            $crate::collector().log(
                $level,
                $category,
                $format,
                &[$($crate::ArgInput::from($arg)),*],
                $buffer,
            );
        }
    }};
}

/// Declares a plain and a `*_buffer` logging macro for one [`Level`].
macro_rules! declare_level_macros {
    ($level_variant:ident, $name:ident, $name_buffer:ident) => {
        #[macro_export]
        macro_rules! $name {
            ($category:expr, $format:expr $(, $arg:expr)* $(,)?) => {
                $crate::__sslog_log!($crate::Level::$level_variant, $category, None, $format $(, $arg)*)
            };
        }

        #[macro_export]
        macro_rules! $name_buffer {
            ($category:expr, $buffer:expr, $format:expr $(, $arg:expr)* $(,)?) => {
                $crate::__sslog_log!($crate::Level::$level_variant, $category, Some($buffer), $format $(, $arg)*)
            };
        }
    };
}

declare_level_macros!(Trace, trace, trace_buffer);
declare_level_macros!(Debug, debug, debug_buffer);
declare_level_macros!(Info, info, info_buffer);
declare_level_macros!(Warn, warn, warn_buffer);
declare_level_macros!(Error, error, error_buffer);
declare_level_macros!(Critical, critical, critical_buffer);
