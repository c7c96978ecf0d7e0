//! The producer-side API: `Collector` owns the shared process-wide state
//! (indexed-string table, the two ring buffers while a session is running,
//! configuration, statistics) and exposes the call-site contract that the
//! `log!`-family macros expand into.
//!
//! A single process normally uses the global [`crate::collector()`]
//! singleton via the free functions re-exported from the crate root, but
//! `Collector` itself is a plain cloneable handle — nothing stops an
//! embedder from running more than one independently-configured collector
//! in the same process, e.g. in tests.

use crate::arg_input::ArgInput;
use crate::config::{CollectorConfig, SinkConfig};
use crate::format::ConsoleFormatter;
use crate::intern::StringTable;
use crate::ring::ByteRing;
use crate::sink::{self, WriterControl};
use crate::stats::{SessionStats, StatsInner};
use crate::staged_string;
use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::Mutex;
use sslog_format::{specifiers, Arg, Level, LogRecord, StringRole, MAX_BUFFER_LEN};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

thread_local! {
    static THREAD_IDX: Cell<Option<u32>> = const { Cell::new(None) };
    static LAST_TIMESTAMP_NS: Cell<u64> = const { Cell::new(0) };
}

static THREAD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The handles a producer needs to stage a record: the two rings and the
/// writer's wake/stop signaling. Published via [`ArcSwapOption`] so `log()`
/// can grab a cheap `Arc` clone of the current session and reserve into the
/// ring without ever taking a lock shared with other producer threads — the
/// whole point of the MPSC ring protocol in `ring.rs` is that reservation is
/// lock-free, so nothing on this path may serialize producers against each
/// other.
struct RunningSession {
    data_ring: Arc<ByteRing>,
    string_ring: Arc<ByteRing>,
    control: Arc<WriterControl>,
}

/// Lifecycle bookkeeping touched only by `start()`/`stop()`, never by the
/// hot `log()` path. Serialized by its own mutex so concurrent `start`/`stop`
/// calls (rare, unlike `log()`) don't race each other.
#[derive(Default)]
struct Lifecycle {
    writer_thread: Option<std::thread::JoinHandle<()>>,
}

struct Inner {
    collector_config: ArcSwap<CollectorConfig>,
    sink_config: ArcSwap<SinkConfig>,
    strings: StringTable,
    stats: StatsInner,
    group_levels: Mutex<HashMap<u32, Level>>,
    session: ArcSwapOption<RunningSession>,
    lifecycle: Mutex<Lifecycle>,
}

/// A handle to one collector's worth of shared state. Cheaply `Clone`-able
/// (an `Arc` underneath); every clone observes the same session.
#[derive(Clone)]
pub struct Collector(Arc<Inner>);

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self(Arc::new(Inner {
            collector_config: ArcSwap::from_pointee(CollectorConfig::default()),
            sink_config: ArcSwap::from_pointee(SinkConfig::default()),
            strings: StringTable::new(),
            stats: StatsInner::default(),
            group_levels: Mutex::new(HashMap::new()),
            session: ArcSwapOption::from(None),
            lifecycle: Mutex::new(Lifecycle::default()),
        }))
    }

    // -- configuration --------------------------------------------------

    pub fn set_collector_config(&self, config: CollectorConfig) {
        self.0
            .collector_config
            .store(Arc::new(config.normalized()));
    }

    pub fn get_collector_config(&self) -> CollectorConfig {
        **self.0.collector_config.load()
    }

    pub fn set_sink_config(&self, config: SinkConfig) {
        self.0.sink_config.store(Arc::new(config));
    }

    pub fn get_sink_config(&self) -> SinkConfig {
        (**self.0.sink_config.load()).clone()
    }

    pub fn set_storage_level(&self, level: Level) {
        let mut cfg = self.get_sink_config();
        cfg.storage_level = level;
        self.set_sink_config(cfg);
    }

    pub fn set_console_level(&self, level: Level) {
        let mut cfg = self.get_sink_config();
        cfg.console_level = level;
        self.set_sink_config(cfg);
    }

    pub fn set_console_formatter(&self, pattern: impl Into<String>) -> Result<(), crate::error::SslogError> {
        let pattern = pattern.into();
        ConsoleFormatter::compile(&pattern)?; // validate before publishing
        let mut cfg = self.get_sink_config();
        cfg.console_formatter = pattern;
        self.set_sink_config(cfg);
        Ok(())
    }

    pub fn set_storage_path(&self, path: impl Into<std::path::PathBuf>) {
        let mut cfg = self.get_sink_config();
        cfg.path = path.into();
        self.set_sink_config(cfg);
    }

    pub fn set_group_level(&self, group: u32, level: Level) {
        self.0.group_levels.lock().insert(group, level);
    }

    // -- lifecycle --------------------------------------------------------

    pub fn start(&self) -> Result<(), crate::error::SslogError> {
        let mut lifecycle = self.0.lifecycle.lock();
        if self.0.session.load().is_some() {
            return Ok(()); // already running; start() is idempotent
        }
        let collector_cfg = self.get_collector_config();
        let sink_cfg = self.get_sink_config();
        std::fs::create_dir_all(&sink_cfg.path).map_err(|source| {
            crate::error::SslogError::CreateStorageDir {
                path: sink_cfg.path.clone(),
                source,
            }
        })?;

        let data_ring = Arc::new(ByteRing::new(collector_cfg.data_buffer_bytes));
        let string_ring = Arc::new(ByteRing::new(collector_cfg.string_buffer_bytes));
        let control = Arc::new(WriterControl::new());
        let origin_utc_ns = now_utc_ns() as i64;

        let writer_thread = sink::spawn(
            self.clone(),
            Arc::clone(&data_ring),
            Arc::clone(&string_ring),
            Arc::clone(&control),
            origin_utc_ns,
        );

        self.0.session.store(Some(Arc::new(RunningSession {
            data_ring,
            string_ring,
            control,
        })));
        lifecycle.writer_thread = Some(writer_thread);
        Ok(())
    }

    /// Drains and joins the writer thread. Blocks the caller until it has
    /// exited.
    pub fn stop(&self) {
        let mut lifecycle = self.0.lifecycle.lock();
        let running = self.0.session.swap(None);
        if let Some(running) = running {
            running.control.request_stop();
        }
        if let Some(handle) = lifecycle.writer_thread.take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.0.session.load().is_some()
    }

    /// Asks the writer to flush the catalog without waiting for its normal
    /// idle-poll cadence.
    pub fn request_details(&self) {
        if let Some(running) = self.0.session.load().as_ref() {
            running.control.request_flush();
        }
    }

    pub fn get_stats(&self) -> SessionStats {
        self.0.stats.snapshot()
    }

    // -- gating -----------------------------------------------------------

    pub fn is_enabled(&self, level: Level) -> bool {
        let sink_cfg = self.0.sink_config.load();
        level >= sink_cfg.storage_level || level >= sink_cfg.console_level
    }

    pub fn is_enabled_group(&self, group: u32, level: Level) -> bool {
        let group_min = self
            .0
            .group_levels
            .lock()
            .get(&group)
            .copied()
            .unwrap_or(Level::Trace);
        level >= group_min && self.is_enabled(level)
    }

    // -- thread identity ----------------------------------------------------

    pub fn set_thread_name(&self, name: &str) {
        let (id, _is_new) = self.0.strings.intern(name.as_bytes(), StringRole::THREAD);
        THREAD_IDX.with(|c| c.set(Some(id)));
        // Restage unconditionally, even if the id already existed under
        // another role: a late role-only update must still reach the writer
        // if it hasn't seen this id yet.
        self.stage_string(id);
    }

    /// Like the public thread-identity lookup, but takes the caller's
    /// already-loaded `RunningSession` snapshot instead of loading its own:
    /// staging a freshly interned default thread name must act on the exact
    /// session `log()` is already holding, not a second, possibly different,
    /// atomic load of `self.0.session`. Returns `None` if the string ring had
    /// no room for the new name; the caller drops the whole record in that
    /// case rather than counting the drop twice.
    fn thread_idx_locked(&self, running: &RunningSession) -> Option<u32> {
        if let Some(id) = THREAD_IDX.with(|c| c.get()) {
            return Some(id);
        }
        let default_name = THREAD_COUNTER.fetch_add(1, Ordering::Relaxed).to_string();
        let (id, is_new) = self
            .0
            .strings
            .intern(default_name.as_bytes(), StringRole::THREAD);
        if is_new && !self.stage_string_locked(running, id) {
            return None;
        }
        THREAD_IDX.with(|c| c.set(Some(id)));
        Some(id)
    }

    fn stage_string(&self, id: u32) {
        let Some(running) = self.0.session.load_full() else {
            return;
        };
        let Some(entry) = self.0.strings.get(id) else {
            return;
        };
        let payload = staged_string::encode(id, &entry);
        match running.string_ring.try_reserve(payload.len()) {
            Some(reservation) => reservation.publish(&payload),
            None => self.0.stats.record_drop(),
        }
    }

    fn next_timestamp_ns(&self) -> u64 {
        let now = now_utc_ns();
        LAST_TIMESTAMP_NS.with(|c| {
            let last = c.get();
            let ts = now.max(last); // monotonic non-decreasing per thread
            c.set(ts);
            ts
        })
    }

    /// The shared logging entry point every `log!`-family macro expands
    /// into. Infallible: on backpressure or an oversized buffer, the record
    /// is silently dropped and `droppedLogs` is incremented.
    #[allow(clippy::too_many_arguments)]
    pub fn log(
        &self,
        level: Level,
        category: &str,
        format: &str,
        args: &[ArgInput<'_>],
        buffer: Option<&[u8]>,
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let Some(running) = self.0.session.load_full() else {
            return; // stopped; calls are dropped without being counted
        };

        debug_assert_eq!(
            args.len(),
            specifiers::count_specifiers(format),
            "argument count must match the number of '%' specifiers in '{format}'"
        );

        if let Some(buf) = buffer {
            if buf.len() > MAX_BUFFER_LEN {
                self.0.stats.record_drop();
                return;
            }
        }

        let Some(thread_idx) = self.thread_idx_locked(&running) else {
            self.0.stats.record_drop();
            return;
        };
        let (category_idx, category_new) =
            self.0.strings.intern(category.as_bytes(), StringRole::CATEGORY);
        let (format_idx, format_new) = self.0.strings.intern(format.as_bytes(), StringRole::FORMAT);

        let mut new_ids = Vec::new();
        if category_new {
            new_ids.push(category_idx);
        }
        if format_new {
            new_ids.push(format_idx);
        }

        let mut encoded_args = Vec::with_capacity(args.len());
        for arg in args {
            match arg.as_str() {
                Some(s) => {
                    let (id, is_new) = self.0.strings.intern(s.as_bytes(), StringRole::ARG_VALUE);
                    if is_new {
                        new_ids.push(id);
                    }
                    encoded_args.push(Arg::StringIdx(id));
                }
                None => encoded_args.push(arg.to_plain_arg()),
            }
        }

        for id in new_ids {
            if !self.stage_string_locked(&running, id) {
                self.0.stats.record_drop();
                return;
            }
        }

        let record = LogRecord {
            timestamp_utc_ns: self.next_timestamp_ns(),
            level,
            thread_idx,
            category_idx,
            format_idx,
            args: encoded_args,
            buffer: buffer.map(<[u8]>::to_vec).unwrap_or_default(),
        };
        let encoded = record.encode();
        match running.data_ring.try_reserve(encoded.len()) {
            Some(reservation) => {
                reservation.publish(&encoded);
                running.control.notify_work();
            }
            None => self.0.stats.record_drop(),
        }
    }

    fn stage_string_locked(&self, running: &RunningSession, id: u32) -> bool {
        let Some(entry) = self.0.strings.get(id) else {
            return true;
        };
        let payload = staged_string::encode(id, &entry);
        match running.string_ring.try_reserve(payload.len()) {
            Some(reservation) => {
                reservation.publish(&payload);
                true
            }
            None => false,
        }
    }

    pub(crate) fn strings(&self) -> &StringTable {
        &self.0.strings
    }

    pub(crate) fn stats(&self) -> &StatsInner {
        &self.0.stats
    }
}

fn now_utc_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
