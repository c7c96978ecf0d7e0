//! The writer thread: the single consumer that drains both ring buffers,
//! appends records to rotating chunk files, keeps the catalog (header +
//! string table) up to date on disk, and echoes records to the console
//! through a [`ConsoleFormatter`].
//!
//! Poll on a short adaptive sleep, drain everything currently available,
//! persist, go back to sleep — woken early by [`WriterControl::notify_work`]
//! rather than busy-spinning.

use crate::collector::Collector;
use crate::render::render_message;
use crate::ring::ByteRing;
use crate::staged_string;
use parking_lot::{Condvar, Mutex};
use sslog_format::{
    catalog::{encode_string_table, CatalogHeader},
    chunk_file_name,
    frame::LogRecord,
    Level, CATALOG_FILE_NAME,
};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const MAX_CHUNK_BYTES: u64 = 64 * 1024 * 1024;
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Cross-thread signaling between producers/`Collector` lifecycle calls and
/// the writer thread: a stop flag, a flush-on-demand flag, and a condvar the
/// writer sleeps on between polls.
pub(crate) struct WriterControl {
    stop: AtomicBool,
    flush: AtomicBool,
    pending: Mutex<bool>,
    wake: Condvar,
}

impl WriterControl {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            flush: AtomicBool::new(false),
            pending: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    fn signal(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.wake.notify_one();
    }

    pub fn notify_work(&self) {
        self.signal();
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.signal();
    }

    pub fn request_flush(&self) {
        self.flush.store(true, Ordering::Release);
        self.signal();
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn take_flush_request(&self) -> bool {
        self.flush.swap(false, Ordering::AcqRel)
    }

    fn wait_for_work(&self, timeout: Duration) {
        let mut pending = self.pending.lock();
        if !*pending {
            self.wake.wait_for(&mut pending, timeout);
        }
        *pending = false;
    }
}

pub(crate) fn spawn(
    collector: Collector,
    data_ring: Arc<ByteRing>,
    string_ring: Arc<ByteRing>,
    control: Arc<WriterControl>,
    session_origin_utc_ns: i64,
) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("sslog-writer".to_string())
        .spawn(move || writer_main(collector, data_ring, string_ring, control, session_origin_utc_ns))
        .expect("failed to spawn sslog writer thread")
}

struct ChunkWriter {
    dir: PathBuf,
    next_index: u32,
    file: BufWriter<File>,
    bytes_written: u64,
    degraded: bool,
}

impl ChunkWriter {
    fn open(dir: &Path) -> std::io::Result<Self> {
        let (file, bytes_written) = Self::create_chunk(dir, 0)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            next_index: 1,
            file,
            bytes_written,
            degraded: false,
        })
    }

    fn create_chunk(dir: &Path, index: u32) -> std::io::Result<(BufWriter<File>, u64)> {
        let path = dir.join(chunk_file_name(index));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok((BufWriter::new(file), 0))
    }

    fn append(&mut self, encoded: &[u8]) -> std::io::Result<()> {
        self.file.write_all(encoded)?;
        self.bytes_written += encoded.len() as u64;
        if self.bytes_written >= MAX_CHUNK_BYTES {
            self.file.flush()?;
            let (file, bytes_written) = Self::create_chunk(&self.dir, self.next_index)?;
            self.next_index += 1;
            self.file = file;
            self.bytes_written = bytes_written;
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn persist_catalog(dir: &Path, collector: &Collector, session_origin_utc_ns: i64) {
    let header = CatalogHeader::new(session_origin_utc_ns, 1.0);
    let strings = collector.strings().snapshot();
    let mut out = Vec::from(header.encode());
    out.extend_from_slice(&encode_string_table(&strings));
    let path = dir.join(CATALOG_FILE_NAME);
    let tmp_path = dir.join(format!("{CATALOG_FILE_NAME}.tmp"));
    // Write-then-rename keeps a reader that opens the catalog mid-flush from
    // ever observing a half-written file. Catalog corruption is always a
    // hard error for the reader, so never let a crash produce one.
    if let Err(err) = std::fs::write(&tmp_path, &out).and_then(|()| std::fs::rename(&tmp_path, &path)) {
        tracing::error!(error = %err, path = %path.display(), "failed to persist sslog catalog");
    }
}

fn writer_main(
    collector: Collector,
    data_ring: Arc<ByteRing>,
    string_ring: Arc<ByteRing>,
    control: Arc<WriterControl>,
    session_origin_utc_ns: i64,
) {
    let storage_path = collector.get_sink_config().path;
    let mut formatter_pattern = String::new();
    let mut formatter = compile_formatter(&collector.get_sink_config().console_formatter, &mut formatter_pattern);

    let mut chunk_writer = match ChunkWriter::open(&storage_path) {
        Ok(w) => Some(w),
        Err(err) => {
            tracing::error!(error = %err, path = %storage_path.display(), "failed to open chunk file; storage sink is degraded for this session");
            None
        }
    };

    persist_catalog(&storage_path, &collector, session_origin_utc_ns);

    let mut dirty_strings = false;
    loop {
        // Reconfiguration takes effect at the next record: reload the live
        // sink config every poll. The storage directory itself is fixed for
        // the lifetime of the session (the
        // chunk writer is opened once against it); only level/formatter
        // changes apply mid-session.
        let sink_cfg = collector.get_sink_config();
        if sink_cfg.console_formatter != formatter_pattern {
            formatter = compile_formatter(&sink_cfg.console_formatter, &mut formatter_pattern);
        }

        let strings_snapshot = collector.strings().snapshot();
        string_ring.drain(|payload| {
            if staged_string::decode(payload).is_some() {
                collector.stats().record_string();
                dirty_strings = true;
            }
        });

        drain_data_ring(
            &data_ring,
            &collector,
            &sink_cfg,
            &formatter,
            &strings_snapshot,
            &mut chunk_writer,
            session_origin_utc_ns,
        );

        collector.stats().update_buffer_usage(
            data_ring.peak_usage_bytes(),
            string_ring.peak_usage_bytes(),
        );

        if dirty_strings || control.take_flush_request() {
            persist_catalog(&storage_path, &collector, session_origin_utc_ns);
            dirty_strings = false;
        }
        if let Some(writer) = chunk_writer.as_mut() {
            let _ = writer.flush();
        }

        if control.should_stop() {
            break;
        }
        control.wait_for_work(IDLE_POLL);
    }

    // Final drain: anything published between the last poll and `stop()`
    // taking the session lock is still sitting in the rings.
    let sink_cfg = collector.get_sink_config();
    let strings_snapshot = collector.strings().snapshot();
    string_ring.drain(|payload| {
        if staged_string::decode(payload).is_some() {
            collector.stats().record_string();
        }
    });
    drain_data_ring(
        &data_ring,
        &collector,
        &sink_cfg,
        &formatter,
        &strings_snapshot,
        &mut chunk_writer,
        session_origin_utc_ns,
    );
    if let Some(writer) = chunk_writer.as_mut() {
        let _ = writer.flush();
    }
    persist_catalog(&storage_path, &collector, session_origin_utc_ns);
}

fn compile_formatter(pattern: &str, cached_pattern: &mut String) -> crate::format::ConsoleFormatter {
    cached_pattern.clear();
    cached_pattern.push_str(pattern);
    crate::format::ConsoleFormatter::compile(pattern).unwrap_or_else(|err| {
        tracing::error!(error = %err, "invalid console formatter; falling back to default");
        crate::format::ConsoleFormatter::compile(crate::config::DEFAULT_FORMATTER)
            .expect("default formatter always compiles")
    })
}

#[allow(clippy::too_many_arguments)]
fn drain_data_ring(
    data_ring: &ByteRing,
    collector: &Collector,
    sink_cfg: &crate::config::SinkConfig,
    formatter: &crate::format::ConsoleFormatter,
    strings: &[sslog_format::IndexedString],
    chunk_writer: &mut Option<ChunkWriter>,
    session_origin_utc_ns: i64,
) {
    data_ring.drain(|encoded| {
        let Ok((record, _)) = LogRecord::decode(encoded) else {
            tracing::error!("dropped a corrupt record frame drained from the data ring");
            return;
        };

        if record.level >= sink_cfg.storage_level {
            match chunk_writer {
                Some(writer) => match writer.append(encoded) {
                    Ok(()) => collector.stats().record_stored(encoded.len() as u64),
                    Err(err) => {
                        if !writer.degraded {
                            tracing::error!(error = %err, "chunk write failed; storage sink is now degraded for this session");
                            writer.degraded = true;
                        }
                        collector.stats().record_drop();
                    }
                },
                None => collector.stats().record_drop(), // already degraded at session start
            }
        }

        if record.level >= sink_cfg.console_level && sink_cfg.console_level != Level::Off {
            echo_to_console(&record, formatter, strings, session_origin_utc_ns);
        }
    });
}

fn echo_to_console(
    record: &LogRecord,
    formatter: &crate::format::ConsoleFormatter,
    strings: &[sslog_format::IndexedString],
    session_origin_utc_ns: i64,
) {
    let lookup = |id: u32| -> String {
        strings
            .get(id as usize)
            .map(|s| s.as_str_lossy().into_owned())
            .unwrap_or_default()
    };
    let thread = lookup(record.thread_idx);
    let category = lookup(record.category_idx);
    let format = lookup(record.format_idx);
    let message = render_message(&format, &record.args, strings);

    let ctx = crate::format::FormatContext {
        timestamp_utc_ns: record.timestamp_utc_ns,
        level: record.level,
        thread: &thread,
        category: &category,
        message: &message,
        buffer: &record.buffer,
        session_origin_utc_ns,
        with_color: atty_stderr(),
    };
    eprintln!("{}", formatter.format(&ctx));
}

fn atty_stderr() -> bool {
    // Color mode is enabled only when the output is a terminal;
    // `IsTerminal` is stable stdlib, no extra dependency needed.
    std::io::stderr().is_terminal()
}
