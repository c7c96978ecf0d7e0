//! `LogSession`: opens a finished log directory and exposes the
//! session-wide getters plus the rule-filtered `query` iteration.
//!
//! Unlike the producer, which must bound every operation in time because it
//! shares a process with the instrumented application, the reader is free to
//! do real work at `init` time: validate the catalog, load the (small)
//! indexed-string table, and walk every chunk file once to decode its
//! records. That single pass both builds the summary statistics this module
//! exposes (`get_log_qty`, `get_log_byte_qty`, ...) and recovers from a
//! truncated trailing chunk by simply stopping at the first frame that fails
//! to decode. The decoded records are kept in memory for the life of the
//! `LogSession` rather than lazily paged off disk — sessions large enough
//! for that to matter are out of scope here.

use crate::chunk;
use crate::error::{self, ReadError};
use crate::query::CompiledQuery;
use crate::rule::Rule;
use parking_lot::Mutex;
use snafu::ResultExt;
use sslog_format::{
    catalog::{decode_string_table, CatalogHeader},
    specifiers::parse_arg_names_and_units,
    IndexedString, Level, LogRecord, StringRole, CATALOG_FILE_NAME, CATALOG_HEADER_LEN,
};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// A single decoded log record, as yielded by [`LogSession::query`].
pub type LogStruct = LogRecord;

pub struct LogSession {
    header: CatalogHeader,
    strings: Vec<IndexedString>,
    records: Vec<LogStruct>,
    total_bytes: u64,
    arg_name_unit_cache: Mutex<HashMap<u32, Arc<Vec<(String, String)>>>>,
}

impl LogSession {
    /// Opens the log directory at `path`. Validates the catalog header and
    /// string table (a hard error on any corruption), then decodes every
    /// chunk file in index order, stopping early — without
    /// error — at the first frame that fails to decode (a truncated trailing
    /// write).
    pub fn init(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let dir = path.as_ref();
        let catalog_path = dir.join(CATALOG_FILE_NAME);
        let raw = std::fs::read(&catalog_path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ReadError::MissingCatalog {
                    path: catalog_path.clone(),
                }
            } else {
                ReadError::ReadCatalog {
                    path: catalog_path.clone(),
                    source,
                }
            }
        })?;

        let header = CatalogHeader::decode(&raw).map_err(|source| ReadError::CorruptCatalog {
            path: catalog_path.clone(),
            offset: 0,
            reason: source.to_string(),
        })?;
        let (strings, _consumed) =
            decode_string_table(&raw[CATALOG_HEADER_LEN..]).map_err(|source| ReadError::CorruptCatalog {
                path: catalog_path.clone(),
                offset: CATALOG_HEADER_LEN,
                reason: source.to_string(),
            })?;

        let chunk_paths = chunk::discover_chunks(dir)?;
        let mut records = Vec::new();
        let mut total_bytes = 0u64;
        for chunk_path in &chunk_paths {
            let bytes = std::fs::read(chunk_path).context(error::ReadChunkSnafu {
                path: chunk_path.clone(),
            })?;
            let mut pos = 0usize;
            while pos < bytes.len() {
                match LogRecord::decode(&bytes[pos..]) {
                    Ok((record, consumed)) => {
                        total_bytes += consumed as u64;
                        pos += consumed;
                        records.push(record);
                    }
                    // Truncated tail: recovered silently — everything
                    // decoded so far stands.
                    Err(_) => break,
                }
            }
        }

        Ok(Self {
            header,
            strings,
            records,
            total_bytes,
            arg_name_unit_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn get_indexed_string(&self, id: u32) -> Option<&[u8]> {
        self.strings.get(id as usize).map(|s| s.bytes.as_slice())
    }

    pub fn get_indexed_string_flags(&self, id: u32) -> Option<StringRole> {
        self.strings.get(id as usize).map(|s| s.roles)
    }

    /// Parses, and caches, the `(name, unit)` hints embedded in the format
    /// string at `format_idx`, on first access.
    pub fn get_indexed_string_arg_name_and_unit(&self, format_idx: u32) -> Arc<Vec<(String, String)>> {
        let mut cache = self.arg_name_unit_cache.lock();
        if let Some(cached) = cache.get(&format_idx) {
            return Arc::clone(cached);
        }
        let format = self
            .get_indexed_string(format_idx)
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();
        let parsed = Arc::new(parse_arg_names_and_units(&format));
        cache.insert(format_idx, Arc::clone(&parsed));
        parsed
    }

    pub fn get_level_name(&self, level: Level) -> &'static str {
        level.long_name()
    }

    pub fn get_utc_system_clock_origin_ns(&self) -> i64 {
        self.header.origin_utc_ns
    }

    pub fn get_clock_resolution_ns(&self) -> f64 {
        self.header.clock_resolution_ns
    }

    pub fn get_log_qty(&self) -> usize {
        self.records.len()
    }

    pub fn get_log_byte_qty(&self) -> u64 {
        self.total_bytes
    }

    pub fn get_arg_qty(&self) -> usize {
        self.records.iter().map(|r| r.args.len()).sum()
    }

    /// Span, in nanoseconds, between the earliest and latest record
    /// timestamp in the session. `0` for an empty session.
    pub fn get_log_duration_ns(&self) -> u64 {
        let Some(first) = self.records.first() else {
            return 0;
        };
        let (min, max) = self.records.iter().fold(
            (first.timestamp_utc_ns, first.timestamp_utc_ns),
            |(lo, hi), r| (lo.min(r.timestamp_utc_ns), hi.max(r.timestamp_utc_ns)),
        );
        max - min
    }

    pub fn get_indexed_string_qty(&self) -> usize {
        self.strings.len()
    }

    /// Every distinct argument name used across every format string in the
    /// session, sorted for stable output.
    pub fn get_arg_name_strings(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        for s in &self.strings {
            if !s.roles.contains(StringRole::FORMAT) {
                continue;
            }
            for (name, _unit) in parse_arg_names_and_units(&s.as_str_lossy()) {
                if !name.is_empty() {
                    seen.insert(name);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Every distinct argument unit used across every format string in the
    /// session, sorted for stable output.
    pub fn get_arg_unit_strings(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        for s in &self.strings {
            if !s.roles.contains(StringRole::FORMAT) {
                continue;
            }
            for (_name, unit) in parse_arg_names_and_units(&s.as_str_lossy()) {
                if !unit.is_empty() {
                    seen.insert(unit);
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Iterates every record in on-disk order, invoking `on_log` with the
    /// index of the first rule it matched (rules are OR-combined).
    /// Returning `false` from `on_log` stops iteration early.
    pub fn query(
        &self,
        rules: &[Rule],
        mut on_log: impl FnMut(usize, &LogStruct) -> bool,
    ) -> Result<(), ReadError> {
        let compiled = CompiledQuery::compile(rules)?;
        let resolve = |id: u32| self.get_indexed_string(id).map(<[u8]>::to_vec);
        for record in &self.records {
            let arg_specs = self.get_indexed_string_arg_name_and_unit(record.format_idx);
            if let Some(rule_idx) = compiled.first_matching_rule(record, arg_specs.as_slice(), &resolve) {
                if !on_log(rule_idx, record) {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslog_format::catalog::encode_string_table;
    use sslog_format::{Arg, Level};
    use std::io::Write;

    fn write_session(dir: &Path, strings: &[IndexedString], records: &[LogRecord]) {
        let header = CatalogHeader::new(1_700_000_000_000_000_000, 1.0);
        let mut catalog = Vec::from(header.encode());
        catalog.extend_from_slice(&encode_string_table(strings));
        std::fs::write(dir.join(CATALOG_FILE_NAME), catalog).unwrap();

        let mut chunk = Vec::new();
        for r in records {
            chunk.extend_from_slice(&r.encode());
        }
        let mut f = std::fs::File::create(dir.join("chunk-00000.sslog")).unwrap();
        f.write_all(&chunk).unwrap();
    }

    fn sample_strings() -> Vec<IndexedString> {
        vec![
            IndexedString::new(b"".to_vec(), StringRole::empty()),
            IndexedString::new(b"ui".to_vec(), StringRole::CATEGORY),
            IndexedString::new(b"ready".to_vec(), StringRole::FORMAT),
            IndexedString::new(b"tick %d".to_vec(), StringRole::FORMAT),
        ]
    }

    #[test]
    fn scenario_a_single_thread_two_records() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            LogRecord {
                timestamp_utc_ns: 1,
                level: Level::Info,
                thread_idx: 0,
                category_idx: 1,
                format_idx: 2,
                args: vec![],
                buffer: vec![],
            },
            LogRecord {
                timestamp_utc_ns: 2,
                level: Level::Info,
                thread_idx: 0,
                category_idx: 1,
                format_idx: 3,
                args: vec![Arg::S32(7)],
                buffer: vec![],
            },
        ];
        write_session(dir.path(), &sample_strings(), &records);

        let session = LogSession::init(dir.path()).unwrap();
        assert_eq!(session.get_log_qty(), 2);
        assert_eq!(session.get_indexed_string_qty(), 4);
        let mut seen = Vec::new();
        session.query(&[], |_idx, rec| {
            seen.push(rec.clone());
            true
        }).unwrap();
        assert_eq!(seen, records);
    }

    #[test]
    fn scenario_f_truncated_tail_recovers_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![LogRecord {
            timestamp_utc_ns: 1,
            level: Level::Info,
            thread_idx: 0,
            category_idx: 1,
            format_idx: 2,
            args: vec![],
            buffer: vec![],
        }];
        let header = CatalogHeader::new(1_700_000_000_000_000_000, 1.0);
        let mut catalog = Vec::from(header.encode());
        catalog.extend_from_slice(&encode_string_table(&sample_strings()));
        std::fs::write(dir.path().join(CATALOG_FILE_NAME), catalog).unwrap();

        let mut chunk = records[0].encode();
        chunk.extend_from_slice(&records[0].encode());
        let half = chunk.len() - 3;
        chunk.truncate(half); // corrupt the second record's tail

        std::fs::write(dir.path().join("chunk-00000.sslog"), &chunk).unwrap();

        let session = LogSession::init(dir.path()).unwrap();
        assert_eq!(session.get_log_qty(), 1, "only the intact record is recovered");
    }

    #[test]
    fn missing_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LogSession::init(dir.path()).is_err());
    }

    #[test]
    fn query_empty_rules_matches_everything_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            LogRecord {
                timestamp_utc_ns: 1,
                level: Level::Trace,
                thread_idx: 0,
                category_idx: 1,
                format_idx: 2,
                args: vec![],
                buffer: vec![],
            },
            LogRecord {
                timestamp_utc_ns: 2,
                level: Level::Critical,
                thread_idx: 0,
                category_idx: 1,
                format_idx: 2,
                args: vec![],
                buffer: vec![],
            },
        ];
        write_session(dir.path(), &sample_strings(), &records);
        let session = LogSession::init(dir.path()).unwrap();

        let mut count = 0;
        session.query(&[], |_, _| {
            count += 1;
            true
        }).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn query_can_stop_early() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (0..5)
            .map(|i| LogRecord {
                timestamp_utc_ns: i,
                level: Level::Info,
                thread_idx: 0,
                category_idx: 1,
                format_idx: 2,
                args: vec![],
                buffer: vec![],
            })
            .collect();
        write_session(dir.path(), &sample_strings(), &records);
        let session = LogSession::init(dir.path()).unwrap();

        let mut count = 0;
        session
            .query(&[], |_, _| {
                count += 1;
                count < 2
            })
            .unwrap();
        assert_eq!(count, 2);
    }
}
