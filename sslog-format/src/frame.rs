//! Record frame codec.
//!
//! ```text
//! u8  level
//! u32 thread_idx
//! u32 category_idx
//! u32 format_idx
//! u64 timestamp_utc_ns
//! u8  arg_count
//! for each arg: u8 type_tag, N bytes little-endian value
//! u16 buffer_len
//! N bytes buffer
//! ```
//!
//! All multi-byte integers are little-endian. The maximum buffer size is
//! `u16::MAX` bytes per record.

use crate::arg::Arg;
use crate::error::DecodeError;
use crate::level::Level;

pub const MAX_BUFFER_LEN: usize = u16::MAX as usize;

/// A single decoded log record, as yielded by the reader and as staged by
/// the collector before being pushed into the data ring.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp_utc_ns: u64,
    pub level: Level,
    pub thread_idx: u32,
    pub category_idx: u32,
    pub format_idx: u32,
    pub args: Vec<Arg>,
    pub buffer: Vec<u8>,
}

impl LogRecord {
    /// Exact encoded size of this record, used by the collector to reserve
    /// the right number of bytes in the ring buffer with a single
    /// `fetch_add` before writing anything.
    pub fn encoded_len(&self) -> usize {
        1 // level
            + 4 + 4 + 4 // thread_idx, category_idx, format_idx
            + 8 // timestamp
            + 1 // arg_count
            + self.args.iter().map(Arg::encoded_len).sum::<usize>()
            + 2 // buffer_len
            + self.buffer.len()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.level.as_u8());
        out.extend_from_slice(&self.thread_idx.to_le_bytes());
        out.extend_from_slice(&self.category_idx.to_le_bytes());
        out.extend_from_slice(&self.format_idx.to_le_bytes());
        out.extend_from_slice(&self.timestamp_utc_ns.to_le_bytes());
        out.push(self.args.len() as u8);
        for arg in &self.args {
            arg.encode(out);
        }
        out.extend_from_slice(&(self.buffer.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.buffer);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    /// Decodes one frame from the start of `buf`, returning the record and
    /// the number of bytes consumed. Used by both the writer (echoing a
    /// frame it just staged to the console formatter) and the reader
    /// (iterating a chunk file).
    pub fn decode(buf: &[u8]) -> Result<(LogRecord, usize), DecodeError> {
        let mut pos = 0usize;
        macro_rules! need {
            ($n:expr) => {
                if buf.len() < pos + $n {
                    return Err(DecodeError::Truncated { what: "frame header" });
                }
            };
        }
        need!(1);
        let level = Level::from_u8(buf[pos]).ok_or(DecodeError::UnknownLevel { raw: buf[pos] })?;
        pos += 1;

        need!(4);
        let thread_idx = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;

        need!(4);
        let category_idx = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;

        need!(4);
        let format_idx = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap());
        pos += 4;

        need!(8);
        let timestamp_utc_ns = u64::from_le_bytes(buf[pos..pos + 8].try_into().unwrap());
        pos += 8;

        need!(1);
        let arg_count = buf[pos];
        pos += 1;

        let mut args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
            let (arg, consumed) = Arg::decode(&buf[pos..])?;
            args.push(arg);
            pos += consumed;
        }

        need!(2);
        let buffer_len = u16::from_le_bytes(buf[pos..pos + 2].try_into().unwrap()) as usize;
        pos += 2;

        if buf.len() < pos + buffer_len {
            return Err(DecodeError::Truncated { what: "record buffer" });
        }
        let buffer = buf[pos..pos + buffer_len].to_vec();
        pos += buffer_len;

        Ok((
            LogRecord {
                timestamp_utc_ns,
                level,
                thread_idx,
                category_idx,
                format_idx,
                args,
                buffer,
            },
            pos,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogRecord {
        LogRecord {
            timestamp_utc_ns: 1_700_000_000_123_456_789,
            level: Level::Warn,
            thread_idx: 3,
            category_idx: 7,
            format_idx: 11,
            args: vec![Arg::S32(7), Arg::StringIdx(2)],
            buffer: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn roundtrip() {
        let rec = sample();
        let encoded = rec.encode();
        assert_eq!(encoded.len(), rec.encoded_len());
        let (decoded, consumed) = LogRecord::decode(&encoded).unwrap();
        assert_eq!(decoded, rec);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn decode_two_concatenated_frames() {
        let a = sample();
        let mut b = sample();
        b.args.clear();
        b.buffer.clear();
        let mut buf = a.encode();
        buf.extend(b.encode());

        let (first, n1) = LogRecord::decode(&buf).unwrap();
        assert_eq!(first, a);
        let (second, n2) = LogRecord::decode(&buf[n1..]).unwrap();
        assert_eq!(second, b);
        assert_eq!(n1 + n2, buf.len());
    }

    #[test]
    fn truncated_tail_is_detected() {
        let rec = sample();
        let encoded = rec.encode();
        let half = &encoded[..encoded.len() / 2];
        assert!(LogRecord::decode(half).is_err());
    }
}
