//! Catalog file codec: the session header plus the indexed-string table.
//! Catalog corruption is always a hard error — unlike chunk files, there is
//! no "truncated tail" recovery path for the catalog.

use crate::error::DecodeError;
use crate::strings::{IndexedString, StringRole};

/// `"sslog\0"` padded to 8 bytes so the header stays nicely aligned.
pub const CATALOG_MAGIC: [u8; 8] = *b"sslog\0\0\0";
pub const CATALOG_FORMAT_VERSION: u16 = 1;
pub const CATALOG_HEADER_LEN: usize = 32;

/// Fixed-size catalog header: magic, format version, clock resolution, and
/// the session's UTC origin (wall-clock time corresponding to timestamp 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogHeader {
    pub version: u16,
    pub clock_resolution_ns: f64,
    pub origin_utc_ns: i64,
}

impl CatalogHeader {
    pub fn new(origin_utc_ns: i64, clock_resolution_ns: f64) -> Self {
        Self {
            version: CATALOG_FORMAT_VERSION,
            clock_resolution_ns,
            origin_utc_ns,
        }
    }

    pub fn encode(&self) -> [u8; CATALOG_HEADER_LEN] {
        let mut out = [0u8; CATALOG_HEADER_LEN];
        out[0..8].copy_from_slice(&CATALOG_MAGIC);
        out[8..10].copy_from_slice(&self.version.to_le_bytes());
        // out[10..12] reserved, left zeroed.
        out[12..20].copy_from_slice(&self.clock_resolution_ns.to_le_bytes());
        out[20..28].copy_from_slice(&self.origin_utc_ns.to_le_bytes());
        // out[28..32] reserved, left zeroed.
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < CATALOG_HEADER_LEN {
            return Err(DecodeError::Truncated {
                what: "catalog header",
            });
        }
        if buf[0..8] != CATALOG_MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let version = u16::from_le_bytes(buf[8..10].try_into().unwrap());
        if version != CATALOG_FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion { version });
        }
        let clock_resolution_ns = f64::from_le_bytes(buf[12..20].try_into().unwrap());
        let origin_utc_ns = i64::from_le_bytes(buf[20..28].try_into().unwrap());
        Ok(Self {
            version,
            clock_resolution_ns,
            origin_utc_ns,
        })
    }
}

/// Encodes one string-table entry: `(u32 length, bytes, u8 role_flags)`.
pub fn encode_string_entry(s: &IndexedString, out: &mut Vec<u8>) {
    out.extend_from_slice(&(s.bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&s.bytes);
    out.push(s.roles.bits());
}

/// Encodes the full string table, including its leading `u32` count.
pub fn encode_string_table(strings: &[IndexedString]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        encode_string_entry(s, &mut out);
    }
    out
}

/// Decodes the full string table (count-prefixed) from `buf`, returning the
/// strings in id order (id == index) and the number of bytes consumed.
pub fn decode_string_table(buf: &[u8]) -> Result<(Vec<IndexedString>, usize), DecodeError> {
    if buf.len() < 4 {
        return Err(DecodeError::Truncated {
            what: "string table count",
        });
    }
    let count = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let mut pos = 4;
    let mut strings = Vec::with_capacity(count as usize);
    for index in 0..count {
        if buf.len() < pos + 4 {
            return Err(DecodeError::Truncated {
                what: "string table entry length",
            });
        }
        let len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        if buf.len() < pos + len + 1 {
            return Err(DecodeError::BadStringLength { index });
        }
        let bytes = buf[pos..pos + len].to_vec();
        pos += len;
        let roles = StringRole::from_bits_truncate(buf[pos]);
        pos += 1;
        strings.push(IndexedString::new(bytes, roles));
    }
    Ok((strings, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = CatalogHeader::new(1_700_000_000_000_000_000, 100.0);
        let encoded = h.encode();
        assert_eq!(encoded.len(), CATALOG_HEADER_LEN);
        let decoded = CatalogHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut buf = [0u8; CATALOG_HEADER_LEN];
        buf[0] = b'x';
        assert!(matches!(
            CatalogHeader::decode(&buf),
            Err(DecodeError::BadMagic)
        ));
    }

    #[test]
    fn string_table_roundtrip() {
        let strings = vec![
            IndexedString::new(b"".to_vec(), StringRole::empty()),
            IndexedString::new(b"ui".to_vec(), StringRole::CATEGORY | StringRole::THREAD),
            IndexedString::new(b"ready".to_vec(), StringRole::FORMAT),
        ];
        let encoded = encode_string_table(&strings);
        let (decoded, consumed) = decode_string_table(&encoded).unwrap();
        assert_eq!(decoded, strings);
        assert_eq!(consumed, encoded.len());
    }
}
