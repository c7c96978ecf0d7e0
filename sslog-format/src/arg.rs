use crate::error::{DecodeError, UnknownArgTagSnafu};
use snafu::OptionExt;

/// A single runtime argument value attached to a log record.
///
/// `StringIdx` refers back into the session's indexed-string table rather
/// than carrying its bytes inline: repeated string-valued arguments (the
/// common case for enum-like values) are interned once and referenced by id
/// afterwards, same as category/thread/format names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    Float(f32),
    Double(f64),
    StringIdx(u32),
}

/// Wire type tags. Values are part of the on-disk format; never renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArgTag {
    S32 = 0,
    U32 = 1,
    S64 = 2,
    U64 = 3,
    Float = 4,
    Double = 5,
    StringIdx = 6,
}

impl ArgTag {
    fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => ArgTag::S32,
            1 => ArgTag::U32,
            2 => ArgTag::S64,
            3 => ArgTag::U64,
            4 => ArgTag::Float,
            5 => ArgTag::Double,
            6 => ArgTag::StringIdx,
            _ => return None,
        })
    }
}

impl Arg {
    pub fn tag(&self) -> ArgTag {
        match self {
            Arg::S32(_) => ArgTag::S32,
            Arg::U32(_) => ArgTag::U32,
            Arg::S64(_) => ArgTag::S64,
            Arg::U64(_) => ArgTag::U64,
            Arg::Float(_) => ArgTag::Float,
            Arg::Double(_) => ArgTag::Double,
            Arg::StringIdx(_) => ArgTag::StringIdx,
        }
    }

    /// Size, in bytes, of this argument's value on the wire (not counting
    /// the leading type tag byte).
    pub fn encoded_value_len(&self) -> usize {
        match self {
            Arg::S32(_) | Arg::U32(_) | Arg::Float(_) | Arg::StringIdx(_) => 4,
            Arg::S64(_) | Arg::U64(_) | Arg::Double(_) => 8,
        }
    }

    /// Total encoded size including the 1-byte type tag.
    pub fn encoded_len(&self) -> usize {
        1 + self.encoded_value_len()
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Arg::StringIdx(_))
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.tag() as u8);
        match *self {
            Arg::S32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::S64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::U64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
            Arg::StringIdx(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Decodes one argument, returning it and the number of bytes consumed.
    pub fn decode(buf: &[u8]) -> Result<(Arg, usize), DecodeError> {
        let &tag_byte = buf
            .first()
            .ok_or(DecodeError::Truncated { what: "arg tag" })?;
        let tag = ArgTag::from_u8(tag_byte).context(UnknownArgTagSnafu { tag: tag_byte })?;
        let value = &buf[1..];
        macro_rules! take {
            ($n:expr, $ty:ty, $ctor:path) => {{
                if value.len() < $n {
                    return Err(DecodeError::Truncated {
                        what: "arg value",
                    });
                }
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&value[..$n]);
                ($ctor(<$ty>::from_le_bytes(raw)), 1 + $n)
            }};
        }
        let (arg, consumed) = match tag {
            ArgTag::S32 => take!(4, i32, Arg::S32),
            ArgTag::U32 => take!(4, u32, Arg::U32),
            ArgTag::S64 => take!(8, i64, Arg::S64),
            ArgTag::U64 => take!(8, u64, Arg::U64),
            ArgTag::Float => take!(4, f32, Arg::Float),
            ArgTag::Double => take!(8, f64, Arg::Double),
            ArgTag::StringIdx => take!(4, u32, Arg::StringIdx),
        };
        Ok((arg, consumed))
    }
}
