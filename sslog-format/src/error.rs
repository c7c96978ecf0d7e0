use snafu::Snafu;

/// Errors raised while decoding catalog bytes or a record frame.
///
/// These are low-level, byte-offset-free errors; `sslogread::ReadError`
/// wraps them with the file and offset context a user actually wants to see.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("truncated while reading {what}"))]
    Truncated { what: &'static str },

    #[snafu(display("unknown argument type tag: {tag}"))]
    UnknownArgTag { tag: u8 },

    #[snafu(display("catalog magic bytes did not match"))]
    BadMagic,

    #[snafu(display("unsupported catalog format version: {version}"))]
    UnsupportedVersion { version: u16 },

    #[snafu(display("unknown level value: {raw}"))]
    UnknownLevel { raw: u8 },

    #[snafu(display("string table entry {index} has an invalid length"))]
    BadStringLength { index: u32 },
}
