//! Shared binary-format contract for `sslog` (the producer) and `sslogread`
//! (the query engine): the record frame codec, the catalog codec, argument
//! encoding, and format-string specifier parsing.
//!
//! Keeping this in its own crate, rather than duplicating codec logic in
//! both the writer and the reader, is what guarantees the wire format cannot
//! drift between the two sides.

pub mod arg;
pub mod catalog;
pub mod error;
pub mod frame;
pub mod layout;
pub mod level;
pub mod specifiers;
pub mod strings;

pub use arg::{Arg, ArgTag};
pub use catalog::{CatalogHeader, CATALOG_FORMAT_VERSION, CATALOG_HEADER_LEN, CATALOG_MAGIC};
pub use error::DecodeError;
pub use frame::{LogRecord, MAX_BUFFER_LEN};
pub use layout::{chunk_file_name, parse_chunk_index, CATALOG_FILE_NAME, CHUNK_FILE_PREFIX, CHUNK_FILE_SUFFIX};
pub use level::Level;
pub use strings::{IndexedString, StringRole, EMPTY_STRING_ID};
