//! Reader errors: every `sslogread` API that can fail returns a `Result`,
//! unlike the producer side which is infallible by design. Each variant
//! names the offending path, offset, or token.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReadError {
    #[snafu(display("failed to read log directory {}: {source}", path.display()))]
    OpenDirectory { path: PathBuf, source: std::io::Error },

    #[snafu(display("log directory {} has no catalog.sslog file", path.display()))]
    MissingCatalog { path: PathBuf },

    #[snafu(display("failed to read catalog {}: {source}", path.display()))]
    ReadCatalog { path: PathBuf, source: std::io::Error },

    #[snafu(display("catalog {} is corrupt at byte offset {offset}: {reason}", path.display()))]
    CorruptCatalog {
        path: PathBuf,
        offset: usize,
        reason: String,
    },

    #[snafu(display("failed to read chunk {}: {source}", path.display()))]
    ReadChunk { path: PathBuf, source: std::io::Error },

    #[snafu(display("unknown level name: '{token}'"))]
    UnknownLevel { token: String },

    #[snafu(display("malformed filter rule argument predicate: '{token}'"))]
    MalformedPredicate { token: String },
}
