//! Chunk file discovery: chunk files are numbered and concatenate to the
//! full session.

use crate::error::{OpenDirectorySnafu, ReadError};
use snafu::ResultExt;
use sslog_format::parse_chunk_index;
use std::path::{Path, PathBuf};

/// Lists chunk files under `dir` in ascending chunk-index order, ignoring
/// the catalog file and anything else that doesn't match the
/// `chunk-NNNNN.sslog` naming convention.
pub(crate) fn discover_chunks(dir: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut found: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir).context(OpenDirectorySnafu { path: dir.to_path_buf() })? {
        let entry = entry.context(OpenDirectorySnafu { path: dir.to_path_buf() })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(index) = parse_chunk_index(name) {
            found.push((index, path));
        }
    }
    found.sort_by_key(|(index, _)| *index);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}
