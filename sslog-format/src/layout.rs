//! Directory layout constants: file names shared by the writer
//! (`sslog::sink`) and the reader (`sslogread`) so the two sides can never
//! disagree about where the catalog or a chunk lives.

pub const CATALOG_FILE_NAME: &str = "catalog.sslog";
pub const CHUNK_FILE_PREFIX: &str = "chunk-";
pub const CHUNK_FILE_SUFFIX: &str = ".sslog";

/// Builds the file name for chunk `index`, e.g. `chunk-00000.sslog`.
pub fn chunk_file_name(index: u32) -> String {
    format!("{CHUNK_FILE_PREFIX}{index:05}{CHUNK_FILE_SUFFIX}")
}

/// Parses a chunk index back out of a file name produced by
/// [`chunk_file_name`], returning `None` for anything else found in the
/// log directory (including the catalog file itself).
pub fn parse_chunk_index(file_name: &str) -> Option<u32> {
    let stem = file_name
        .strip_prefix(CHUNK_FILE_PREFIX)?
        .strip_suffix(CHUNK_FILE_SUFFIX)?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for i in [0, 1, 42, 99999] {
            let name = chunk_file_name(i);
            assert_eq!(parse_chunk_index(&name), Some(i));
        }
    }

    #[test]
    fn rejects_unrelated_names() {
        assert_eq!(parse_chunk_index("catalog.sslog"), None);
        assert_eq!(parse_chunk_index("chunk-abc.sslog"), None);
    }
}
