//! Base64 export of binary record buffers, for JSON-mode consumers of the
//! reader that can't emit raw bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode_buffer(buffer: &[u8]) -> String {
    STANDARD.encode(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_value() {
        assert_eq!(encode_buffer(b"hello"), "aGVsbG8=");
    }

    #[test]
    fn empty_buffer_encodes_to_empty_string() {
        assert_eq!(encode_buffer(&[]), "");
    }
}
