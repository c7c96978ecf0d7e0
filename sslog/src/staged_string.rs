//! Wire format used between the collector and the sink for the *string*
//! ring buffer only. This is an in-process handoff format, not part of the
//! on-disk catalog contract, so it lives here rather than in
//! `sslog-format`.

use sslog_format::{IndexedString, StringRole};

pub fn encode(id: u32, s: &IndexedString) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 4 + s.bytes.len() + 1);
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(s.bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&s.bytes);
    out.push(s.roles.bits());
    out
}

pub fn decode(buf: &[u8]) -> Option<(u32, IndexedString)> {
    if buf.len() < 9 {
        return None;
    }
    let id = u32::from_le_bytes(buf[0..4].try_into().ok()?);
    let len = u32::from_le_bytes(buf[4..8].try_into().ok()?) as usize;
    if buf.len() < 8 + len + 1 {
        return None;
    }
    let bytes = buf[8..8 + len].to_vec();
    let roles = StringRole::from_bits_truncate(buf[8 + len]);
    Some((id, IndexedString::new(bytes, roles)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let s = IndexedString::new(b"category-a".to_vec(), StringRole::CATEGORY);
        let encoded = encode(42, &s);
        let (id, decoded) = decode(&encoded).unwrap();
        assert_eq!(id, 42);
        assert_eq!(decoded, s);
    }
}
