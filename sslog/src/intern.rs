//! The indexed-string table: a concurrent, append-only interner that
//! assigns a stable `u32` id to each distinct string, recording the union of
//! roles (category/thread/format/arg-value) it has been used under.
//!
//! Reads (`get`, `get_flags`) go through an [`arc_swap::ArcSwap`] snapshot of
//! the id→string vector, so looking up an id already known to the caller
//! never blocks on the insertion path. Insertion itself is serialized by a
//! `parking_lot::Mutex` guarding the `bytes -> id` map; on a new string it
//! builds the next snapshot and swaps it in. A lookup racing a fresh insert
//! may briefly see the old snapshot and fall through to the mutex-guarded
//! slow path.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use sslog_format::{IndexedString, StringRole};
use std::collections::HashMap;
use std::sync::Arc;

pub struct StringTable {
    snapshot: ArcSwap<Vec<IndexedString>>,
    insert_lock: Mutex<HashMap<Vec<u8>, u32>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        let empty = IndexedString::new(Vec::new(), StringRole::empty());
        let mut index = HashMap::new();
        index.insert(Vec::new(), 0u32);
        Self {
            snapshot: ArcSwap::from_pointee(vec![empty]),
            insert_lock: Mutex::new(index),
        }
    }

    /// Returns the existing id for `s` (OR-ing `role` into its flags) or
    /// assigns the next free one. Returns the id and whether it was newly
    /// assigned this call — callers use the latter to decide whether to
    /// stage the string into the string ring for the writer.
    pub fn intern(&self, s: &[u8], role: StringRole) -> (u32, bool) {
        let mut index = self.insert_lock.lock();
        if let Some(&id) = index.get(s) {
            let mut table = (**self.snapshot.load()).clone();
            if !table[id as usize].roles.contains(role) {
                table[id as usize].roles.insert(role);
                self.snapshot.store(Arc::new(table));
            }
            return (id, false);
        }
        let mut table = (**self.snapshot.load()).clone();
        let id = table.len() as u32;
        table.push(IndexedString::new(s.to_vec(), role));
        index.insert(s.to_vec(), id);
        self.snapshot.store(Arc::new(table));
        (id, true)
    }

    pub fn get(&self, id: u32) -> Option<IndexedString> {
        self.snapshot.load().get(id as usize).cloned()
    }

    pub fn get_flags(&self, id: u32) -> Option<StringRole> {
        self.snapshot.load().get(id as usize).map(|s| s.roles)
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full snapshot of every interned string, in id order. Used by the sink
    /// when flushing the catalog and by tests asserting density (§8 property
    /// 5: ids used are a dense `0..n`).
    pub fn snapshot(&self) -> Arc<Vec<IndexedString>> {
        self.snapshot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_id_zero() {
        let table = StringTable::new();
        assert_eq!(table.get(0).unwrap().bytes, Vec::<u8>::new());
    }

    #[test]
    fn repeated_intern_returns_same_id() {
        let table = StringTable::new();
        let (id1, is_new1) = table.intern(b"ui", StringRole::CATEGORY);
        let (id2, is_new2) = table.intern(b"ui", StringRole::CATEGORY);
        assert_eq!(id1, id2);
        assert!(is_new1);
        assert!(!is_new2);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let table = StringTable::new();
        let (id_a, _) = table.intern(b"a", StringRole::CATEGORY);
        let (id_b, _) = table.intern(b"b", StringRole::CATEGORY);
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn roles_are_unioned_across_uses() {
        let table = StringTable::new();
        let (id, _) = table.intern(b"shared", StringRole::CATEGORY);
        table.intern(b"shared", StringRole::THREAD);
        let flags = table.get_flags(id).unwrap();
        assert!(flags.contains(StringRole::CATEGORY));
        assert!(flags.contains(StringRole::THREAD));
    }

    #[test]
    fn ids_are_dense() {
        let table = StringTable::new();
        for i in 0..50 {
            table.intern(format!("s{i}").as_bytes(), StringRole::ARG_VALUE);
        }
        assert_eq!(table.len(), 51); // + the empty string at id 0
        let snap = table.snapshot();
        assert_eq!(snap.len(), table.len());
    }
}
