//! The multi-producer/single-consumer ring-buffer protocol.
//!
//! Every producer thread may call [`ByteRing::try_reserve`] concurrently.
//! Reservation is a single `fetch_add` on a shared write cursor; the caller
//! then owns that byte range exclusively until it writes the payload and
//! publishes it. The single consumer thread (the sink's writer) drains
//! published frames in reservation order via [`ByteRing::drain`].
//!
//! Readiness is tracked with a 4-byte header at the start of each reserved
//! region, written *last* by the producer — the classic "sequence number in
//! the first word" MPSC ring trick. The low 3 bytes hold the payload length;
//! the top byte is a dedicated ready marker ([`READY_MARKER`]) rather than
//! part of the length, since the length's own high-order byte is zero for
//! every real frame (payloads never reach 16 MiB) and so can't double as a
//! "published" flag. The consumer simply stops draining at the first region
//! whose marker isn't set and resumes next time it polls. A producer that
//! stalls mid-write only ever blocks the consumer on that one region, never
//! on later ones, because later regions are independently headered.
//!
//! The ring is stored as a `Box<[AtomicU8]>` rather than a bare `Vec<u8>`
//! behind an `UnsafeCell`: every byte is independently atomic, so producers
//! writing disjoint regions and the consumer reading published ones never
//! race, without reaching for raw pointers.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

const HEADER_LEN: usize = 4;
/// Sentinel stored in the header's top byte once a region is fully
/// written. Any nonzero, fixed value works; `0xFF` reads unambiguously in a
/// hex dump of a stalled ring.
const READY_MARKER: u8 = 0xFF;
/// Payload length is encoded in the header's low 3 bytes, so it must fit in
/// 24 bits. Real frames (records, staged strings) are nowhere near this.
const MAX_PAYLOAD_LEN: usize = 0x00FF_FFFF;

/// A fixed-capacity circular byte buffer supporting the MPSC reservation
/// protocol described above. `T` is not stored directly; callers encode
/// their payload to bytes and hand them to [`ByteRing::try_reserve`].
pub struct ByteRing {
    storage: Box<[AtomicU8]>,
    capacity: u64,
    write_cursor: CachePadded<AtomicU64>,
    read_cursor: CachePadded<AtomicU64>,
    /// High-water mark of `write_cursor - read_cursor`, used for
    /// `maxUsageDataBufferBytes` / `maxUsageStringBufferBytes` stats.
    peak_usage: CachePadded<AtomicU64>,
}

/// A successfully reserved, not-yet-published region of the ring.
pub struct Reservation<'a> {
    ring: &'a ByteRing,
    offset: u64,
    payload_len: u32,
}

impl ByteRing {
    pub fn new(capacity_bytes: usize) -> Self {
        let capacity = capacity_bytes.max(HEADER_LEN + 1) as u64;
        let storage = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        Self {
            storage,
            capacity,
            write_cursor: CachePadded::new(AtomicU64::new(0)),
            read_cursor: CachePadded::new(AtomicU64::new(0)),
            peak_usage: CachePadded::new(AtomicU64::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    pub fn peak_usage_bytes(&self) -> u64 {
        self.peak_usage.load(Ordering::Relaxed)
    }

    /// Attempts to reserve `HEADER_LEN + payload_len` bytes. Returns `None`
    /// (a dropped record) if the reservation would wrap past data the
    /// consumer hasn't read yet.
    pub fn try_reserve(&self, payload_len: usize) -> Option<Reservation<'_>> {
        if payload_len > MAX_PAYLOAD_LEN {
            return None;
        }
        let frame_len = (HEADER_LEN + payload_len) as u64;
        if frame_len >= self.capacity {
            // A single frame may never consume the whole ring: the consumer
            // needs room to distinguish "ready" from "not yet fully written".
            return None;
        }
        loop {
            let read = self.read_cursor.load(Ordering::Acquire);
            let write = self.write_cursor.load(Ordering::Acquire);
            if write + frame_len - read > self.capacity {
                return None;
            }
            if self
                .write_cursor
                .compare_exchange_weak(write, write + frame_len, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.peak_usage
                    .fetch_max(write + frame_len - read, Ordering::Relaxed);
                return Some(Reservation {
                    ring: self,
                    offset: write,
                    payload_len: payload_len as u32,
                });
            }
        }
    }

    fn index(&self, logical_offset: u64) -> usize {
        (logical_offset % self.capacity) as usize
    }

    /// Drains every fully published frame currently available, invoking
    /// `on_frame` with each payload in reservation order, stopping at the
    /// first unready (or absent) region. Called only from the single
    /// consumer thread.
    pub fn drain(&self, mut on_frame: impl FnMut(&[u8])) {
        loop {
            let read = self.read_cursor.load(Ordering::Relaxed);
            let write = self.write_cursor.load(Ordering::Acquire);
            if read == write {
                return;
            }
            let header_pos = self.index(read);
            let header_bytes = self.read_header(header_pos);
            let Some(payload_len) = header_bytes else {
                return; // still being written; try again on the next poll.
            };
            if payload_len == 0 {
                // A zero-length publish can't legally happen for real frames
                // (every encoded record/string is non-empty); treat it
                // defensively as "not ready" rather than looping forever.
                return;
            }
            let payload_start = (header_pos + HEADER_LEN) % self.capacity as usize;
            let mut payload = Vec::with_capacity(payload_len as usize);
            for i in 0..payload_len as usize {
                let idx = (payload_start + i) % self.capacity as usize;
                payload.push(self.storage[idx].load(Ordering::Acquire));
            }
            on_frame(&payload);
            self.read_cursor
                .store(read + HEADER_LEN as u64 + payload_len as u64, Ordering::Release);
        }
    }

    fn read_header(&self, header_pos: usize) -> Option<u32> {
        // The marker byte is the one the producer stores with Release
        // ordering; load it first so a `Some` result here happens-after the
        // producer's full write of the payload and the other header bytes.
        let marker = self.storage[(header_pos + HEADER_LEN - 1) % self.capacity as usize]
            .load(Ordering::Acquire);
        if marker != READY_MARKER {
            return None;
        }
        let mut len_bytes = [0u8; 4];
        for (i, b) in len_bytes.iter_mut().enumerate().take(HEADER_LEN - 1) {
            *b = self.storage[(header_pos + i) % self.capacity as usize].load(Ordering::Relaxed);
        }
        Some(u32::from_le_bytes(len_bytes))
    }
}

impl<'a> Reservation<'a> {
    /// Writes `payload` into the reserved region and publishes it. `payload`
    /// must be exactly the length passed to `try_reserve`.
    pub fn publish(self, payload: &[u8]) {
        debug_assert_eq!(payload.len(), self.payload_len as usize);
        let ring = self.ring;
        let header_pos = ring.index(self.offset);
        let payload_start = (header_pos + HEADER_LEN) % ring.capacity as usize;
        for (i, &b) in payload.iter().enumerate() {
            let idx = (payload_start + i) % ring.capacity as usize;
            ring.storage[idx].store(b, Ordering::Relaxed);
        }
        // Length bytes first (Relaxed), ready marker last (Release): the
        // marker byte is what `read_header` gates on, independent of the
        // length's own value.
        let header_bytes = self.payload_len.to_le_bytes();
        for i in 0..HEADER_LEN - 1 {
            let idx = (header_pos + i) % ring.capacity as usize;
            ring.storage[idx].store(header_bytes[i], Ordering::Relaxed);
        }
        let marker_idx = (header_pos + HEADER_LEN - 1) % ring.capacity as usize;
        ring.storage[marker_idx].store(READY_MARKER, Ordering::Release);
    }
}
