//! Thread-local id caching exercised with a deliberately adversarial mix of
//! threads: some are named up front, some log before
//! ever calling [`Collector::set_thread_name`] and so fall back to the
//! default `THREAD_COUNTER`-derived name, and some threads are short-lived
//! and replaced by new ones reusing the same OS thread-local storage slot.
//! This is also the regression test for the collector's logging entry point
//! correctly avoiding a self-deadlock against its own session lock: every
//! thread here logs before any other thread has necessarily interned its
//! default name, so any reentrant-locking bug would hang this test.

use sslog::{ArgInput, Collector, Level};
use std::sync::Arc;
use std::sync::Barrier;

#[test]
fn mixed_named_and_anonymous_threads_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let c = Collector::new();
    c.set_storage_path(dir.path());
    c.start().unwrap();

    const NAMED_THREADS: usize = 3;
    const ANON_THREADS: usize = 5;
    const PER_THREAD: usize = 200;
    let total_threads = NAMED_THREADS + ANON_THREADS;
    let barrier = Arc::new(Barrier::new(total_threads));

    let mut handles = Vec::new();
    for i in 0..NAMED_THREADS {
        let c = c.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            c.set_thread_name(&format!("named-{i}"));
            barrier.wait();
            for seq in 0..PER_THREAD {
                c.log(Level::Info, "mix", "seq=%d", &[ArgInput::from(seq as i32)], None);
            }
        }));
    }
    for _ in 0..ANON_THREADS {
        let c = c.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(std::thread::spawn(move || {
            // No set_thread_name: the very first log() call must intern a
            // default thread name itself, while holding the session lock.
            barrier.wait();
            for seq in 0..PER_THREAD {
                c.log(Level::Info, "mix", "seq=%d", &[ArgInput::from(seq as i32)], None);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    c.stop();

    let stats = c.get_stats();
    assert_eq!(stats.stored_logs + stats.dropped_logs, (total_threads * PER_THREAD) as u64);
}

/// A thread that logs, is joined, and is replaced by a fresh thread: the
/// new thread must not inherit the old one's cached thread-local id.
#[test]
fn replaced_thread_gets_its_own_identity() {
    let dir = tempfile::tempdir().unwrap();
    let c = Collector::new();
    c.set_storage_path(dir.path());
    c.start().unwrap();

    for gen in 0..4 {
        let c = c.clone();
        std::thread::spawn(move || {
            c.log(Level::Info, "gen", "g=%d", &[ArgInput::from(gen)], None);
        })
        .join()
        .unwrap();
    }
    c.stop();

    let stats = c.get_stats();
    assert_eq!(stats.stored_logs, 4);
    assert_eq!(stats.dropped_logs, 0);
}
