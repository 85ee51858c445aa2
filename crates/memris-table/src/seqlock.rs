use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

/// Default retry cap before falling back to the shared read-lock path
/// (spec.md §5 "Cap at a small number of retries (e.g. 16)").
pub const DEFAULT_MAX_RETRIES: u32 = 16;

/// A per-row sequence lock (spec.md §3, §5): an even counter denotes
/// "stable", odd denotes "write in progress". One [`RowSeqlock`] per row,
/// kept adjacent to the row's other bookkeeping (spec.md §9 "keep the lock
/// word adjacent to the row's id in memory layout").
pub struct RowSeqlock {
    seq: AtomicU32,
    /// Slow-path fallback once a reader exhausts its retry budget (spec.md
    /// §5 "take a read path that synchronizes with a shared write lock").
    slow_path: RwLock<()>,
}

impl Default for RowSeqlock {
    fn default() -> Self {
        Self { seq: AtomicU32::new(0), slow_path: RwLock::new(()) }
    }
}

impl RowSeqlock {
    pub fn is_stable(&self) -> bool {
        self.seq.load(Ordering::Acquire) % 2 == 0
    }

    /// Writer-side: `read → require even → store odd → write columns
    /// (caller-provided) → store even` (spec.md §5).
    pub fn write<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.slow_path.write();
        let s0 = self.seq.load(Ordering::Acquire);
        debug_assert_eq!(s0 % 2, 0, "writer observed an odd sequence: concurrent writer on the same row");
        self.seq.store(s0.wrapping_add(1), Ordering::Release);
        let result = f();
        self.seq.store(s0.wrapping_add(2), Ordering::Release);
        result
    }

    /// Reader-side optimistic read with a bounded retry budget, falling
    /// back to the shared read lock on exhaustion (spec.md §5, §7
    /// "concurrent-read-starvation").
    pub fn read<R>(&self, max_retries: u32, mut f: impl FnMut() -> R) -> R {
        for _ in 0..max_retries {
            let s0 = self.seq.load(Ordering::Acquire);
            if s0 % 2 != 0 {
                std::hint::spin_loop();
                continue;
            }
            let result = f();
            let s1 = self.seq.load(Ordering::Acquire);
            if s0 == s1 {
                return result;
            }
        }
        log::trace!("seqlock retry cap reached, escalating to shared read lock");
        let _guard = self.slow_path.read();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn write_brackets_end_even() {
        let lock = RowSeqlock::default();
        lock.write(|| {});
        assert!(lock.is_stable());
    }

    #[test]
    fn no_reader_observes_a_torn_value() {
        let lock = Arc::new(RowSeqlock::default());
        let cell = Arc::new(AtomicI32::new(0));

        let writer_lock = lock.clone();
        let writer_cell = cell.clone();
        let writer = std::thread::spawn(move || {
            for i in 1..=200 {
                writer_lock.write(|| writer_cell.store(i, Ordering::Relaxed));
            }
        });

        let mut observations = std::collections::HashSet::new();
        for _ in 0..2000 {
            let v = lock.read(DEFAULT_MAX_RETRIES, || cell.load(Ordering::Relaxed));
            observations.insert(v);
        }
        writer.join().unwrap();
        for v in observations {
            assert!((0..=200).contains(&v));
        }
    }
}
