//! Wait-free parameter handoff
//!
//! A triple buffer of [`ParameterSnapshot`]: the control side publishes
//! whole snapshots, the audio side picks up the latest one once per block.
//! Neither side ever waits for the other and a reader can only observe a
//! snapshot that was completely written.

use super::{ParameterId, ParameterSnapshot};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Low two bits: index of the buffer in the middle position
const INDEX_MASK: u8 = 0b011;
/// Set when the middle buffer holds a snapshot the reader has not seen yet
const FRESH_BIT: u8 = 0b100;

struct TripleBuffer {
    slots: [UnsafeCell<ParameterSnapshot>; 3],
    middle: AtomicU8,
}

// Safe because each slot is owned by exactly one side at a time: the writer
// owns its back slot, the reader owns its front slot, and ownership of the
// middle slot only changes hands through the atomic swap on `middle`.
unsafe impl Send for TripleBuffer {}
unsafe impl Sync for TripleBuffer {}

/// Create the control-side store and the audio-side feed
pub fn parameter_channel(initial: ParameterSnapshot) -> (ParameterStore, ParameterFeed) {
    let initial = initial.clamped();
    let shared = Arc::new(TripleBuffer {
        slots: [
            UnsafeCell::new(initial),
            UnsafeCell::new(initial),
            UnsafeCell::new(initial),
        ],
        middle: AtomicU8::new(1),
    });

    let store = ParameterStore {
        shared: Arc::clone(&shared),
        back: 2,
        current: initial,
    };
    let feed = ParameterFeed { shared, front: 0 };
    (store, feed)
}

/// Control-side owner of the parameter values (single writer)
///
/// Every change is clamped and published as a complete snapshot. The store
/// also keeps its own copy so the control context can read the current
/// state without touching the shared buffers.
pub struct ParameterStore {
    shared: Arc<TripleBuffer>,
    back: usize,
    current: ParameterSnapshot,
}

impl ParameterStore {
    /// Current values as last published
    pub fn snapshot(&self) -> ParameterSnapshot {
        self.current
    }

    /// Change one parameter
    pub fn set(&mut self, id: ParameterId, value: f32) {
        let next = self.current.with_value(id, value);
        self.publish(next);
    }

    /// Replace every parameter at once
    pub fn set_snapshot(&mut self, snapshot: ParameterSnapshot) {
        self.publish(snapshot.clamped());
    }

    /// Replace the parameters with a persisted state
    pub fn restore(&mut self, json: &serde_json::Value) -> crate::Result<()> {
        let snapshot = ParameterSnapshot::from_json(json)?;
        self.publish(snapshot);
        log::debug!("Restored parameter state: {:?}", snapshot);
        Ok(())
    }

    fn publish(&mut self, snapshot: ParameterSnapshot) {
        // SAFETY: the back slot is never visible to the reader until the
        // swap below hands it over.
        unsafe {
            *self.shared.slots[self.back].get() = snapshot;
        }
        let previous = self
            .shared
            .middle
            .swap(self.back as u8 | FRESH_BIT, Ordering::AcqRel);
        self.back = (previous & INDEX_MASK) as usize;
        self.current = snapshot;
    }
}

/// Audio-side reader of the latest parameters (single reader)
pub struct ParameterFeed {
    shared: Arc<TripleBuffer>,
    front: usize,
}

impl ParameterFeed {
    /// Latest complete snapshot; never blocks, never allocates
    pub fn latest(&mut self) -> ParameterSnapshot {
        if self.shared.middle.load(Ordering::Relaxed) & FRESH_BIT != 0 {
            let previous = self.shared.middle.swap(self.front as u8, Ordering::AcqRel);
            self.front = (previous & INDEX_MASK) as usize;
        }
        // SAFETY: the front slot belongs to the reader until it swaps it back
        // into the middle position.
        unsafe { *self.shared.slots[self.front].get() }
    }

    /// True when a snapshot newer than the last `latest` call is waiting
    pub fn has_update(&self) -> bool {
        self.shared.middle.load(Ordering::Relaxed) & FRESH_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Slope;
    use std::thread;

    #[test]
    fn test_feed_starts_with_initial_snapshot() {
        let initial = ParameterSnapshot {
            peak_gain_db: 3.0,
            ..Default::default()
        };
        let (store, mut feed) = parameter_channel(initial);
        assert_eq!(store.snapshot(), initial);
        assert_eq!(feed.latest(), initial);
        assert!(!feed.has_update());
    }

    #[test]
    fn test_last_write_wins() {
        let (mut store, mut feed) = parameter_channel(ParameterSnapshot::default());
        store.set(ParameterId::PeakGain, 3.0);
        store.set(ParameterId::PeakGain, 6.0);
        store.set(ParameterId::LowCutSlope, 2.0);
        assert!(feed.has_update());

        let latest = feed.latest();
        assert_eq!(latest.peak_gain_db, 6.0);
        assert_eq!(latest.low_cut_slope, Slope::Db36);
        assert!(!feed.has_update());

        // Reading again without a write returns the same snapshot
        assert_eq!(feed.latest(), latest);
    }

    #[test]
    fn test_store_clamps_values() {
        let (mut store, mut feed) = parameter_channel(ParameterSnapshot::default());
        store.set(ParameterId::PeakQuality, 50.0);
        assert_eq!(store.snapshot().peak_quality, 10.0);
        assert_eq!(feed.latest().peak_quality, 10.0);
    }

    #[test]
    fn test_restore_from_json() {
        let (mut store, mut feed) = parameter_channel(ParameterSnapshot::default());
        let json = serde_json::json!({ "peak_freq": 1000.0, "peak_gain_db": 6.0 });
        store.restore(&json).unwrap();
        assert_eq!(feed.latest().peak_freq, 1000.0);

        let bad = serde_json::json!({ "peak_freq": "loud" });
        assert!(store.restore(&bad).is_err());
        assert_eq!(store.snapshot().peak_freq, 1000.0);
    }

    #[test]
    fn test_reader_never_sees_torn_snapshot() {
        let uniform = |f: f32| ParameterSnapshot {
            low_cut_freq: f,
            high_cut_freq: f,
            peak_freq: f,
            ..Default::default()
        };
        let (mut store, mut feed) = parameter_channel(uniform(20.0));

        // Every published snapshot keeps all three frequencies equal
        let writer = thread::spawn(move || {
            for i in 0..20_000u32 {
                store.set_snapshot(uniform(20.0 + (i % 19_000) as f32));
            }
        });

        let mut reads = 0;
        while !writer.is_finished() || reads < 1000 {
            let s = feed.latest();
            assert_eq!(s.low_cut_freq, s.high_cut_freq);
            assert_eq!(s.low_cut_freq, s.peak_freq);
            reads += 1;
        }
        writer.join().unwrap();
    }
}
