//! Lock-free block FIFO between the audio thread and the observer
//!
//! Single producer, single consumer, fixed capacity of fixed-length sample
//! blocks. Storage is allocated once when the pair is created; `push` and
//! `pull` only copy samples and touch two atomics.
//!
//! CRITICAL: neither side ever blocks. A full ring drops the pushed block.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of blocks the ring holds
pub const FIFO_CAPACITY: usize = 30;

struct BlockRing {
    slots: Box<[UnsafeCell<Box<[f32]>>]>,
    block_size: usize,
    /// Next slot to write, modulo 2 * capacity (producer only)
    write_pos: AtomicUsize,
    /// Next slot to read, modulo 2 * capacity (consumer only)
    read_pos: AtomicUsize,
}

// Safe because a slot is written only by the producer while it is outside the
// readable window, and read only by the consumer after the Release store of
// write_pos published it.
unsafe impl Send for BlockRing {}
unsafe impl Sync for BlockRing {}

impl BlockRing {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Distance from read to write; indices run over 0..2 * capacity
    #[inline]
    fn occupied(&self, write: usize, read: usize) -> usize {
        let wrap = 2 * self.capacity();
        (write + wrap - read) % wrap
    }

    #[inline]
    fn advance(&self, pos: usize) -> usize {
        (pos + 1) % (2 * self.capacity())
    }

    #[inline]
    fn slot(&self, pos: usize) -> usize {
        pos % self.capacity()
    }
}

/// Create a connected producer/consumer pair for blocks of `block_size`
pub fn spectral_fifo(block_size: usize) -> (BlockProducer, BlockConsumer) {
    let slots = (0..FIFO_CAPACITY)
        .map(|_| UnsafeCell::new(vec![0.0f32; block_size].into_boxed_slice()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let ring = Arc::new(BlockRing {
        slots,
        block_size,
        write_pos: AtomicUsize::new(0),
        read_pos: AtomicUsize::new(0),
    });

    (
        BlockProducer {
            ring: Arc::clone(&ring),
        },
        BlockConsumer { ring },
    )
}

/// Audio-side writing end
pub struct BlockProducer {
    ring: Arc<BlockRing>,
}

impl BlockProducer {
    /// Copy one block into the ring
    ///
    /// Returns false, dropping the block, when the ring is full or the block
    /// length differs from the configured block size.
    #[inline]
    pub fn push(&mut self, block: &[f32]) -> bool {
        let ring = &*self.ring;
        if block.len() != ring.block_size {
            return false;
        }

        let write = ring.write_pos.load(Ordering::Relaxed);
        let read = ring.read_pos.load(Ordering::Acquire);
        if ring.occupied(write, read) == ring.capacity() {
            return false;
        }

        // SAFETY: the slot at `write` is outside the readable window until the
        // Release store below, and only this producer writes slots.
        unsafe {
            (*ring.slots[ring.slot(write)].get()).copy_from_slice(block);
        }
        ring.write_pos.store(ring.advance(write), Ordering::Release);
        true
    }

    /// Blocks currently waiting to be pulled
    #[inline]
    pub fn available_for_reading(&self) -> usize {
        let write = self.ring.write_pos.load(Ordering::Relaxed);
        let read = self.ring.read_pos.load(Ordering::Acquire);
        self.ring.occupied(write, read)
    }

    pub fn block_size(&self) -> usize {
        self.ring.block_size
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Observer-side reading end
pub struct BlockConsumer {
    ring: Arc<BlockRing>,
}

impl BlockConsumer {
    /// Copy the oldest block into `dest` and release its slot
    ///
    /// Returns false when the ring is empty. `dest` may be longer than the
    /// block size; only the first `block_size` samples are written. A shorter
    /// `dest` receives a truncated copy.
    #[inline]
    pub fn pull(&mut self, dest: &mut [f32]) -> bool {
        let ring = &*self.ring;
        let read = ring.read_pos.load(Ordering::Relaxed);
        let write = ring.write_pos.load(Ordering::Acquire);
        if ring.occupied(write, read) == 0 {
            return false;
        }

        // SAFETY: the Acquire load of write_pos made this slot's contents
        // visible, and the producer will not touch it until read_pos moves on.
        let block = unsafe { &*ring.slots[ring.slot(read)].get() };
        let n = dest.len().min(block.len());
        dest[..n].copy_from_slice(&block[..n]);

        ring.read_pos.store(ring.advance(read), Ordering::Release);
        true
    }

    /// Blocks currently waiting to be pulled
    #[inline]
    pub fn available_for_reading(&self) -> usize {
        let write = self.ring.write_pos.load(Ordering::Acquire);
        let read = self.ring.read_pos.load(Ordering::Relaxed);
        self.ring.occupied(write, read)
    }

    pub fn block_size(&self) -> usize {
        self.ring.block_size
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
