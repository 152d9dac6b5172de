//! Per-channel sample accumulator
//!
//! The host may hand the processor blocks of any length. The accumulator
//! gathers one channel's samples into fixed-size blocks and pushes every
//! completed block into the channel's [`BlockProducer`].

use super::fifo::BlockProducer;

pub struct ChannelSampleFifo {
    producer: BlockProducer,
    block: Box<[f32]>,
    filled: usize,
    dropped: u64,
}

impl ChannelSampleFifo {
    pub fn new(producer: BlockProducer) -> Self {
        let block = vec![0.0f32; producer.block_size()].into_boxed_slice();
        Self {
            producer,
            block,
            filled: 0,
            dropped: 0,
        }
    }

    /// Append processed samples; pushes as soon as a block is full
    #[inline]
    pub fn update(&mut self, samples: &[f32]) {
        if self.block.is_empty() {
            return;
        }
        let mut rest = samples;
        while !rest.is_empty() {
            let take = (self.block.len() - self.filled).min(rest.len());
            self.block[self.filled..self.filled + take].copy_from_slice(&rest[..take]);
            self.filled += take;
            rest = &rest[take..];

            if self.filled == self.block.len() {
                if !self.producer.push(&self.block) {
                    self.dropped += 1;
                }
                self.filled = 0;
            }
        }
    }

    /// Blocks dropped because the observer fell behind
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped
    }

    /// Samples waiting for the current block to fill
    pub fn pending(&self) -> usize {
        self.filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fifo::{spectral_fifo, FIFO_CAPACITY};

    #[test]
    fn test_pushes_only_complete_blocks() {
        let (producer, mut consumer) = spectral_fifo(4);
        let mut fifo = ChannelSampleFifo::new(producer);

        fifo.update(&[1.0, 2.0, 3.0]);
        assert_eq!(consumer.available_for_reading(), 0);
        assert_eq!(fifo.pending(), 3);

        fifo.update(&[4.0, 5.0]);
        assert_eq!(consumer.available_for_reading(), 1);
        assert_eq!(fifo.pending(), 1);

        let mut out = [0.0; 4];
        assert!(consumer.pull(&mut out));
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_long_input_splits_into_blocks() {
        let (producer, mut consumer) = spectral_fifo(2);
        let mut fifo = ChannelSampleFifo::new(producer);
        let input: Vec<f32> = (0..7).map(|i| i as f32).collect();
        fifo.update(&input);

        assert_eq!(consumer.available_for_reading(), 3);
        let mut out = [0.0; 2];
        assert!(consumer.pull(&mut out));
        assert_eq!(out, [0.0, 1.0]);
        assert!(consumer.pull(&mut out));
        assert!(consumer.pull(&mut out));
        assert_eq!(out, [4.0, 5.0]);
        assert_eq!(fifo.pending(), 1);
    }

    #[test]
    fn test_counts_dropped_blocks() {
        let (producer, consumer) = spectral_fifo(1);
        let mut fifo = ChannelSampleFifo::new(producer);
        fifo.update(&vec![0.5; FIFO_CAPACITY + 3]);
        assert_eq!(consumer.available_for_reading(), FIFO_CAPACITY);
        assert_eq!(fifo.dropped_blocks(), 3);
    }
}
