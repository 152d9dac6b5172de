//! Stereo equalizer processor
//!
//! Owns the left/right [`MonoPath`]s, the [`ChainController`] and the audio
//! side of both the parameter channel and the analyzer FIFOs. Everything the
//! audio callback needs is allocated in [`EqProcessor::prepare`].

use super::controller::{ChainCoefficients, ChainController};
use super::fifo::{spectral_fifo, BlockConsumer};
use super::sample_fifo::ChannelSampleFifo;
use crate::dsp::{MonoPath, StageRole};
use crate::error::{EqError, Result};
use crate::params::ParameterFeed;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// Observer ends of the two channel FIFOs, handed out by `prepare`
pub struct AnalyzerTaps {
    pub left: BlockConsumer,
    pub right: BlockConsumer,
}

pub struct EqProcessor {
    feed: ParameterFeed,
    controller: ChainController,
    paths: [MonoPath; 2],
    taps: Option<[ChannelSampleFifo; 2]>,
    scratch: [Vec<f32>; 2],
    sample_rate: f64,
    block_size: usize,
}

impl EqProcessor {
    pub fn new(feed: ParameterFeed) -> Self {
        Self {
            feed,
            controller: ChainController::new(),
            paths: [MonoPath::new(), MonoPath::new()],
            taps: None,
            scratch: [Vec::new(), Vec::new()],
            sample_rate: 0.0,
            block_size: 0,
        }
    }

    /// Prepare for a (re)started stream
    ///
    /// Resets filter history, seeds the coefficients from the latest
    /// parameters and creates fresh analyzer FIFOs sized to `block_size`.
    pub fn prepare(&mut self, sample_rate: f64, block_size: usize) -> Result<AnalyzerTaps> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EqError::InvalidSampleRate { sample_rate });
        }
        if block_size == 0 {
            return Err(EqError::InvalidBlockSize { block_size });
        }

        self.sample_rate = sample_rate;
        self.block_size = block_size;
        for path in &mut self.paths {
            path.prepare(sample_rate, block_size);
        }

        let (left_producer, left) = spectral_fifo(block_size);
        let (right_producer, right) = spectral_fifo(block_size);
        self.taps = Some([
            ChannelSampleFifo::new(left_producer),
            ChannelSampleFifo::new(right_producer),
        ]);
        self.scratch = [vec![0.0; block_size], vec![0.0; block_size]];

        self.update_filters();
        log::debug!(
            "Prepared EQ processor: {} Hz, {} samples per block",
            sample_rate,
            block_size
        );
        Ok(AnalyzerTaps { left, right })
    }

    pub fn is_prepared(&self) -> bool {
        self.taps.is_some()
    }

    /// Pull the latest parameters and apply them to both channels now
    ///
    /// `process_block` does this on its own; call it after a state restore
    /// so the paths match the new parameters before the next block. Before
    /// `prepare` there is no sample rate to design for, so this does nothing
    /// and `prepare` seeds the coefficients instead.
    pub fn update_filters(&mut self) {
        if !self.is_prepared() {
            return;
        }
        let snapshot = self.feed.latest();
        self.controller
            .recompute_and_apply(&snapshot, self.sample_rate, &mut self.paths);
    }

    /// Filter one planar stereo block in place
    ///
    /// Any block length is accepted; both channels must have the same length.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) -> Result<()> {
        if !self.is_prepared() {
            return Err(EqError::NotPrepared);
        }
        if left.len() != right.len() {
            return Err(EqError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }

        self.update_filters();
        self.run(left, right);
        Ok(())
    }

    /// Filter interleaved stereo frames (L, R, L, R, ...) in place
    pub fn process_interleaved(&mut self, frames: &mut [f32]) -> Result<()> {
        if !self.is_prepared() {
            return Err(EqError::NotPrepared);
        }
        if frames.len() % 2 != 0 {
            return Err(EqError::OddInterleavedLength { len: frames.len() });
        }

        self.update_filters();
        let [mut left, mut right] = std::mem::take(&mut self.scratch);
        for chunk in frames.chunks_mut(2 * self.block_size) {
            let n = chunk.len() / 2;
            for (i, frame) in chunk.chunks_exact(2).enumerate() {
                left[i] = frame[0];
                right[i] = frame[1];
            }
            self.run(&mut left[..n], &mut right[..n]);
            for (i, frame) in chunk.chunks_exact_mut(2).enumerate() {
                frame[0] = left[i];
                frame[1] = right[i];
            }
        }
        self.scratch = [left, right];
        Ok(())
    }

    fn run(&mut self, left: &mut [f32], right: &mut [f32]) {
        let [left_path, right_path] = &mut self.paths;
        left_path.process(left);
        right_path.process(right);

        if let Some([left_tap, right_tap]) = &mut self.taps {
            left_tap.update(left);
            right_tap.update(right);
        }
    }

    /// Enable or bypass a role on both channels
    pub fn set_role_enabled(&mut self, role: StageRole, enabled: bool) {
        for path in &mut self.paths {
            path.set_role_enabled(role, enabled);
        }
    }

    pub fn path(&self, channel: usize) -> Option<&MonoPath> {
        self.paths.get(channel)
    }

    /// Coefficients applied by the most recent update
    pub fn coefficients(&self) -> Option<&ChainCoefficients> {
        self.controller.last_applied()
    }

    /// Analyzer blocks dropped per channel because the observer fell behind
    pub fn dropped_blocks(&self) -> [u64; 2] {
        match &self.taps {
            Some([left, right]) => [left.dropped_blocks(), right.dropped_blocks()],
            None => [0, 0],
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
