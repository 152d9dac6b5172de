//! Observer
//!
//! Runs on the control side at the analyzer refresh rate. Each refresh drains
//! a bounded number of blocks from both channel FIFOs into the spectrum
//! analyzers and recomputes the response curve when the parameters changed.

use super::response::ResponseCurve;
use super::spectrum::SpectrumAnalyzer;
use crate::config::AnalyzerConfig;
use crate::engine::{AnalyzerTaps, BlockConsumer, LEFT, RIGHT};
use crate::error::Result;
use crate::params::ParameterSnapshot;
use std::time::Duration;

/// What one refresh did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Blocks pulled per channel
    pub blocks_pulled: [usize; 2],
    /// Whether the response curve was recomputed
    pub response_updated: bool,
}

pub struct Observer {
    consumers: [BlockConsumer; 2],
    spectra: [SpectrumAnalyzer; 2],
    response: ResponseCurve,
    block: Vec<f32>,
    max_blocks_per_refresh: usize,
    refresh_interval: Duration,
}

impl Observer {
    pub fn new(taps: AnalyzerTaps, sample_rate: f64, config: &AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let block_size = taps.left.block_size();
        let fft_size = config.fft_size();
        let min_db = config.min_db as f32;

        Ok(Self {
            consumers: [taps.left, taps.right],
            spectra: [
                SpectrumAnalyzer::new(fft_size, sample_rate, min_db)?,
                SpectrumAnalyzer::new(fft_size, sample_rate, min_db)?,
            ],
            response: ResponseCurve::new(config.response_points, sample_rate, config.min_db)?,
            block: vec![0.0; block_size],
            max_blocks_per_refresh: config.max_blocks_per_refresh,
            refresh_interval: config.refresh_interval(),
        })
    }

    /// Drain the FIFOs and bring both read surfaces up to date
    pub fn refresh(&mut self, snapshot: &ParameterSnapshot) -> Result<RefreshStats> {
        let mut stats = RefreshStats::default();

        for channel in [LEFT, RIGHT] {
            let consumer = &mut self.consumers[channel];
            let spectrum = &mut self.spectra[channel];
            let mut pulled = 0;
            while pulled < self.max_blocks_per_refresh && consumer.pull(&mut self.block) {
                spectrum.push_samples(&self.block);
                pulled += 1;
            }
            if pulled > 0 {
                spectrum.compute();
            }
            stats.blocks_pulled[channel] = pulled;
        }

        stats.response_updated = self.response.update(snapshot)?;
        if stats.response_updated {
            log::debug!("Response curve recomputed for {:?}", snapshot);
        }
        Ok(stats)
    }

    pub fn response(&self) -> &ResponseCurve {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseCurve {
        &mut self.response
    }

    /// Response curve magnitudes in dB
    pub fn response_db(&self) -> &[f64] {
        self.response.magnitudes_db()
    }

    pub fn spectrum(&self, channel: usize) -> Option<&SpectrumAnalyzer> {
        self.spectra.get(channel)
    }

    /// Blocks still queued per channel
    pub fn pending_blocks(&self) -> [usize; 2] {
        [
            self.consumers[LEFT].available_for_reading(),
            self.consumers[RIGHT].available_for_reading(),
        ]
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
