//! Cut filter cascade
//!
//! Each biquad gives a 12 dB/oct roll-off; a 48 dB/oct slope needs four of
//! them in series. All four stages always exist so changing the slope never
//! allocates, stages past the active count are simply bypassed.

use super::{CutCoefficients, FilterStage, MAX_CASCADE_STAGES};

/// Four biquads in series with a slope-derived active count
#[derive(Debug, Clone)]
pub struct CascadeChain {
    stages: [FilterStage; MAX_CASCADE_STAGES],
    active: usize,
}

impl Default for CascadeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeChain {
    /// One active identity stage, the rest bypassed
    pub fn new() -> Self {
        let mut chain = Self {
            stages: Default::default(),
            active: 1,
        };
        chain.apply_active();
        chain
    }

    /// Install coefficients for every stage and enable the first `active`
    ///
    /// `active` is clamped to 1..=4.
    pub fn configure(&mut self, coefficients: &CutCoefficients, active: usize) {
        for (stage, coeffs) in self.stages.iter_mut().zip(coefficients.iter()) {
            stage.set_coefficients(*coeffs);
        }
        self.active = active.clamp(1, MAX_CASCADE_STAGES);
        self.apply_active();
    }

    fn apply_active(&mut self) {
        for (i, stage) in self.stages.iter_mut().enumerate() {
            stage.set_bypassed(i >= self.active);
        }
    }

    /// Run one sample through all stages, lowest index first
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(sample, |acc, stage| stage.process(acc))
    }

    /// Product of the active stages' magnitudes at `frequency`
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        self.stages
            .iter()
            .map(|stage| stage.magnitude_at(frequency, sample_rate))
            .product()
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn stage(&self, index: usize) -> Option<&FilterStage> {
        self.stages.get(index)
    }

    /// Bypass every stage, turning the cascade into a wire
    ///
    /// The next `configure` re-enables stages according to its active count.
    pub fn bypass_all(&mut self) {
        for stage in &mut self.stages {
            stage.set_bypassed(true);
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
