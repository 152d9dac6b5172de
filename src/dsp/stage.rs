//! Single biquad filter stage
//!
//! Runs on the audio thread: `process` is O(1), never allocates and never
//! touches shared state.

use super::CoefficientSet;

/// Registers below this magnitude are flushed to zero
const DENORMAL_THRESHOLD: f64 = 1e-30;

#[inline]
fn flush_denormal(x: f64) -> f64 {
    if x.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        x
    }
}

/// Biquad delay registers (transposed direct form II)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    s1: f64,
    s2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, input: f64, c: &CoefficientSet) -> f64 {
        let output = c.b0 * input + self.s1;
        self.s1 = flush_denormal(c.b1 * input - c.a1 * output + self.s2);
        self.s2 = flush_denormal(c.b2 * input - c.a2 * output);
        output
    }

    fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

/// One second-order section with its own history and a bypass flag
///
/// While bypassed the history is frozen: it is neither updated nor cleared,
/// so re-enabling resumes from the state the stage had when it was bypassed.
#[derive(Debug, Clone, Default)]
pub struct FilterStage {
    coeffs: CoefficientSet,
    state: BiquadState,
    bypassed: bool,
}

impl FilterStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the difference equation to one sample
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        if self.bypassed {
            return sample;
        }
        self.state.process(sample as f64, &self.coeffs) as f32
    }

    /// Replace the held coefficients; filter history is kept
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: CoefficientSet) {
        self.coeffs = coeffs;
    }

    pub fn coefficients(&self) -> &CoefficientSet {
        &self.coeffs
    }

    #[inline]
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Clear the filter history (stream restart only)
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Linear magnitude response; a bypassed stage is flat
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            1.0
        } else {
            self.coeffs.magnitude_at(frequency, sample_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::coefficients::{butterworth_high_pass, butterworth_low_pass, peak};
    use approx::assert_relative_eq;

    #[test]
    fn test_default_stage_is_identity() {
        let mut stage = FilterStage::new();
        for x in [0.0, 0.5, -1.0, 0.25] {
            assert_eq!(stage.process(x), x);
        }
    }

    #[test]
    fn test_impulse_response_matches_coefficients() {
        let coeffs = butterworth_low_pass(1000.0, 48000.0, 2).unwrap()[0];
        let mut stage = FilterStage::new();
        stage.set_coefficients(coeffs);

        let y0 = stage.process(1.0) as f64;
        let y1 = stage.process(0.0) as f64;
        let y2 = stage.process(0.0) as f64;

        assert_relative_eq!(y0, coeffs.b0, epsilon = 1e-6);
        assert_relative_eq!(y1, coeffs.b1 - coeffs.a1 * coeffs.b0, epsilon = 1e-6);
        assert_relative_eq!(
            y2,
            coeffs.b2 - coeffs.a1 * (coeffs.b1 - coeffs.a1 * coeffs.b0) - coeffs.a2 * coeffs.b0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_bypass_passes_input_and_freezes_state() {
        let coeffs = butterworth_low_pass(500.0, 48000.0, 2).unwrap()[0];
        let mut reference = FilterStage::new();
        reference.set_coefficients(coeffs);
        let mut stage = reference.clone();

        for _ in 0..16 {
            reference.process(1.0);
            stage.process(1.0);
        }

        stage.set_bypassed(true);
        for x in [0.3, -0.9, 0.7] {
            assert_eq!(stage.process(x), x);
        }
        stage.set_bypassed(false);

        // Same history as a stage that never saw the bypassed samples
        for _ in 0..8 {
            assert_eq!(stage.process(0.5), reference.process(0.5));
        }
    }

    #[test]
    fn test_coefficient_swap_keeps_history() {
        let mut stage = FilterStage::new();
        stage.set_coefficients(butterworth_low_pass(500.0, 48000.0, 2).unwrap()[0]);
        for _ in 0..256 {
            stage.process(1.0);
        }

        let mut fresh = FilterStage::new();
        let next = butterworth_low_pass(600.0, 48000.0, 2).unwrap()[0];
        stage.set_coefficients(next);
        fresh.set_coefficients(next);

        // A zeroed history would restart the step response from b0
        assert!((stage.process(1.0) - fresh.process(1.0)).abs() > 0.1);
    }

    #[test]
    fn test_reset_clears_history() {
        let coeffs = butterworth_low_pass(500.0, 48000.0, 2).unwrap()[0];
        let mut stage = FilterStage::new();
        stage.set_coefficients(coeffs);
        for _ in 0..32 {
            stage.process(1.0);
        }
        stage.reset();

        let mut fresh = FilterStage::new();
        fresh.set_coefficients(coeffs);
        assert_eq!(stage.process(1.0), fresh.process(1.0));
    }

    #[test]
    fn test_silence_after_impulse_settles_to_exact_zero() {
        // Low corner: the tail decays slowly enough to pass through the
        // subnormal range if nothing flushes it
        let mut stage = FilterStage::new();
        stage.set_coefficients(butterworth_high_pass(20.0, 48000.0, 2).unwrap()[0]);
        stage.process(1.0);
        for _ in 0..100_000 {
            stage.process(0.0);
        }

        assert_eq!(stage.state.s1, 0.0);
        assert_eq!(stage.state.s2, 0.0);
        assert_eq!(stage.process(0.0), 0.0);
    }

    #[test]
    fn test_bypassed_magnitude_is_flat() {
        let mut stage = FilterStage::new();
        stage.set_coefficients(peak(1000.0, 1.0, 4.0, 48000.0).unwrap());
        assert_relative_eq!(stage.magnitude_at(1000.0, 48000.0), 4.0, epsilon = 1e-3);
        stage.set_bypassed(true);
        assert_eq!(stage.magnitude_at(1000.0, 48000.0), 1.0);
    }
}
