//! Chain controller
//!
//! Turns a parameter snapshot into coefficients and applies the same values
//! to every mono path. Runs inside the audio callback once per block, so
//! coefficients never cross a thread boundary.

use crate::dsp::{
    design_high_cut, design_low_cut, design_peak, CoefficientSet, CutCoefficients, MonoPath,
};
use crate::error::Result;
use crate::params::ParameterSnapshot;

/// Highest corner/centre frequency as a fraction of the sample rate
///
/// Keeps every design strictly below Nyquist even when the host runs at a
/// sample rate where 20 kHz is out of reach.
pub const MAX_NORMALIZED_FREQUENCY: f64 = 0.49;

/// Every coefficient of a mono path for one control-rate tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub peak: CoefficientSet,
    pub low_cut: CutCoefficients,
    pub low_cut_active: usize,
    pub high_cut: CutCoefficients,
    pub high_cut_active: usize,
}

impl ChainCoefficients {
    /// Write every set into one path
    pub fn apply_to(&self, path: &mut MonoPath) {
        path.update_coefficients(
            &self.peak,
            &self.low_cut,
            self.low_cut_active,
            &self.high_cut,
            self.high_cut_active,
        );
    }
}

/// Clamp a snapshot so the factory cannot fail for a valid sample rate
pub fn clamp_for_sample_rate(snapshot: &ParameterSnapshot, sample_rate: f64) -> ParameterSnapshot {
    let mut clamped = snapshot.clamped();
    if sample_rate.is_finite() && sample_rate > 0.0 {
        let ceiling = (sample_rate * MAX_NORMALIZED_FREQUENCY) as f32;
        clamped.low_cut_freq = clamped.low_cut_freq.min(ceiling);
        clamped.high_cut_freq = clamped.high_cut_freq.min(ceiling);
        clamped.peak_freq = clamped.peak_freq.min(ceiling);
    }
    clamped
}

/// Computes coefficients and republishes them into the mono paths
#[derive(Debug, Clone, Default)]
pub struct ChainController {
    last_applied: Option<ChainCoefficients>,
}

impl ChainController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Design all coefficients for a snapshot without touching any path
    pub fn design(snapshot: &ParameterSnapshot, sample_rate: f64) -> Result<ChainCoefficients> {
        let snapshot = clamp_for_sample_rate(snapshot, sample_rate);
        Ok(ChainCoefficients {
            peak: design_peak(&snapshot, sample_rate)?,
            low_cut: design_low_cut(&snapshot, sample_rate)?,
            low_cut_active: snapshot.low_cut_slope.active_stages(),
            high_cut: design_high_cut(&snapshot, sample_rate)?,
            high_cut_active: snapshot.high_cut_slope.active_stages(),
        })
    }

    /// Recompute coefficients and apply them to every path
    ///
    /// Either every path receives the new coefficients or none does. A design
    /// failure keeps the previous coefficients in place and trips a debug
    /// assertion; with clamped parameters it only happens for a malformed
    /// sample rate.
    pub fn recompute_and_apply(
        &mut self,
        snapshot: &ParameterSnapshot,
        sample_rate: f64,
        paths: &mut [MonoPath],
    ) {
        match Self::design(snapshot, sample_rate) {
            Ok(coefficients) => {
                for path in paths.iter_mut() {
                    coefficients.apply_to(path);
                }
                self.last_applied = Some(coefficients);
            }
            Err(e) => {
                log::error!("Filter design failed, keeping previous coefficients: {}", e);
                debug_assert!(false, "filter design failed: {}", e);
            }
        }
    }

    /// Coefficients of the last successful update
    pub fn last_applied(&self) -> Option<&ChainCoefficients> {
        self.last_applied.as_ref()
    }
}
