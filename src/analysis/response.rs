//! Frequency response curve
//!
//! The observer keeps its own [`MonoPath`] and feeds it the same coefficients
//! the audio thread uses, then samples the magnitude along a log-frequency
//! axis between 20 Hz and 20 kHz.

use crate::dsp::{gain_to_decibels, MonoPath, StageRole};
use crate::engine::ChainController;
use crate::error::{EqError, Result};
use crate::params::ParameterSnapshot;

pub const MIN_FREQUENCY: f64 = 20.0;
pub const MAX_FREQUENCY: f64 = 20000.0;

/// Map a 0..1 proportion onto a logarithmic range
pub fn map_to_log10(proportion: f64, min: f64, max: f64) -> f64 {
    let log_min = min.log10();
    let log_max = max.log10();
    10f64.powf(log_min + proportion * (log_max - log_min))
}

/// Inverse of [`map_to_log10`]
pub fn map_from_log10(value: f64, min: f64, max: f64) -> f64 {
    let log_min = min.log10();
    let log_max = max.log10();
    (value.log10() - log_min) / (log_max - log_min)
}

#[derive(Debug, Clone)]
pub struct ResponseCurve {
    path: MonoPath,
    sample_rate: f64,
    min_db: f64,
    frequencies: Vec<f64>,
    magnitudes_db: Vec<f64>,
    applied: Option<ParameterSnapshot>,
}

impl ResponseCurve {
    pub fn new(points: usize, sample_rate: f64, min_db: f64) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EqError::InvalidSampleRate { sample_rate });
        }
        if points < 2 {
            return Err(EqError::invalid_parameter(
                "response points",
                points,
                "at least 2",
            ));
        }

        let last = (points - 1) as f64;
        let frequencies = (0..points)
            .map(|i| map_to_log10(i as f64 / last, MIN_FREQUENCY, MAX_FREQUENCY))
            .collect();

        let mut path = MonoPath::new();
        path.prepare(sample_rate, 0);

        Ok(Self {
            path,
            sample_rate,
            min_db,
            frequencies,
            magnitudes_db: vec![0.0; points],
            applied: None,
        })
    }

    /// Recompute the curve if `snapshot` differs from the last one applied
    ///
    /// Returns whether the curve changed.
    pub fn update(&mut self, snapshot: &ParameterSnapshot) -> Result<bool> {
        if self.applied.as_ref() == Some(snapshot) {
            return Ok(false);
        }

        let coefficients = ChainController::design(snapshot, self.sample_rate)?;
        coefficients.apply_to(&mut self.path);
        self.applied = Some(*snapshot);
        self.recompute();
        Ok(true)
    }

    /// Mirror a role bypass of the processor
    pub fn set_role_enabled(&mut self, role: StageRole, enabled: bool) {
        if self.path.is_role_enabled(role) != enabled {
            self.path.set_role_enabled(role, enabled);
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        for (db, &freq) in self.magnitudes_db.iter_mut().zip(&self.frequencies) {
            let magnitude = self.path.magnitude_at(freq, self.sample_rate);
            *db = gain_to_decibels(magnitude, self.min_db);
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Magnitudes in dB, floored at the configured minimum
    pub fn magnitudes_db(&self) -> &[f64] {
        &self.magnitudes_db
    }

    /// Exact response at any frequency, independent of the sampled points
    pub fn magnitude_db_at(&self, frequency: f64) -> f64 {
        gain_to_decibels(self.path.magnitude_at(frequency, self.sample_rate), self.min_db)
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes_db.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Slope;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_mapping() {
        assert_relative_eq!(map_to_log10(0.0, 20.0, 20000.0), 20.0, epsilon = 1e-9);
        assert_relative_eq!(map_to_log10(1.0, 20.0, 20000.0), 20000.0, epsilon = 1e-6);
        // Three decades: the midpoint sits at 20 * 10^1.5
        assert_relative_eq!(map_to_log10(0.5, 20.0, 20000.0), 632.455, epsilon = 1e-3);
        assert_relative_eq!(map_from_log10(2000.0, 20.0, 20000.0), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_spans_audible_range() {
        let curve = ResponseCurve::new(64, 48000.0, -48.0).unwrap();
        assert_eq!(curve.len(), 64);
        assert_relative_eq!(curve.frequencies()[0], MIN_FREQUENCY, epsilon = 1e-9);
        assert_relative_eq!(curve.frequencies()[63], MAX_FREQUENCY, epsilon = 1e-6);
        assert!(curve.frequencies().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_peak_centre_reads_gain() {
        let mut curve = ResponseCurve::new(256, 48000.0, -48.0).unwrap();
        let snapshot = ParameterSnapshot {
            peak_freq: 1000.0,
            peak_gain_db: 6.0,
            peak_quality: 1.0,
            ..Default::default()
        };
        assert!(curve.update(&snapshot).unwrap());
        assert_relative_eq!(curve.magnitude_db_at(1000.0), 6.0, epsilon = 1e-2);
    }

    #[test]
    fn test_update_skips_unchanged_snapshot() {
        let mut curve = ResponseCurve::new(32, 48000.0, -48.0).unwrap();
        let snapshot = ParameterSnapshot::default();
        assert!(curve.update(&snapshot).unwrap());
        assert!(!curve.update(&snapshot).unwrap());
        assert!(curve.update(&snapshot.with_value(crate::params::ParameterId::PeakGain, 3.0)).unwrap());
    }

    #[test]
    fn test_values_floored_at_min_db() {
        let mut curve = ResponseCurve::new(128, 48000.0, -48.0).unwrap();
        let snapshot = ParameterSnapshot {
            high_cut_freq: 200.0,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        curve.update(&snapshot).unwrap();
        assert!(curve.magnitudes_db().iter().all(|&db| db >= -48.0));
        assert_eq!(*curve.magnitudes_db().last().unwrap(), -48.0);
    }

    #[test]
    fn test_bypassing_peak_flattens_curve() {
        let mut curve = ResponseCurve::new(128, 48000.0, -48.0).unwrap();
        let snapshot = ParameterSnapshot {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..Default::default()
        };
        curve.update(&snapshot).unwrap();
        curve.set_role_enabled(StageRole::Peak, false);
        assert!(curve.magnitude_db_at(1000.0).abs() < 0.1);
    }
}
