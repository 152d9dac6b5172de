//! Coefficient factory
//!
//! Pure functions turning a [`ParameterSnapshot`] and a sample rate into
//! second-order-section coefficients. The cut bands use a Butterworth
//! design split into cascaded biquads; the peak band uses the Audio EQ
//! Cookbook peaking filter.
//! Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html

use super::MAX_CASCADE_STAGES;
use crate::error::{EqError, Result};
use crate::params::ParameterSnapshot;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Highest Butterworth order a four-stage cascade can realize
pub const MAX_BUTTERWORTH_ORDER: usize = 2 * MAX_CASCADE_STAGES;

/// Biquad filter coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
/// Normalized: all coefficients divided by a0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// Coefficients for every stage of a cut cascade, active or not
pub type CutCoefficients = [CoefficientSet; MAX_CASCADE_STAGES];

impl CoefficientSet {
    /// Unity gain, no filtering
    pub const IDENTITY: CoefficientSet = CoefficientSet {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        CoefficientSet {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Check if coefficients represent a bypass (unity gain, no filtering)
    pub fn is_identity(&self) -> bool {
        (self.b0 - 1.0).abs() < 1e-12
            && self.b1.abs() < 1e-12
            && self.b2.abs() < 1e-12
            && self.a1.abs() < 1e-12
            && self.a2.abs() < 1e-12
    }

    /// Linear magnitude of H(e^jw) at `frequency`
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let z1 = Complex64::from_polar(1.0, -w);
        let z2 = z1 * z1;

        let numerator = self.b0 + z1 * self.b1 + z2 * self.b2;
        let denominator = 1.0 + z1 * self.a1 + z2 * self.a2;

        (numerator / denominator).norm()
    }

    /// Both poles strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        // Jury criterion for a monic second-order denominator
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn check_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(EqError::InvalidSampleRate { sample_rate })
    }
}

fn check_frequency(frequency: f64, sample_rate: f64) -> Result<()> {
    check_sample_rate(sample_rate)?;
    if frequency.is_finite() && frequency > 0.0 && frequency < sample_rate / 2.0 {
        Ok(())
    } else {
        Err(EqError::InvalidFrequency {
            frequency,
            sample_rate,
        })
    }
}

fn check_order(order: usize) -> Result<()> {
    if (2..=MAX_BUTTERWORTH_ORDER).contains(&order) && order % 2 == 0 {
        Ok(())
    } else {
        Err(EqError::invalid_parameter(
            "order",
            order,
            format!("an even order between 2 and {}", MAX_BUTTERWORTH_ORDER),
        ))
    }
}

/// Peaking EQ biquad (constant-Q bell)
///
/// `gain` is linear; at `frequency` the magnitude response equals `gain`.
pub fn peak(frequency: f64, q: f64, gain: f64, sample_rate: f64) -> Result<CoefficientSet> {
    check_frequency(frequency, sample_rate)?;
    if !(q.is_finite() && q > 0.0) {
        return Err(EqError::invalid_parameter("q", q, "a positive quality factor"));
    }
    if !(gain.is_finite() && gain > 0.0) {
        return Err(EqError::invalid_parameter("gain", gain, "a positive linear gain"));
    }

    let w0 = 2.0 * PI * frequency / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);
    let a = gain.sqrt();

    Ok(CoefficientSet::normalized(
        1.0 + alpha * a,
        -2.0 * cos_w0,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w0,
        1.0 - alpha / a,
    ))
}

fn high_pass_section(frequency: f64, q: f64, sample_rate: f64) -> CoefficientSet {
    let w0 = 2.0 * PI * frequency / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);

    CoefficientSet::normalized(
        (1.0 + cos_w0) / 2.0,
        -(1.0 + cos_w0),
        (1.0 + cos_w0) / 2.0,
        1.0 + alpha,
        -2.0 * cos_w0,
        1.0 - alpha,
    )
}

fn low_pass_section(frequency: f64, q: f64, sample_rate: f64) -> CoefficientSet {
    let w0 = 2.0 * PI * frequency / sample_rate;
    let cos_w0 = w0.cos();
    let alpha = w0.sin() / (2.0 * q);

    CoefficientSet::normalized(
        (1.0 - cos_w0) / 2.0,
        1.0 - cos_w0,
        (1.0 - cos_w0) / 2.0,
        1.0 + alpha,
        -2.0 * cos_w0,
        1.0 - alpha,
    )
}

/// Q of section `section` in an even-order Butterworth cascade
///
/// The pole pairs of an order-N Butterworth prototype sit at angles
/// (2k+1)π/2N, which gives Q_k = 1 / (2 cos((2k+1)π / 2N)).
pub fn butterworth_q(order: usize, section: usize) -> f64 {
    let n = order as f64;
    let k = section as f64;
    1.0 / (2.0 * ((2.0 * k + 1.0) * PI / (2.0 * n)).cos())
}

fn butterworth_cascade(
    frequency: f64,
    sample_rate: f64,
    order: usize,
    section: fn(f64, f64, f64) -> CoefficientSet,
) -> Result<CutCoefficients> {
    check_frequency(frequency, sample_rate)?;
    check_order(order)?;

    let mut sections = [CoefficientSet::IDENTITY; MAX_CASCADE_STAGES];
    for (k, slot) in sections.iter_mut().take(order / 2).enumerate() {
        *slot = section(frequency, butterworth_q(order, k), sample_rate);
    }
    Ok(sections)
}

/// Butterworth highpass of `order` split into biquads
///
/// Only the first `order / 2` entries filter; the rest are identity so the
/// cascade always has a full set of well-defined stages.
pub fn butterworth_high_pass(
    frequency: f64,
    sample_rate: f64,
    order: usize,
) -> Result<CutCoefficients> {
    butterworth_cascade(frequency, sample_rate, order, high_pass_section)
}

/// Butterworth lowpass of `order` split into biquads
pub fn butterworth_low_pass(
    frequency: f64,
    sample_rate: f64,
    order: usize,
) -> Result<CutCoefficients> {
    butterworth_cascade(frequency, sample_rate, order, low_pass_section)
}

/// Peak band coefficients for a snapshot
pub fn design_peak(snapshot: &ParameterSnapshot, sample_rate: f64) -> Result<CoefficientSet> {
    peak(
        snapshot.peak_freq as f64,
        snapshot.peak_quality as f64,
        super::decibels_to_gain(snapshot.peak_gain_db as f64),
        sample_rate,
    )
}

/// Low-cut cascade coefficients for a snapshot
pub fn design_low_cut(snapshot: &ParameterSnapshot, sample_rate: f64) -> Result<CutCoefficients> {
    butterworth_high_pass(
        snapshot.low_cut_freq as f64,
        sample_rate,
        snapshot.low_cut_slope.order(),
    )
}

/// High-cut cascade coefficients for a snapshot
pub fn design_high_cut(snapshot: &ParameterSnapshot, sample_rate: f64) -> Result<CutCoefficients> {
    butterworth_low_pass(
        snapshot.high_cut_freq as f64,
        sample_rate,
        snapshot.high_cut_slope.order(),
    )
}
