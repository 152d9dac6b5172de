//! Filter chain DSP
//!
//! Coefficient design, the biquad stage, the four-stage cut cascade and the
//! per-channel Low Cut -> Peak -> High Cut path.

pub mod coefficients;
mod cascade;
mod mono_path;
mod stage;

use num_traits::Float;

pub use cascade::CascadeChain;
pub use coefficients::{
    design_high_cut, design_low_cut, design_peak, CoefficientSet, CutCoefficients,
};
pub use mono_path::{MonoPath, StageRole};
pub use stage::FilterStage;

/// Number of biquads in a cut cascade (48 dB/oct at most)
pub const MAX_CASCADE_STAGES: usize = 4;

/// Convert decibels to linear gain
#[inline]
pub fn decibels_to_gain<T: Float>(db: T) -> T {
    let ten = T::from(10.0).unwrap_or_else(T::one);
    let twenty = T::from(20.0).unwrap_or_else(T::one);
    ten.powf(db / twenty)
}

/// Convert linear gain to decibels, never going below `floor_db`
#[inline]
pub fn gain_to_decibels<T: Float>(gain: T, floor_db: T) -> T {
    if gain <= T::zero() {
        return floor_db;
    }
    let twenty = T::from(20.0).unwrap_or_else(T::one);
    (twenty * gain.log10()).max(floor_db)
}
