//! Parameter snapshot
//!
//! The seven user-facing values of the equalizer, captured as one immutable
//! value per control-rate tick.

use super::{ParameterId, ParameterRange};
use crate::error::{EqError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cut filter steepness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Attenuation in dB per octave
    pub fn db_per_octave(self) -> u32 {
        12 * self.active_stages() as u32
    }

    /// Number of biquads needed: 1..=4
    pub fn active_stages(self) -> usize {
        match self {
            Slope::Db12 => 1,
            Slope::Db24 => 2,
            Slope::Db36 => 3,
            Slope::Db48 => 4,
        }
    }

    /// Butterworth order realized by the cascade
    pub fn order(self) -> usize {
        2 * self.active_stages()
    }

    /// Position in the slope choice list
    pub fn index(self) -> usize {
        self.active_stages() - 1
    }

    /// Slope from a choice index (0 = 12 dB/oct ... 3 = 48 dB/oct)
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| EqError::invalid_parameter("slope", index, "choice index 0-3"))
    }

    /// Slope from its dB/oct value
    pub fn from_db_per_octave(db: u32) -> Result<Self> {
        match db {
            12 => Ok(Slope::Db12),
            24 => Ok(Slope::Db24),
            36 => Ok(Slope::Db36),
            48 => Ok(Slope::Db48),
            other => Err(EqError::invalid_parameter("slope", other, "12, 24, 36 or 48 dB/oct")),
        }
    }

    /// Choice label as shown to the user
    pub fn label(self) -> String {
        format!("{} db/Oct", self.db_per_octave())
    }
}

impl TryFrom<u32> for Slope {
    type Error = EqError;

    fn try_from(db: u32) -> Result<Self> {
        Self::from_db_per_octave(db)
    }
}

impl From<Slope> for u32 {
    fn from(slope: Slope) -> u32 {
        slope.db_per_octave()
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} dB/oct", self.db_per_octave())
    }
}

/// All equalizer parameters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    /// Low-cut corner in Hz (20-20000)
    pub low_cut_freq: f32,
    /// High-cut corner in Hz (20-20000)
    pub high_cut_freq: f32,
    /// Peak centre in Hz (20-20000)
    pub peak_freq: f32,
    /// Peak gain in dB (-24 to +24)
    pub peak_gain_db: f32,
    /// Peak Q (0.1 to 10.0)
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            low_cut_freq: ParameterId::LowCutFreq.range().default,
            high_cut_freq: ParameterId::HighCutFreq.range().default,
            peak_freq: ParameterId::PeakFreq.range().default,
            peak_gain_db: ParameterId::PeakGain.range().default,
            peak_quality: ParameterId::PeakQuality.range().default,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

impl ParameterSnapshot {
    /// Copy with every continuous value clamped into its range
    ///
    /// Non-finite values fall back to the parameter default.
    pub fn clamped(&self) -> Self {
        let clamp = |id: ParameterId, value: f32| {
            let range: ParameterRange = id.range();
            if value.is_finite() {
                range.clamp(value)
            } else {
                range.default
            }
        };

        Self {
            low_cut_freq: clamp(ParameterId::LowCutFreq, self.low_cut_freq),
            high_cut_freq: clamp(ParameterId::HighCutFreq, self.high_cut_freq),
            peak_freq: clamp(ParameterId::PeakFreq, self.peak_freq),
            peak_gain_db: clamp(ParameterId::PeakGain, self.peak_gain_db),
            peak_quality: clamp(ParameterId::PeakQuality, self.peak_quality),
            ..*self
        }
    }

    /// Read one parameter as a plain number (slopes as choice index)
    pub fn value(&self, id: ParameterId) -> f32 {
        match id {
            ParameterId::LowCutFreq => self.low_cut_freq,
            ParameterId::HighCutFreq => self.high_cut_freq,
            ParameterId::PeakFreq => self.peak_freq,
            ParameterId::PeakGain => self.peak_gain_db,
            ParameterId::PeakQuality => self.peak_quality,
            ParameterId::LowCutSlope => self.low_cut_slope.index() as f32,
            ParameterId::HighCutSlope => self.high_cut_slope.index() as f32,
        }
    }

    /// New snapshot with one parameter replaced, snapped to its range and step
    pub fn with_value(&self, id: ParameterId, value: f32) -> Self {
        let value = if value.is_finite() {
            id.range().snap(value)
        } else {
            id.range().default
        };
        let slope = || Slope::ALL[(value.round() as usize).min(Slope::ALL.len() - 1)];

        let mut next = *self;
        match id {
            ParameterId::LowCutFreq => next.low_cut_freq = value,
            ParameterId::HighCutFreq => next.high_cut_freq = value,
            ParameterId::PeakFreq => next.peak_freq = value,
            ParameterId::PeakGain => next.peak_gain_db = value,
            ParameterId::PeakQuality => next.peak_quality = value,
            ParameterId::LowCutSlope => next.low_cut_slope = slope(),
            ParameterId::HighCutSlope => next.high_cut_slope = slope(),
        }
        next
    }

    /// Serialize for state persistence
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Restore from persisted state; out-of-range values are clamped
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let snapshot: ParameterSnapshot = serde_json::from_value(json.clone())?;
        Ok(snapshot.clamped())
    }
}
