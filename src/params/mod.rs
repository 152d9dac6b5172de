//! Equalizer parameters
//!
//! Parameter identifiers and ranges, the immutable [`ParameterSnapshot`]
//! and the wait-free channel that hands snapshots to the audio thread.

mod shared;
mod snapshot;

pub use shared::{parameter_channel, ParameterFeed, ParameterStore};
pub use snapshot::{ParameterSnapshot, Slope};

use std::fmt;

/// Continuous range of a parameter with step and skew
///
/// Skew below 1 spends more of the normalised range on low values, which
/// suits frequencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub skew: f32,
    pub default: f32,
}

impl ParameterRange {
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Clamp and quantize to the step grid
    ///
    /// The grid is anchored at zero; every range keeps `min` on it, and whole
    /// multiples of the step come back without rounding drift.
    pub fn snap(&self, value: f32) -> f32 {
        let value = self.clamp(value);
        if self.step <= 0.0 {
            return value;
        }
        self.clamp((value / self.step).round() * self.step)
    }

    /// Map a value to 0..1 along the skewed range
    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Map 0..1 back to a value along the skewed range
    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let mut proportion = normalized.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.min + (self.max - self.min) * proportion
    }
}

const FREQUENCY_SKEW: f32 = 0.25;

/// Identifies one of the seven equalizer parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

impl ParameterId {
    pub const ALL: [ParameterId; 7] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
    ];

    /// Display name, also used as the persisted parameter id
    pub fn name(self) -> &'static str {
        match self {
            ParameterId::LowCutFreq => "LowCut Freq",
            ParameterId::HighCutFreq => "HighCut Freq",
            ParameterId::PeakFreq => "Peak Freq",
            ParameterId::PeakGain => "Peak Gain",
            ParameterId::PeakQuality => "Peak Quality",
            ParameterId::LowCutSlope => "LowCut Slope",
            ParameterId::HighCutSlope => "HighCut Slope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    /// Unit suffix for display
    pub fn unit(self) -> &'static str {
        match self {
            ParameterId::LowCutFreq | ParameterId::HighCutFreq | ParameterId::PeakFreq => "Hz",
            ParameterId::PeakGain => "dB",
            ParameterId::PeakQuality => "",
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => "dB/Oct",
        }
    }

    pub fn range(self) -> ParameterRange {
        let frequency = |default| ParameterRange {
            min: 20.0,
            max: 20000.0,
            step: 1.0,
            skew: FREQUENCY_SKEW,
            default,
        };
        match self {
            ParameterId::LowCutFreq => frequency(20.0),
            ParameterId::HighCutFreq => frequency(20000.0),
            ParameterId::PeakFreq => frequency(750.0),
            ParameterId::PeakGain => ParameterRange {
                min: -24.0,
                max: 24.0,
                step: 0.5,
                skew: 1.0,
                default: 0.0,
            },
            ParameterId::PeakQuality => ParameterRange {
                min: 0.1,
                max: 10.0,
                step: 0.05,
                skew: 1.0,
                default: 1.0,
            },
            // Slopes are choices stored by index
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => ParameterRange {
                min: 0.0,
                max: (Slope::ALL.len() - 1) as f32,
                step: 1.0,
                skew: 1.0,
                default: 0.0,
            },
        }
    }

    /// Human readable value, e.g. "1.50 kHz" or "24 db/Oct"
    pub fn format_value(self, value: f32) -> String {
        match self {
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                let index = (value.round().max(0.0) as usize).min(Slope::ALL.len() - 1);
                Slope::ALL[index].label()
            }
            _ => {
                let (value, kilo) = if value > 999.0 {
                    (value / 1000.0, true)
                } else {
                    (value, false)
                };
                let mut text = if kilo {
                    format!("{:.2}", value)
                } else {
                    format!("{:.0}", value)
                };
                let unit = self.unit();
                if !unit.is_empty() {
                    text.push(' ');
                    if kilo {
                        text.push('k');
                    }
                    text.push_str(unit);
                }
                text
            }
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
