//! CLI Module
//!
//! Command-line front end: render WAV files through the equalizer and inspect
//! its response, impulse behaviour and output spectrum.

pub mod commands;

use crate::dsp::StageRole;
use crate::error::Result;
use crate::params::{ParameterId, ParameterSnapshot};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

/// Simple EQ - low cut, peak and high cut equalizer
#[derive(Parser, Debug)]
#[command(name = "simple-eq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a WAV file through the equalizer
    #[command(name = "render")]
    Render {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (32-bit float)
        output: PathBuf,

        #[command(flatten)]
        eq: EqArgs,
    },

    /// Print the magnitude response in dB
    #[command(name = "response")]
    Response {
        /// Number of log-spaced points to print
        #[arg(long, default_value_t = 32)]
        points: usize,

        #[command(flatten)]
        eq: EqArgs,
    },

    /// Feed a unit impulse through one channel and report the decay
    #[command(name = "impulse")]
    Impulse {
        /// Number of blocks to run
        #[arg(long, default_value_t = 10)]
        blocks: usize,

        #[command(flatten)]
        eq: EqArgs,
    },

    /// Show the strongest spectrum bins of the processed signal
    #[command(name = "spectrum")]
    Spectrum {
        /// Input WAV file
        input: PathBuf,

        /// Number of bins to print
        #[arg(long, default_value_t = 8)]
        peaks: usize,

        #[command(flatten)]
        eq: EqArgs,
    },
}

/// Chain role that can be bypassed from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    LowCut,
    Peak,
    HighCut,
}

impl From<RoleArg> for StageRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::LowCut => StageRole::LowCut,
            RoleArg::Peak => StageRole::Peak,
            RoleArg::HighCut => StageRole::HighCut,
        }
    }
}

/// Equalizer settings shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct EqArgs {
    /// Low-cut corner frequency in Hz
    #[arg(long)]
    pub low_cut: Option<f32>,

    /// Low-cut slope in dB/oct (12, 24, 36, 48)
    #[arg(long)]
    pub low_cut_slope: Option<u32>,

    /// Peak centre frequency in Hz
    #[arg(long)]
    pub peak_freq: Option<f32>,

    /// Peak gain in dB
    #[arg(long, allow_hyphen_values = true)]
    pub peak_gain: Option<f32>,

    /// Peak quality (Q)
    #[arg(long)]
    pub peak_q: Option<f32>,

    /// High-cut corner frequency in Hz
    #[arg(long)]
    pub high_cut: Option<f32>,

    /// High-cut slope in dB/oct (12, 24, 36, 48)
    #[arg(long)]
    pub high_cut_slope: Option<u32>,

    /// Load parameters from a saved state file
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Save the resulting parameters to a state file
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// Bypass a chain role (repeatable)
    #[arg(long, value_enum)]
    pub bypass: Vec<RoleArg>,
}

impl EqArgs {
    /// Build the snapshot: `base`, then the state file, then the flags
    pub fn resolve(&self, base: ParameterSnapshot) -> Result<ParameterSnapshot> {
        let mut snapshot = match &self.state {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                let json: serde_json::Value = serde_json::from_str(&content)?;
                ParameterSnapshot::from_json(&json)?
            }
            None => base,
        };

        let overrides = [
            (ParameterId::LowCutFreq, self.low_cut),
            (ParameterId::PeakFreq, self.peak_freq),
            (ParameterId::PeakGain, self.peak_gain),
            (ParameterId::PeakQuality, self.peak_q),
            (ParameterId::HighCutFreq, self.high_cut),
        ];
        for (id, value) in overrides {
            if let Some(value) = value {
                snapshot = snapshot.with_value(id, value);
            }
        }
        if let Some(db) = self.low_cut_slope {
            snapshot.low_cut_slope = db.try_into()?;
        }
        if let Some(db) = self.high_cut_slope {
            snapshot.high_cut_slope = db.try_into()?;
        }

        if let Some(path) = &self.save_state {
            let json = serde_json::to_string_pretty(&snapshot.to_json()?)?;
            fs::write(path, json)?;
            log::info!("Saved state to {}", path.display());
        }
        Ok(snapshot)
    }

    pub fn bypassed_roles(&self) -> impl Iterator<Item = StageRole> + '_ {
        self.bypass.iter().map(|&role| role.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Slope;
    use tempfile::tempdir;

    #[test]
    fn test_parse_render_with_flags() {
        let cli = Cli::parse_from([
            "simple-eq",
            "render",
            "in.wav",
            "out.wav",
            "--low-cut",
            "100",
            "--low-cut-slope",
            "24",
            "--peak-gain",
            "-6",
            "--bypass",
            "high-cut",
        ]);
        match cli.command {
            Some(Commands::Render { eq, .. }) => {
                assert_eq!(eq.low_cut, Some(100.0));
                assert_eq!(eq.peak_gain, Some(-6.0));
                assert_eq!(eq.bypass, vec![RoleArg::HighCut]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_resolve_applies_flags_over_base() {
        let args = EqArgs {
            low_cut: Some(100.0),
            low_cut_slope: Some(24),
            peak_q: Some(50.0),
            ..Default::default()
        };
        let snapshot = args.resolve(ParameterSnapshot::default()).unwrap();
        assert_eq!(snapshot.low_cut_freq, 100.0);
        assert_eq!(snapshot.low_cut_slope, Slope::Db24);
        assert_eq!(snapshot.peak_quality, 10.0);
    }

    #[test]
    fn test_resolve_rejects_unknown_slope() {
        let args = EqArgs {
            high_cut_slope: Some(18),
            ..Default::default()
        };
        assert!(args.resolve(ParameterSnapshot::default()).is_err());
    }

    #[test]
    fn test_state_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let save = EqArgs {
            peak_freq: Some(2500.0),
            save_state: Some(path.clone()),
            ..Default::default()
        };
        save.resolve(ParameterSnapshot::default()).unwrap();

        let load = EqArgs {
            state: Some(path),
            ..Default::default()
        };
        let snapshot = load.resolve(ParameterSnapshot::default()).unwrap();
        assert_eq!(snapshot.peak_freq, 2500.0);
    }
}
