//! Engine configuration
//!
//! Stream format and analyzer settings, stored as JSON. Missing fields take
//! their defaults so older files keep loading.

use crate::engine::FIFO_CAPACITY;
use crate::error::{EqError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Smallest and largest FFT order the analyzer accepts (64 to 32768 points)
pub const FFT_ORDER_RANGE: std::ops::RangeInclusive<u32> = 6..=15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stream sample rate in Hz
    pub sample_rate: f64,
    /// Host block size in samples
    pub block_size: usize,
    pub analyzer: AnalyzerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            block_size: 512,
            analyzer: AnalyzerConfig::default(),
        }
    }
}

/// Observer-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// FFT size as a power of two
    pub fft_order: u32,
    /// Observer refresh rate in Hz
    pub refresh_hz: f64,
    /// Points on the log-spaced response curve
    pub response_points: usize,
    /// Floor for every dB value the observer reports
    pub min_db: f64,
    /// Upper bound on blocks drained per channel per refresh
    pub max_blocks_per_refresh: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: 11,
            refresh_hz: 60.0,
            response_points: 512,
            min_db: -48.0,
            max_blocks_per_refresh: FIFO_CAPACITY,
        }
    }
}

impl AnalyzerConfig {
    pub fn fft_size(&self) -> usize {
        1 << self.fft_order
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_hz)
    }

    /// Check the analyzer settings on their own
    ///
    /// `fft_size` and `refresh_interval` are only meaningful once this passes.
    pub fn validate(&self) -> Result<()> {
        if !FFT_ORDER_RANGE.contains(&self.fft_order) {
            return Err(invalid(format!(
                "fft_order {} outside {}..={}",
                self.fft_order,
                FFT_ORDER_RANGE.start(),
                FFT_ORDER_RANGE.end()
            )));
        }
        if !self.refresh_hz.is_finite() || self.refresh_hz <= 0.0 {
            return Err(invalid(format!(
                "refresh_hz must be positive, got {}",
                self.refresh_hz
            )));
        }
        if self.response_points < 2 {
            return Err(invalid(format!(
                "response_points must be at least 2, got {}",
                self.response_points
            )));
        }
        if !self.min_db.is_finite() || self.min_db >= 0.0 {
            return Err(invalid(format!(
                "min_db must be negative, got {}",
                self.min_db
            )));
        }
        if self.max_blocks_per_refresh == 0 {
            return Err(invalid("max_blocks_per_refresh must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EqError::FileNotFound {
                path: path.display().to_string(),
                source: None,
            });
        }

        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Write as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EqError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if self.block_size == 0 {
            return Err(EqError::InvalidBlockSize {
                block_size: self.block_size,
            });
        }

        self.analyzer.validate()
    }
}

fn invalid(reason: String) -> EqError {
    EqError::InvalidConfig { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analyzer.fft_size(), 2048);
        assert_eq!(config.analyzer.max_blocks_per_refresh, FIFO_CAPACITY);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.sample_rate = 44100.0;
        config.analyzer.fft_order = 12;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "block_size": 256, "analyzer": { "min_db": -60.0 } }"#).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.block_size, 256);
        assert_eq!(loaded.sample_rate, 48000.0);
        assert_eq!(loaded.analyzer.min_db, -60.0);
        assert_eq!(loaded.analyzer.fft_order, 11);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.analyzer.fft_order = 20;
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");

        let mut config = EngineConfig::default();
        config.block_size = 0;
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_BLOCK_SIZE");

        let mut config = EngineConfig::default();
        config.analyzer.min_db = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analyzer_validate_on_its_own() {
        assert!(AnalyzerConfig::default().validate().is_ok());

        let config = AnalyzerConfig {
            refresh_hz: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");

        let config = AnalyzerConfig {
            fft_order: 70,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().error_code(), "INVALID_CONFIG");
    }
}
