//! FFT spectrum of the processed signal
//!
//! Keeps the most recent `fft_size` samples of one channel, applies a Hann
//! window and converts the positive-frequency bins to dB.

use crate::dsp::gain_to_decibels;
use crate::error::{EqError, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Strongest bin found by [`SpectrumAnalyzer::peaks`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    pub frequency: f64,
    pub magnitude_db: f32,
}

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    sample_rate: f64,
    min_db: f32,
    window: Vec<f32>,
    history: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    magnitudes_db: Vec<f32>,
    samples_seen: usize,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f64, min_db: f32) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(EqError::invalid_parameter(
                "fft size",
                fft_size,
                "a power of two",
            ));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EqError::InvalidSampleRate { sample_rate });
        }

        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Ok(Self {
            fft,
            fft_size,
            sample_rate,
            min_db,
            window,
            history: vec![0.0; fft_size],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            magnitudes_db: vec![min_db; fft_size / 2],
            samples_seen: 0,
        })
    }

    /// Append samples, keeping only the newest `fft_size`
    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.fft_size;
        if samples.len() >= n {
            self.history.copy_from_slice(&samples[samples.len() - n..]);
        } else {
            self.history.copy_within(samples.len().., 0);
            self.history[n - samples.len()..].copy_from_slice(samples);
        }
        self.samples_seen = self.samples_seen.saturating_add(samples.len());
    }

    /// Run the FFT over the current history
    pub fn compute(&mut self) {
        for ((out, &sample), &w) in self
            .scratch
            .iter_mut()
            .zip(&self.history)
            .zip(&self.window)
        {
            *out = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 2.0 / self.fft_size as f32;
        for (db, bin) in self.magnitudes_db.iter_mut().zip(&self.scratch) {
            *db = gain_to_decibels(bin.norm() * scale, self.min_db);
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Frequency spacing between bins
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width()
    }

    /// Positive-frequency bins in dB from the last `compute`
    pub fn magnitudes_db(&self) -> &[f32] {
        &self.magnitudes_db
    }

    /// Level of the bin nearest `frequency`
    pub fn magnitude_db_at(&self, frequency: f64) -> f32 {
        let bin = (frequency / self.bin_width()).round() as usize;
        self.magnitudes_db.get(bin).copied().unwrap_or(self.min_db)
    }

    /// The `count` strongest bins, loudest first
    pub fn peaks(&self, count: usize) -> Vec<SpectralPeak> {
        let mut peaks: Vec<SpectralPeak> = self
            .magnitudes_db
            .iter()
            .enumerate()
            .skip(1)
            .map(|(bin, &magnitude_db)| SpectralPeak {
                frequency: self.bin_frequency(bin),
                magnitude_db,
            })
            .collect();
        peaks.sort_by(|a, b| b.magnitude_db.total_cmp(&a.magnitude_db));
        peaks.truncate(count);
        peaks
    }

    /// True once a full FFT frame of real samples has been pushed
    pub fn has_full_frame(&self) -> bool {
        self.samples_seen >= self.fft_size
    }
}
