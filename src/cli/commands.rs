//! CLI command implementations

use std::path::Path;

use log::info;

use super::EqArgs;
use crate::analysis::{Observer, ResponseCurve};
use crate::config::EngineConfig;
use crate::dsp::{gain_to_decibels, MonoPath};
use crate::engine::{ChainController, EqProcessor, LEFT};
use crate::error::{EqError, Result};
use crate::io::{read_wav, write_wav, WavAudio};
use crate::params::{parameter_channel, ParameterSnapshot, Slope};

/// Parameters of the impulse check: 100 Hz / 24 dB low cut, +6 dB at 1 kHz,
/// 8 kHz / 12 dB high cut
pub fn impulse_scenario() -> ParameterSnapshot {
    ParameterSnapshot {
        low_cut_freq: 100.0,
        low_cut_slope: Slope::Db24,
        peak_freq: 1000.0,
        peak_gain_db: 6.0,
        peak_quality: 1.0,
        high_cut_freq: 8000.0,
        high_cut_slope: Slope::Db12,
    }
}

/// Outcome of [`impulse`]
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseReport {
    /// Energy of each block in dB
    pub block_energy_db: Vec<f64>,
    pub all_finite: bool,
}

impl ImpulseReport {
    /// Last block carries less energy than the first
    pub fn decays(&self) -> bool {
        match (self.block_energy_db.first(), self.block_energy_db.last()) {
            (Some(first), Some(last)) => self.block_energy_db.len() > 1 && last < first,
            _ => false,
        }
    }
}

/// Render a WAV file through the equalizer
pub fn render(input: &Path, output: &Path, eq: &EqArgs, config: &EngineConfig) -> Result<()> {
    let snapshot = eq.resolve(ParameterSnapshot::default())?;
    let audio = read_wav(input)?;
    let (mut left, mut right) = audio.to_stereo();

    let (_store, feed) = parameter_channel(snapshot);
    let mut processor = EqProcessor::new(feed);
    let _taps = processor.prepare(audio.sample_rate as f64, config.block_size)?;
    for role in eq.bypassed_roles() {
        processor.set_role_enabled(role, false);
    }

    info!(
        "Rendering {} ({} frames at {} Hz)",
        input.display(),
        audio.num_frames(),
        audio.sample_rate
    );
    for (l, r) in left
        .chunks_mut(config.block_size)
        .zip(right.chunks_mut(config.block_size))
    {
        processor.process_block(l, r)?;
    }

    let channels = if audio.num_channels() == 1 {
        vec![left]
    } else {
        vec![left, right]
    };
    let rendered = WavAudio::new(audio.sample_rate, channels);
    write_wav(output, &rendered)?;

    println!("Rendered: {}", output.display());
    for (i, channel) in rendered.channels.iter().enumerate() {
        let peak = channel.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        println!("  channel {} peak: {:.2} dBFS", i, gain_to_decibels(peak, -120.0));
    }
    Ok(())
}

/// Print the response curve as a frequency/dB table
pub fn response(points: usize, eq: &EqArgs, config: &EngineConfig) -> Result<()> {
    let snapshot = eq.resolve(ParameterSnapshot::default())?;
    let mut curve = ResponseCurve::new(points, config.sample_rate, config.analyzer.min_db)?;
    for role in eq.bypassed_roles() {
        curve.set_role_enabled(role, false);
    }
    curve.update(&snapshot)?;

    println!("Response at {} Hz:", config.sample_rate);
    println!("{:-<28}", "");
    println!("{:>12}  {:>12}", "Hz", "dB");
    for (freq, db) in curve.points() {
        println!("{:>12.1}  {:>12.2}", freq, db);
    }
    Ok(())
}

/// Run a unit impulse through one mono path, block by block
pub fn impulse(blocks: usize, eq: &EqArgs, config: &EngineConfig) -> Result<ImpulseReport> {
    let snapshot = eq.resolve(impulse_scenario())?;
    let report = run_impulse(&snapshot, config.sample_rate, config.block_size, blocks)?;

    println!("Impulse through {} blocks of {}:", blocks, config.block_size);
    for (i, db) in report.block_energy_db.iter().enumerate() {
        println!("  block {:>3}: {:>8.2} dB", i, db);
    }
    println!("Finite: {}", report.all_finite);
    println!("Decays: {}", report.decays());
    Ok(report)
}

/// Impulse response energy per block for `snapshot`
pub fn run_impulse(
    snapshot: &ParameterSnapshot,
    sample_rate: f64,
    block_size: usize,
    blocks: usize,
) -> Result<ImpulseReport> {
    if block_size == 0 {
        return Err(EqError::InvalidBlockSize { block_size });
    }
    let coefficients = ChainController::design(snapshot, sample_rate)?;
    let mut path = MonoPath::new();
    path.prepare(sample_rate, block_size);
    coefficients.apply_to(&mut path);

    let mut block = vec![0.0f32; block_size];
    let mut report = ImpulseReport {
        block_energy_db: Vec::with_capacity(blocks),
        all_finite: true,
    };
    for b in 0..blocks {
        block.fill(0.0);
        if b == 0 {
            block[0] = 1.0;
        }
        path.process(&mut block);

        report.all_finite &= block.iter().all(|s| s.is_finite());
        let energy: f64 = block.iter().map(|&s| (s as f64) * (s as f64)).sum();
        report
            .block_energy_db
            .push(gain_to_decibels(energy.sqrt(), -300.0));
    }
    Ok(report)
}

/// Print the strongest bins of the processed left channel
pub fn spectrum(input: &Path, peaks: usize, eq: &EqArgs, config: &EngineConfig) -> Result<()> {
    let snapshot = eq.resolve(ParameterSnapshot::default())?;
    let audio = read_wav(input)?;
    let (mut left, mut right) = audio.to_stereo();
    let sample_rate = audio.sample_rate as f64;

    let (store, feed) = parameter_channel(snapshot);
    let mut processor = EqProcessor::new(feed);
    let taps = processor.prepare(sample_rate, config.block_size)?;
    let mut observer = Observer::new(taps, sample_rate, &config.analyzer)?;
    for role in eq.bypassed_roles() {
        processor.set_role_enabled(role, false);
        observer.response_mut().set_role_enabled(role, false);
    }

    for (l, r) in left
        .chunks_mut(config.block_size)
        .zip(right.chunks_mut(config.block_size))
    {
        processor.process_block(l, r)?;
        observer.refresh(&store.snapshot())?;
    }

    let Some(analyzer) = observer.spectrum(LEFT) else {
        return Ok(());
    };
    if !analyzer.has_full_frame() {
        println!(
            "Input shorter than one FFT frame ({} samples); spectrum is partial",
            analyzer.fft_size()
        );
    }
    println!("Strongest bins of {}:", input.display());
    for peak in analyzer.peaks(peaks) {
        println!("  {:>10.1} Hz  {:>8.2} dB", peak.frequency, peak.magnitude_db);
    }
    Ok(())
}
