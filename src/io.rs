//! WAV file I/O
//!
//! Reads mono or stereo WAV files of any common sample format into planar
//! f32 and writes 32-bit float WAV files back out.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{EqError, Result};

/// Planar audio as read from or written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct WavAudio {
    pub sample_rate: u32,
    /// One sample vector per channel, all the same length
    pub channels: Vec<Vec<f32>>,
}

impl WavAudio {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    /// Left and right channels; mono input is duplicated
    pub fn to_stereo(&self) -> (Vec<f32>, Vec<f32>) {
        match self.channels.as_slice() {
            [mono] => (mono.clone(), mono.clone()),
            [left, right, ..] => (left.clone(), right.clone()),
            [] => (Vec::new(), Vec::new()),
        }
    }
}

/// Read a WAV file into planar f32
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a readable WAV file
/// * `UnsupportedFormat` - More than two channels or an odd bit depth
pub fn read_wav(path: &Path) -> Result<WavAudio> {
    if !path.exists() {
        return Err(EqError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| EqError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        return Err(EqError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    log::debug!(
        "Read {} ({} Hz, {} ch, {}-bit {:?})",
        path.display(),
        spec.sample_rate,
        channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    Ok(WavAudio::new(spec.sample_rate, deinterleave(&samples, channels)))
}

/// Write planar audio as a 32-bit float WAV file
pub fn write_wav(path: &Path, audio: &WavAudio) -> Result<()> {
    let channels = audio.num_channels();
    if channels == 0 || channels > 2 {
        return Err(EqError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }
    if audio.channels.iter().any(|c| c.len() != audio.num_frames()) {
        return Err(EqError::InvalidAudio {
            reason: "channels differ in length".to_string(),
            source: None,
        });
    }

    let spec = WavSpec {
        channels: channels as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(wav_write_error)?;
    for sample in interleave(&audio.channels) {
        writer.write_sample(sample).map_err(wav_write_error)?;
    }
    writer.finalize().map_err(wav_write_error)?;
    Ok(())
}

fn wav_write_error(e: hound::Error) -> EqError {
    match e {
        hound::Error::IoError(io) => EqError::Io(io),
        other => EqError::InvalidAudio {
            reason: format!("Failed to write WAV file: {}", other),
            source: Some(Box::new(other)),
        },
    }
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let read_error = |e: hound::Error| EqError::InvalidAudio {
        reason: format!("Failed to read {}-bit samples: {}", bits_per_sample, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(read_error),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(EqError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(read_error)
        }
    }
}

/// [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in result.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    result
}

/// [[L,L,...], [R,R,...]] to [L,R,L,R,...]
fn interleave(channels: &[Vec<f32>]) -> Vec<f32> {
    let frames = channels.first().map_or(0, Vec::len);
    let mut result = Vec::with_capacity(frames * channels.len());
    for frame in 0..frames {
        for channel in channels {
            result.push(channel[frame]);
        }
    }
    result
}
