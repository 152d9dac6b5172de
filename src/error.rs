//! Error handling for the equalizer engine
//!
//! Nothing on the audio path returns these errors: parameters are clamped
//! before they reach the coefficient factory, so a factory error means the
//! integration handed the engine malformed state.

use thiserror::Error;

/// Result type alias for equalizer operations
pub type Result<T> = std::result::Result<T, EqError>;

/// Main error type for equalizer operations
#[derive(Error, Debug)]
pub enum EqError {
    // Filter Design Errors
    #[error("Invalid frequency: {frequency} Hz (must lie in (0, {nyquist}) at {sample_rate} Hz)", nyquist = .sample_rate / 2.0)]
    InvalidFrequency { frequency: f64, sample_rate: f64 },

    #[error("Invalid sample rate: {sample_rate}")]
    InvalidSampleRate { sample_rate: f64 },

    #[error("Invalid block size: {block_size}")]
    InvalidBlockSize { block_size: usize },

    #[error("Invalid parameter '{param}': {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // Engine State Errors
    #[error("Processor used before prepare()")]
    NotPrepared,

    // Audio Callback Errors (no heap allocation)
    #[error("Channel lengths differ: left {left}, right {right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("Interleaved stereo buffer has odd length {len}")]
    OddInterleavedLength { len: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EqError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EqError::InvalidFrequency { .. } => "INVALID_FREQUENCY",
            EqError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            EqError::InvalidBlockSize { .. } => "INVALID_BLOCK_SIZE",
            EqError::InvalidParameter { .. } => "INVALID_PARAMETER",
            EqError::NotPrepared => "NOT_PREPARED",
            EqError::ChannelLengthMismatch { .. } => "CHANNEL_LENGTH_MISMATCH",
            EqError::OddInterleavedLength { .. } => "ODD_INTERLEAVED_LENGTH",
            EqError::InvalidConfig { .. } => "INVALID_CONFIG",
            EqError::FileNotFound { .. } => "FILE_NOT_FOUND",
            EqError::InvalidAudio { .. } => "INVALID_AUDIO",
            EqError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            EqError::Io(_) => "IO_ERROR",
            EqError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Filter design errors are programming errors: the caller should have
    /// clamped its parameters, so retrying with the same input never helps.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EqError::InvalidFrequency { .. } | EqError::InvalidSampleRate { .. } => false,
            EqError::InvalidParameter { .. } => true,
            EqError::InvalidConfig { .. } => true,
            EqError::FileNotFound { .. } => true,
            EqError::InvalidAudio { .. } => true,
            EqError::UnsupportedFormat { .. } => true,
            _ => false,
        }
    }

    pub(crate) fn invalid_parameter(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        EqError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = EqError::InvalidFrequency {
            frequency: 30000.0,
            sample_rate: 48000.0,
        };
        assert_eq!(err.error_code(), "INVALID_FREQUENCY");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_audio_callback_errors() {
        let err = EqError::ChannelLengthMismatch { left: 512, right: 256 };
        assert_eq!(err.error_code(), "CHANNEL_LENGTH_MISMATCH");
        assert_eq!(err.to_string(), "Channel lengths differ: left 512, right 256");

        let err = EqError::OddInterleavedLength { len: 7 };
        assert_eq!(err.error_code(), "ODD_INTERLEAVED_LENGTH");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_invalid_frequency_message_names_nyquist() {
        let err = EqError::InvalidFrequency {
            frequency: 30000.0,
            sample_rate: 48000.0,
        };
        assert!(err.to_string().contains("24000"));
    }

    #[test]
    fn test_invalid_parameter_helper() {
        let err = EqError::invalid_parameter("q", 0.0, "0.1 to 10.0");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("'q'"));
    }

    #[test]
    fn test_serialization_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: EqError = json_err.into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
