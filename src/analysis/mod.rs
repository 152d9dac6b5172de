//! Visualization feed
//!
//! Everything here runs on the observer side: the response curve, the FFT
//! spectrum and the [`Observer`] that drains the engine's analyzer FIFOs.

pub mod observer;
pub mod response;
pub mod spectrum;

pub use observer::{Observer, RefreshStats};
pub use response::{map_from_log10, map_to_log10, ResponseCurve, MAX_FREQUENCY, MIN_FREQUENCY};
pub use spectrum::{SpectralPeak, SpectrumAnalyzer};
