//! Real-time engine
//!
//! Core runtime of the equalizer:
//! - Control-rate coefficient updates
//! - Lock-free block FIFO to the observer
//! - Stereo processor driving both channels

pub mod controller;
pub mod fifo;
pub mod processor;
pub mod sample_fifo;

pub use controller::{ChainCoefficients, ChainController};
pub use fifo::{spectral_fifo, BlockConsumer, BlockProducer, FIFO_CAPACITY};
pub use processor::{AnalyzerTaps, EqProcessor, LEFT, RIGHT};
pub use sample_fifo::ChannelSampleFifo;
