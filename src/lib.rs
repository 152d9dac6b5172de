//! Simple EQ - Real-time Three-Band Equalizer Engine
//!
//! A low-cut, parametric peak and high-cut filter chain with a lock-free feed
//! for visualizing its response and spectrum.
//!
//! # Architecture
//!
//! The system runs in two contexts:
//! - Audio: [`engine::EqProcessor`] reads the latest parameter snapshot once
//!   per block, recomputes coefficients and filters both channels
//! - Observer: [`analysis::Observer`] drains the processed blocks through a
//!   lock-free FIFO and maintains the response curve and FFT spectrum
//!
//! Parameters cross from the control side via a wait-free triple buffer
//! ([`params::parameter_channel`]); nothing on the audio path locks or
//! allocates.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod io;
pub mod params;

pub use error::{EqError, Result};
