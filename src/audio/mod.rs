//! Audio decoding, playback and analysis.
//!
//! This module provides:
//! - Track decoding via Symphonia (WAV, MP3, FLAC, AAC)
//! - Playback on the default output device via cpal
//! - A byte spectrum analyser via RustFFT
//! - Reduction of analyser output to per-frame shader features

pub mod analyser;
mod error;
pub mod features;
pub mod loader;
pub mod player;

pub use analyser::{
    AudioAnalyser, ByteAnalyser, SampleSource, WindowAnalyser, DEFAULT_FFT_SIZE,
};
pub use error::AudioError;
pub use features::{AudioFeatureExtractor, AudioFeatures};
pub use loader::{load_audio, AudioData};
pub use player::{Track, TrackPlayer};
