//! Music playback through the default output device.
//!
//! A [`Track`] is shared between the audio callback, which advances its
//! playhead, and the render thread, which reads the most recent window of
//! samples for analysis.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::analyser::SampleSource;
use super::error::AudioError;
use super::loader::AudioData;

/// Mono samples plus a shared playhead. Clones share the same playhead.
#[derive(Debug, Clone)]
pub struct Track {
    samples: Arc<[f32]>,
    sample_rate: u32,
    playhead: Arc<AtomicUsize>,
    playing: Arc<AtomicBool>,
}

impl Track {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            playhead: Arc::new(AtomicUsize::new(0)),
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Downmix decoded audio into a track.
    pub fn from_audio(audio: &AudioData) -> Self {
        Self::new(audio.to_mono(), audio.sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playhead in samples.
    pub fn position(&self) -> usize {
        self.playhead.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.position() >= self.samples.len()
    }

    pub fn rewind(&self) {
        self.playhead.store(0, Ordering::Release);
    }

    /// Move the playhead forward by `frames`, stopping at the end.
    pub fn advance(&self, frames: usize) {
        let next = self.position().saturating_add(frames).min(self.samples.len());
        self.playhead.store(next, Ordering::Release);
        if next == self.samples.len() {
            self.playing.store(false, Ordering::Release);
        }
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    /// Fill an interleaved output buffer with `channels` copies of each
    /// sample, stepping `step` source samples per output frame.
    /// `frac` carries the sub-sample position between calls.
    fn render(&self, out: &mut [f32], channels: usize, step: f64, frac: &mut f64) {
        if !self.is_playing() {
            out.fill(0.0);
            return;
        }

        let mut pos = self.position() as f64 + *frac;
        for frame in out.chunks_mut(channels.max(1)) {
            let sample = match self.samples.get(pos as usize) {
                Some(&s) => {
                    pos += step;
                    s
                }
                None => {
                    self.set_playing(false);
                    0.0
                }
            };
            frame.fill(sample);
        }

        let whole = pos.floor();
        *frac = pos - whole;
        self.playhead
            .store((whole as usize).min(self.samples.len()), Ordering::Release);
    }
}

impl SampleSource for Track {
    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    fn copy_window(&self, out: &mut [f32]) {
        let end = self.position().min(self.samples.len());
        let start = end as isize - out.len() as isize;
        for (i, slot) in out.iter_mut().enumerate() {
            let idx = start + i as isize;
            *slot = if idx < 0 { 0.0 } else { self.samples[idx as usize] };
        }
    }
}

/// Plays a [`Track`] on the default output device.
pub struct TrackPlayer {
    track: Track,
    stream: Option<cpal::Stream>,
}

impl TrackPlayer {
    pub fn new(track: Track) -> Self {
        Self {
            track,
            stream: None,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Start playback. Calling this while already playing does nothing; a
    /// finished track starts over.
    pub fn play(&mut self) -> Result<(), AudioError> {
        if self.track.is_playing() {
            return Ok(());
        }
        if self.track.is_finished() {
            self.track.rewind();
        }

        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.build_stream()?,
        };
        self.track.set_playing(true);
        if let Err(e) = stream.play() {
            self.track.set_playing(false);
            return Err(e.into());
        }
        self.stream = Some(stream);

        log::info!(
            "Playback started at {:.1}s",
            self.track.position() as f64 / self.track.sample_rate().max(1) as f64
        );
        Ok(())
    }

    fn build_stream(&self) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedSampleFormat(supported.sample_format()));
        }

        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels as usize;
        let step = self.track.sample_rate() as f64 / config.sample_rate.0 as f64;
        log::debug!(
            "Output stream: {}Hz, {} channels, step {:.4}",
            config.sample_rate.0,
            channels,
            step
        );

        let track = self.track.clone();
        let mut frac = 0.0;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                track.render(data, channels, step, &mut frac);
            },
            |err| log::error!("Audio output error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Track {
        Track::new((0..n).map(|i| i as f32).collect(), 8000)
    }

    #[test]
    fn test_window_before_start_is_zero_padded() {
        let track = ramp(10);
        track.advance(3);

        let mut window = [9.0; 5];
        track.copy_window(&mut window);
        assert_eq!(window, [0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_advance_stops_at_end() {
        let track = ramp(4);
        track.set_playing(true);
        track.advance(10);
        assert_eq!(track.position(), 4);
        assert!(track.is_finished());
        assert!(!track.is_playing());
    }

    #[test]
    fn test_render_is_silent_until_playing() {
        let track = ramp(8);
        track.advance(2);
        let mut out = [1.0; 4];
        let mut frac = 0.0;
        track.render(&mut out, 2, 1.0, &mut frac);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(track.position(), 2);
    }

    #[test]
    fn test_render_duplicates_channels_and_steps() {
        let track = ramp(8);
        track.set_playing(true);
        let mut out = [0.0; 6];
        let mut frac = 0.0;
        track.render(&mut out, 2, 2.0, &mut frac);
        assert_eq!(out, [0.0, 0.0, 2.0, 2.0, 4.0, 4.0]);
        assert_eq!(track.position(), 6);
    }

    #[test]
    fn test_render_carries_fraction() {
        let track = ramp(8);
        track.set_playing(true);
        let mut frac = 0.0;
        let mut out = [0.0; 3];
        track.render(&mut out, 1, 0.5, &mut frac);
        assert_eq!(out, [0.0, 0.0, 1.0]);
        assert_eq!(track.position(), 1);
        assert!((frac - 0.5).abs() < 1e-9);

        track.render(&mut out, 1, 0.5, &mut frac);
        assert_eq!(out, [1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_render_ends_playback() {
        let track = ramp(2);
        track.set_playing(true);
        let mut out = [7.0; 4];
        let mut frac = 0.0;
        track.render(&mut out, 1, 1.0, &mut frac);
        assert_eq!(out, [0.0, 1.0, 0.0, 0.0]);
        assert!(!track.is_playing());
        assert!(track.is_finished());
    }
}
