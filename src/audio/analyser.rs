//! Byte-valued frequency and waveform analysis.
//!
//! [`AudioAnalyser`] is the boundary the render loop reads from once per
//! frame. [`ByteAnalyser`] is the DSP behind the native implementation and
//! follows the browser analyser conventions: Blackman window, temporal
//! smoothing of magnitudes, decibel range mapped onto `0..=255`, and
//! waveform bytes centred on 128.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT window size used by the visualizer.
pub const DEFAULT_FFT_SIZE: usize = 2048;
/// Weight of the previous frame's magnitude when smoothing.
pub const DEFAULT_SMOOTHING: f32 = 0.8;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

/// Source of per-frame byte spectra, e.g. a playing music track.
pub trait AudioAnalyser {
    /// Length of the arrays filled below (half the FFT size).
    fn frequency_bin_count(&self) -> usize;

    /// Whether a source is currently feeding the analyser.
    fn is_active(&self) -> bool;

    /// Snapshot the current input so both byte arrays below describe the
    /// same window. Called once per frame before reading them.
    fn capture(&mut self) {}

    /// Fill `out` with the current magnitude spectrum, one byte per bin.
    fn byte_frequency_data(&mut self, out: &mut [u8]);

    /// Fill `out` with the current waveform, 128 meaning silence.
    fn byte_time_domain_data(&mut self, out: &mut [u8]);
}

/// Provider of the most recent audio samples.
pub trait SampleSource {
    fn is_playing(&self) -> bool;

    /// Copy the `out.len()` samples that end at the current playhead.
    /// Positions before the start of the track are zero.
    fn copy_window(&self, out: &mut [f32]);
}

/// Spectrum analyser producing byte data from a window of samples.
pub struct ByteAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl ByteAnalyser {
    /// Create an analyser for windows of `fft_size` samples.
    ///
    /// # Panics
    ///
    /// Panics if `fft_size` is not a power of two.
    pub fn new(fft_size: usize) -> Self {
        assert!(fft_size.is_power_of_two(), "FFT size must be a power of 2");

        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        // Blackman window
        let n = fft_size as f32;
        let window = (0..fft_size)
            .map(|i| {
                let t = 2.0 * std::f32::consts::PI * i as f32 / n;
                0.42 - 0.5 * t.cos() + 0.08 * (2.0 * t).cos()
            })
            .collect();

        Self {
            fft,
            fft_size,
            window,
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
        }
    }

    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing.clamp(0.0, 1.0);
        self
    }

    pub fn with_decibel_range(mut self, min_decibels: f32, max_decibels: f32) -> Self {
        assert!(min_decibels < max_decibels, "decibel range is empty");
        self.min_decibels = min_decibels;
        self.max_decibels = max_decibels;
        self
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Forget the smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Run one analysis step over `samples` (the last `fft_size` samples are
    /// used, missing leading samples count as zero) and write one byte per
    /// bin into `out`.
    pub fn frequency_bytes(&mut self, samples: &[f32], out: &mut [u8]) {
        let offset = self.fft_size.saturating_sub(samples.len());
        let tail = &samples[samples.len().saturating_sub(self.fft_size)..];

        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = if i < offset { 0.0 } else { tail[i - offset] };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        let range = self.max_decibels - self.min_decibels;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            if let Some(byte) = out.get_mut(k) {
                let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
                let scaled = 255.0 * (db - self.min_decibels) / range;
                *byte = scaled.floor().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Map samples onto waveform bytes; `out` is filled from the start of
    /// the window.
    pub fn time_domain_bytes(&self, samples: &[f32], out: &mut [u8]) {
        let tail = &samples[samples.len().saturating_sub(self.fft_size)..];
        for (byte, &s) in out.iter_mut().zip(tail) {
            *byte = (128.0 * (1.0 + s)).floor().clamp(0.0, 255.0) as u8;
        }
    }
}

/// [`AudioAnalyser`] over any [`SampleSource`].
pub struct WindowAnalyser<S> {
    source: S,
    analyser: ByteAnalyser,
    samples: Vec<f32>,
}

impl<S: SampleSource> WindowAnalyser<S> {
    pub fn new(source: S, fft_size: usize) -> Self {
        Self {
            source,
            analyser: ByteAnalyser::new(fft_size),
            samples: vec![0.0; fft_size],
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: SampleSource> AudioAnalyser for WindowAnalyser<S> {
    fn frequency_bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn is_active(&self) -> bool {
        self.source.is_playing()
    }

    fn capture(&mut self) {
        self.source.copy_window(&mut self.samples);
    }

    /// Spectrum of the window taken by the last [`AudioAnalyser::capture`].
    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.analyser.frequency_bytes(&self.samples, out);
    }

    fn byte_time_domain_data(&mut self, out: &mut [u8]) {
        self.analyser.time_domain_bytes(&self.samples, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::AudioFeatureExtractor;
    use std::cell::Cell;
    use std::f32::consts::PI;

    /// Source whose level rises every time a window is copied.
    struct RisingSource {
        copies: Cell<u32>,
    }

    impl SampleSource for RisingSource {
        fn is_playing(&self) -> bool {
            true
        }

        fn copy_window(&self, out: &mut [f32]) {
            let copies = self.copies.get();
            out.fill(0.5 * copies as f32);
            self.copies.set(copies + 1);
        }
    }

    #[test]
    fn test_both_arrays_share_one_window_per_frame() {
        let source = RisingSource {
            copies: Cell::new(1),
        };
        let mut analyser = WindowAnalyser::new(source, 256);
        let mut extractor = AudioFeatureExtractor::new(128);

        let features = extractor.extract(Some(&mut analyser));
        assert_eq!(analyser.source().copies.get(), 2);
        // a constant 0.5 window maps every waveform byte to 192
        assert!((features.waveform_amplitude - 192.0 / 255.0).abs() < 1e-5);

        extractor.extract(Some(&mut analyser));
        assert_eq!(analyser.source().copies.get(), 3);
    }

    fn generate_sine(freq: f32, sample_rate: u32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_silence_maps_to_floor_and_midline() {
        let mut analyser = ByteAnalyser::new(1024);
        let silence = vec![0.0; 1024];

        let mut freq = vec![255u8; 512];
        analyser.frequency_bytes(&silence, &mut freq);
        assert!(freq.iter().all(|&b| b == 0));

        let mut wave = vec![0u8; 512];
        analyser.time_domain_bytes(&silence, &mut wave);
        assert!(wave.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let sample_rate = 44100;
        let mut analyser = ByteAnalyser::new(2048)
            .with_smoothing(0.0)
            .with_decibel_range(-100.0, 0.0);
        let samples = generate_sine(1000.0, sample_rate, 2048);

        let mut freq = vec![0u8; analyser.bin_count()];
        analyser.frequency_bytes(&samples, &mut freq);

        let peak_bin = freq
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        let peak_freq = peak_bin as f32 * sample_rate as f32 / 2048.0;
        assert!((peak_freq - 1000.0).abs() < 50.0, "peak at {peak_freq} Hz");
        assert!(freq[peak_bin] > 200);
    }

    #[test]
    fn test_smoothing_lags_behind_input() {
        let samples = generate_sine(440.0, 44100, 2048);
        let mut smooth = ByteAnalyser::new(2048);
        let mut instant = ByteAnalyser::new(2048).with_smoothing(0.0);

        let mut a = vec![0u8; 1024];
        let mut b = vec![0u8; 1024];
        smooth.frequency_bytes(&samples, &mut a);
        instant.frequency_bytes(&samples, &mut b);

        let sum = |v: &[u8]| v.iter().map(|&x| x as u32).sum::<u32>();
        assert!(sum(&a) < sum(&b));
    }

    #[test]
    fn test_time_domain_clamps_full_scale() {
        let analyser = ByteAnalyser::new(4);
        let mut out = [0u8; 4];
        analyser.time_domain_bytes(&[1.0, -1.0, 2.0, 0.5], &mut out);
        assert_eq!(out, [255, 0, 255, 192]);
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_rejects_non_power_of_two() {
        let _ = ByteAnalyser::new(1000);
    }
}
