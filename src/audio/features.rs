//! Per-frame reduction of analyser output to shader scalars.

use super::analyser::AudioAnalyser;

/// Normalized audio features, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFeatures {
    /// Mean of the byte frequency spectrum over 255.
    pub frequency_energy: f32,
    /// Mean of the byte waveform over 255.
    pub waveform_amplitude: f32,
}

impl AudioFeatures {
    pub const SILENT: AudioFeatures = AudioFeatures {
        frequency_energy: 0.0,
        waveform_amplitude: 0.0,
    };
}

/// Pulls byte arrays from an analyser once per frame and averages them.
///
/// The scratch buffers are reused across frames.
#[derive(Debug, Clone)]
pub struct AudioFeatureExtractor {
    frequency: Vec<u8>,
    waveform: Vec<u8>,
}

impl AudioFeatureExtractor {
    pub fn new(bin_count: usize) -> Self {
        Self {
            frequency: vec![0; bin_count],
            waveform: vec![0; bin_count],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.frequency.len()
    }

    /// Compute this frame's features.
    ///
    /// Returns [`AudioFeatures::SILENT`] when there is no analyser or its
    /// source has not started playing.
    pub fn extract(&mut self, analyser: Option<&mut dyn AudioAnalyser>) -> AudioFeatures {
        let Some(analyser) = analyser else {
            return AudioFeatures::SILENT;
        };
        if !analyser.is_active() {
            return AudioFeatures::SILENT;
        }

        let bins = analyser.frequency_bin_count();
        if bins != self.frequency.len() {
            self.frequency.resize(bins, 0);
            self.waveform.resize(bins, 0);
        }

        analyser.capture();
        analyser.byte_frequency_data(&mut self.frequency);
        analyser.byte_time_domain_data(&mut self.waveform);

        AudioFeatures {
            frequency_energy: normalized_mean(&self.frequency),
            waveform_amplitude: normalized_mean(&self.waveform),
        }
    }
}

fn normalized_mean(bytes: &[u8]) -> f32 {
    if bytes.is_empty() {
        return 0.0;
    }
    let sum: u64 = bytes.iter().map(|&b| b as u64).sum();
    sum as f32 / bytes.len() as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAnalyser {
        active: bool,
        frequency: u8,
        waveform: u8,
        bins: usize,
    }

    impl AudioAnalyser for FixedAnalyser {
        fn frequency_bin_count(&self) -> usize {
            self.bins
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn byte_frequency_data(&mut self, out: &mut [u8]) {
            out.fill(self.frequency);
        }

        fn byte_time_domain_data(&mut self, out: &mut [u8]) {
            out.fill(self.waveform);
        }
    }

    #[test]
    fn test_no_analyser_is_silent() {
        let mut extractor = AudioFeatureExtractor::new(1024);
        assert_eq!(extractor.extract(None), AudioFeatures::SILENT);
    }

    #[test]
    fn test_inactive_analyser_is_silent() {
        let mut extractor = AudioFeatureExtractor::new(1024);
        let mut analyser = FixedAnalyser {
            active: false,
            frequency: 200,
            waveform: 200,
            bins: 1024,
        };
        assert_eq!(extractor.extract(Some(&mut analyser)), AudioFeatures::SILENT);
    }

    #[test]
    fn test_means_are_normalized() {
        let mut extractor = AudioFeatureExtractor::new(1024);
        let mut analyser = FixedAnalyser {
            active: true,
            frequency: 255,
            waveform: 51,
            bins: 1024,
        };
        let features = extractor.extract(Some(&mut analyser));
        assert!((features.frequency_energy - 1.0).abs() < 1e-6);
        assert!((features.waveform_amplitude - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_buffers_follow_bin_count() {
        let mut extractor = AudioFeatureExtractor::new(16);
        let mut analyser = FixedAnalyser {
            active: true,
            frequency: 0,
            waveform: 128,
            bins: 64,
        };
        let features = extractor.extract(Some(&mut analyser));
        assert_eq!(extractor.bin_count(), 64);
        assert!((features.waveform_amplitude - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(features.frequency_energy, 0.0);
    }
}
