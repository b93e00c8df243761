//! User-tunable visual parameters.
//!
//! The frame loop receives a [`Controls`] snapshot every tick; edits happen
//! between ticks through the keyboard bindings or a JSON file given at
//! startup.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors raised while loading a controls file.
#[derive(Error, Debug)]
pub enum ControlsError {
    #[error("Failed to read controls file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse controls: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Control panel values. Missing fields take their default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    /// Geometry colour, RGB bytes. Channels outside 0..=255 are clamped on load.
    #[serde(deserialize_with = "deserialize_color")]
    pub color: [u8; 3],
    /// Noise input scale (0.0 - 5.0).
    pub scale: f32,
    /// Amplitude falloff per noise octave (0.0 - 1.0).
    pub persistence: f32,
    /// Noise octave count (1 - 10).
    pub octaves: u32,
    /// Jitter amplitude along the normal (0.0 - 1.0).
    pub displacement: f32,
    /// Noise and jitter speed (0.0 - 2.0).
    pub frequency: f32,
    /// Inner sphere subdivision level (0 - 8).
    pub tesselations: u32,
    /// Gap between inner sphere and outer wireframe (0.0 - 1.0).
    pub separation: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            scale: 1.5,
            persistence: 0.75,
            octaves: 4,
            displacement: 0.1,
            frequency: 1.0,
            tesselations: 8,
            separation: 0.1,
        }
    }
}

pub const MAX_TESSELATIONS: u32 = 8;
pub const MAX_OCTAVES: u32 = 10;

impl Controls {
    /// Load from a JSON file and clamp into range.
    pub fn load(path: &Path) -> Result<Self, ControlsError> {
        let text = std::fs::read_to_string(path)?;
        let controls = Self::from_json(&text)?;
        log::info!("Loaded controls from {}", path.display());
        Ok(controls)
    }

    pub fn from_json(text: &str) -> Result<Self, ControlsError> {
        let controls: Controls = serde_json::from_str(text)?;
        Ok(controls.clamped())
    }

    /// Copy with every value forced into its panel range. NaN becomes the
    /// range minimum.
    pub fn clamped(self) -> Self {
        Self {
            color: self.color,
            scale: clamp_finite(self.scale, 0.0, 5.0),
            persistence: clamp_finite(self.persistence, 0.0, 1.0),
            octaves: self.octaves.clamp(1, MAX_OCTAVES),
            displacement: clamp_finite(self.displacement, 0.0, 1.0),
            frequency: clamp_finite(self.frequency, 0.0, 2.0),
            tesselations: self.tesselations.min(MAX_TESSELATIONS),
            separation: clamp_finite(self.separation, 0.0, 1.0),
        }
    }

    /// Colour as normalized RGBA with full alpha.
    pub fn geometry_color(&self) -> [f32; 4] {
        let [r, g, b] = self.color;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }

    pub fn adjust_tesselations(&mut self, delta: i32) {
        self.tesselations = self
            .tesselations
            .saturating_add_signed(delta)
            .min(MAX_TESSELATIONS);
    }

    pub fn adjust_separation(&mut self, delta: f32) {
        self.separation = clamp_finite(self.separation + delta, 0.0, 1.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn deserialize_color<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 3], D::Error> {
    let channels = <[i64; 3]>::deserialize(deserializer)?;
    Ok(channels.map(|channel| channel.clamp(0, 255) as u8))
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Trigger buttons of the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Rebuild the scene geometry.
    LoadScene,
    /// Start the music track.
    PlayMusic,
    /// Restore default parameters.
    ResetParameters,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let controls = Controls::default();
        assert_eq!(controls.color, [255, 0, 0]);
        assert_eq!(controls.octaves, 4);
        assert_eq!(controls.tesselations, 8);
        assert!((controls.scale - 1.5).abs() < f32::EPSILON);
        assert!((controls.separation - 0.1).abs() < f32::EPSILON);
        assert_eq!(controls.geometry_color(), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let controls = Controls::from_json(r#"{ "scale": 3.0, "octaves": 6 }"#).unwrap();
        assert_eq!(controls.octaves, 6);
        assert!((controls.scale - 3.0).abs() < f32::EPSILON);
        assert!((controls.persistence - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let controls = Controls::from_json(
            r#"{ "scale": 9.0, "persistence": -1.0, "octaves": 0, "tesselations": 20, "frequency": 5.0 }"#,
        )
        .unwrap();
        assert_eq!(controls.scale, 5.0);
        assert_eq!(controls.persistence, 0.0);
        assert_eq!(controls.octaves, 1);
        assert_eq!(controls.tesselations, 8);
        assert_eq!(controls.frequency, 2.0);
    }

    #[test]
    fn test_color_channels_are_clamped() {
        let controls = Controls::from_json(r#"{ "color": [300, -5, 128] }"#).unwrap();
        assert_eq!(controls.color, [255, 0, 128]);
        assert_eq!(controls.scale, Controls::default().scale);
    }

    #[test]
    fn test_adjustments_stay_in_range() {
        let mut controls = Controls::default();
        controls.adjust_tesselations(3);
        assert_eq!(controls.tesselations, 8);
        controls.adjust_tesselations(-10);
        assert_eq!(controls.tesselations, 0);

        controls.adjust_separation(2.0);
        assert_eq!(controls.separation, 1.0);
        controls.reset();
        assert_eq!(controls, Controls::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "color": [0, 128, 255], "separation": 0.5 }}"#).unwrap();

        let controls = Controls::load(file.path()).unwrap();
        assert_eq!(controls.color, [0, 128, 255]);
        assert!((controls.separation - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Controls::load(file.path()),
            Err(ControlsError::Parse(_))
        ));
    }
}
