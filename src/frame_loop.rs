//! Per-frame driver.
//!
//! Each tick runs in a fixed order: advance the frame counter, rebuild the
//! scene if needed, extract audio features, update the camera, render, and
//! ask for the next frame. Rebuilds are edge-triggered: they happen on the
//! first tick, after [`FrameLoop::invalidate_scene`], or when the geometry
//! controls differ from the previous tick's. A failed rebuild is logged and
//! the previous scene keeps rendering until the next change or invalidation.

use thiserror::Error;

use crate::audio::{AudioAnalyser, AudioFeatureExtractor, AudioFeatures, DEFAULT_FFT_SIZE};
use crate::controls::Controls;
use crate::geometry::MeshError;
use crate::gpu::{GpuError, ShaderParameters};
use crate::scene::{SceneGeometry, SceneKey};

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Scene rebuild failed: {0}")]
    Mesh(#[from] MeshError),

    #[error("Rendering failed: {0}")]
    Gpu(#[from] GpuError),
}

/// What the loop drives: usually the window's renderer.
pub trait FrameTarget {
    /// Replace the scene meshes.
    fn rebuild_scene(&mut self, geometry: &SceneGeometry) -> Result<(), FrameError>;

    fn update_camera(&mut self);

    fn render(&mut self, parameters: &ShaderParameters) -> Result<(), FrameError>;

    /// Schedule the next tick.
    fn request_next_frame(&mut self);
}

/// Inputs sampled for one tick.
pub struct FrameInputs<'a> {
    pub controls: &'a Controls,
    pub analyser: Option<&'a mut dyn AudioAnalyser>,
}

impl<'a> FrameInputs<'a> {
    pub fn new(controls: &'a Controls) -> Self {
        Self {
            controls,
            analyser: None,
        }
    }

    pub fn with_analyser(mut self, analyser: &'a mut dyn AudioAnalyser) -> Self {
        self.analyser = Some(analyser);
        self
    }
}

pub struct FrameLoop {
    frame: u64,
    extractor: AudioFeatureExtractor,
    scene_key: Option<SceneKey>,
    dirty: bool,
    features: AudioFeatures,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            frame: 0,
            extractor: AudioFeatureExtractor::new(DEFAULT_FFT_SIZE / 2),
            scene_key: None,
            dirty: true,
            features: AudioFeatures::SILENT,
        }
    }

    /// Frames started so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Geometry controls of the current scene, if one was built.
    pub fn scene_key(&self) -> Option<SceneKey> {
        self.scene_key
    }

    /// Audio features of the last tick.
    pub fn features(&self) -> AudioFeatures {
        self.features
    }

    /// Force a rebuild on the next tick.
    pub fn invalidate_scene(&mut self) {
        self.dirty = true;
    }

    /// Run one frame. The next frame is requested even when this one fails.
    pub fn tick(
        &mut self,
        inputs: FrameInputs<'_>,
        target: &mut dyn FrameTarget,
    ) -> Result<(), FrameError> {
        let result = self.run(inputs, target);
        target.request_next_frame();
        result
    }

    fn run(&mut self, inputs: FrameInputs<'_>, target: &mut dyn FrameTarget) -> Result<(), FrameError> {
        self.frame += 1;

        let key = SceneKey::from_controls(inputs.controls);
        if self.dirty || self.scene_key != Some(key) {
            if let Err(e) = Self::rebuild(key, target) {
                log::warn!("Frame {}: {e}", self.frame);
            }
            self.scene_key = Some(key);
            self.dirty = false;
        }

        self.features = self.extractor.extract(inputs.analyser);
        target.update_camera();

        let parameters = ShaderParameters::from_controls(inputs.controls, self.frame, self.features);
        target.render(&parameters)
    }

    fn rebuild(key: SceneKey, target: &mut dyn FrameTarget) -> Result<(), FrameError> {
        let geometry = SceneGeometry::build(key)?;
        target.rebuild_scene(&geometry)
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}
