//! Sonosphere
//!
//! Audio-reactive visualizer that renders a noise-displaced icosphere inside
//! a wireframe shell, with a bloom post-process.
//!
//! # Features
//!
//! - Icosphere and primitive mesh generation
//! - Audio decoding via Symphonia and playback via cpal
//! - Byte spectrum analysis via RustFFT
//! - Multi-pass rendering via wgpu: scene with bright-pass extraction,
//!   ping-pong Gaussian blur, additive composite
//! - Orbit camera and keyboard/mouse controls via winit

pub mod app;
pub mod audio;
pub mod camera;
pub mod controls;
pub mod frame_loop;
pub mod geometry;
pub mod gpu;
pub mod scene;

// Re-export commonly used types
pub use app::{AppOptions, VisualizerApp};
pub use audio::{load_audio, AudioAnalyser, AudioData, AudioFeatureExtractor, AudioFeatures};
pub use camera::Camera;
pub use controls::{ControlAction, Controls};
pub use frame_loop::{FrameError, FrameInputs, FrameLoop, FrameTarget};
pub use geometry::{DrawMode, Icosphere, Mesh, MeshError};
pub use gpu::{FrameRenderer, GpuContext, RendererConfig, ShaderParameters};
pub use scene::{SceneGeometry, SceneKey};
