//! GPU rendering using wgpu.
//!
//! Provides the device context, offscreen render targets, scene shader
//! programs and the multi-pass frame renderer (scene with bright-pass
//! extraction, ping-pong Gaussian blur, additive composite).

pub mod context;
pub mod frame_graph;
pub mod layouts;
pub mod mesh;
pub mod pipelines;
pub mod postprocess;
pub mod program;
pub mod renderer;
pub mod textures;

pub use context::{GpuContext, GpuError};
pub use frame_graph::{BloomSource, BlurStep, FramePlan, FrameStage};
pub use mesh::GpuMesh;
pub use postprocess::BloomChain;
pub use program::{Jitter, NoiseParams, ProgramKind, ShaderParameters, ShaderProgram};
pub use renderer::{FrameRenderer, RendererConfig, ScenePass, DEFAULT_BLUR_ITERATIONS};
pub use textures::{ReadbackBuffer, RenderTarget};
