//! Scene shader programs and their parameters.

use glam::Mat4;
use wgpu::{BindGroup, Buffer, Device, Queue, RenderPipeline};

use super::layouts::create_program_layout;
use super::mesh::GpuMesh;
use super::pipelines::{create_pipeline_layout, create_shader, RenderPipelineBuilder};
use super::textures::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::audio::AudioFeatures;
use crate::controls::Controls;
use crate::geometry::DrawMode;

/// Fractal noise settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub scale: f32,
    pub persistence: f32,
    pub octaves: u32,
    /// Extra speed applied to the noise animation.
    pub frequency_offset: Option<f32>,
}

/// Audio-independent displacement along the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    pub displacement: f32,
    pub frequency: f32,
}

/// Everything a scene program consumes for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderParameters {
    pub noise: NoiseParams,
    pub geometry_color: [f32; 4],
    /// Frame counter.
    pub time: f32,
    pub audio: AudioFeatures,
    pub jitter: Option<Jitter>,
}

impl ShaderParameters {
    pub fn from_controls(controls: &Controls, frame: u64, audio: AudioFeatures) -> Self {
        Self {
            noise: NoiseParams {
                scale: controls.scale,
                persistence: controls.persistence,
                octaves: controls.octaves,
                frequency_offset: Some(controls.frequency),
            },
            geometry_color: controls.geometry_color(),
            time: frame as f32,
            audio,
            jitter: Some(Jitter {
                displacement: controls.displacement,
                frequency: controls.frequency,
            }),
        }
    }

    /// Pack into the uniform block layout of `scene.wgsl`.
    pub fn uniforms(&self, view_proj: Mat4, model: Mat4) -> ProgramUniforms {
        let jitter = self.jitter.map_or([0.0; 4], |j| [j.displacement, j.frequency, 1.0, 0.0]);
        ProgramUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color: self.geometry_color,
            noise: [
                self.noise.scale,
                self.noise.persistence,
                self.noise.octaves as f32,
                self.noise.frequency_offset.unwrap_or(0.0),
            ],
            frame: [
                self.time,
                self.audio.frequency_energy,
                self.audio.waveform_amplitude,
                0.0,
            ],
            jitter,
        }
    }
}

/// Uniform block shared by the scene shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ProgramUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// scale, persistence, octaves, frequency offset
    pub noise: [f32; 4],
    /// time, frequency energy, waveform amplitude, unused
    pub frame: [f32; 4],
    /// displacement, frequency, enabled, unused
    pub jitter: [f32; 4],
}

/// Fragment stage variant of the scene shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// Noise-coloured solid surface.
    Fire,
    /// Flat, always-bright wireframe.
    Line,
}

impl ProgramKind {
    fn fragment_entry(self) -> &'static str {
        match self {
            ProgramKind::Fire => "fs_fire",
            ProgramKind::Line => "fs_line",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ProgramKind::Fire => "fire_program",
            ProgramKind::Line => "line_program",
        }
    }
}

/// A scene shader with its own uniform buffer and one pipeline per
/// [`DrawMode`].
///
/// Each program owns its uniform storage, so two programs drawn in the same
/// frame never overwrite each other's parameters.
pub struct ShaderProgram {
    uniform_buffer: Buffer,
    bind_group: BindGroup,
    pipelines: [RenderPipeline; 4],
}

impl ShaderProgram {
    pub fn new(device: &Device, kind: ProgramKind) -> Self {
        let shader = create_shader(device, "scene_shader", include_str!("shaders/scene.wgsl"));
        let bind_group_layout = create_program_layout(device);
        let pipeline_layout =
            create_pipeline_layout(device, "program_pipeline_layout", &[&bind_group_layout]);

        let pipelines = DrawMode::ALL.map(|mode| {
            RenderPipelineBuilder::new(kind.label(), &shader)
                .layout(&pipeline_layout)
                .fragment_entry(kind.fragment_entry())
                .vertex_buffers(GpuMesh::vertex_layouts())
                .target(COLOR_FORMAT)
                .target(COLOR_FORMAT)
                .depth(DEPTH_FORMAT)
                .topology(mode.topology())
                .build(device)
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("program_uniforms"),
            size: std::mem::size_of::<ProgramUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("program_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            uniform_buffer,
            bind_group,
            pipelines,
        }
    }

    /// Upload this frame's parameters.
    pub fn set_parameters(&self, queue: &Queue, parameters: &ShaderParameters, view_proj: Mat4) {
        let uniforms = parameters.uniforms(view_proj, Mat4::IDENTITY);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw `meshes`, each with the pipeline matching its draw mode.
    pub fn draw<'m>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        meshes: impl IntoIterator<Item = &'m GpuMesh>,
    ) {
        pass.set_bind_group(0, &self.bind_group, &[]);
        for mesh in meshes {
            pass.set_pipeline(&self.pipelines[mesh.draw_mode().index()]);
            mesh.draw(pass);
        }
    }
}
