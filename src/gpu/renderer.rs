//! Multi-pass frame renderer: scene, bloom blur, composite.

use std::sync::Arc;

use glam::Vec3;
use wgpu::{BindGroup, BindGroupLayout, Device, Queue, RenderPipeline, Sampler, TextureFormat, TextureView};

use super::context::GpuContext;
use super::frame_graph::{FramePlan, FrameStage};
use super::layouts::create_composite_layout;
use super::mesh::GpuMesh;
use super::pipelines::{create_pipeline_layout, create_shader, RenderPipelineBuilder};
use super::postprocess::BloomChain;
use super::program::{ShaderParameters, ShaderProgram};
use super::textures::RenderTarget;
use crate::camera::Camera;
use crate::geometry::Square;

pub const DEFAULT_BLUR_ITERATIONS: u32 = 10;

/// Configuration for rendering.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    /// Format of the view passed to [`FrameRenderer::render_frame`].
    pub output_format: TextureFormat,
    pub blur_iterations: u32,
    pub clear_color: wgpu::Color,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            output_format: TextureFormat::Rgba8Unorm,
            blur_iterations: DEFAULT_BLUR_ITERATIONS,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

/// One program drawn over a list of meshes during the scene stage.
pub struct ScenePass<'a> {
    pub program: &'a ShaderProgram,
    pub parameters: &'a ShaderParameters,
    pub meshes: &'a [&'a GpuMesh],
}

/// Owns every offscreen target and runs the per-frame stage sequence.
pub struct FrameRenderer {
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: RendererConfig,
    plan: FramePlan,
    scene_target: RenderTarget,
    bloom: BloomChain,
    composite_pipeline: RenderPipeline,
    composite_layout: BindGroupLayout,
    composite_sampler: Sampler,
    // indexed by the ping-pong target read as bloom
    composite_groups: [BindGroup; 2],
    quad: GpuMesh,
}

impl FrameRenderer {
    pub fn new(ctx: &GpuContext, config: RendererConfig) -> Self {
        let device = Arc::clone(&ctx.device);
        let queue = Arc::clone(&ctx.queue);

        let scene_target = RenderTarget::for_scene(&device, "scene", config.width, config.height);
        let (width, height) = scene_target.size();
        let bloom = BloomChain::new(&device, &queue, width, height, scene_target.color_view(1));

        let shader = create_shader(&device, "composite_shader", include_str!("shaders/composite.wgsl"));
        let composite_layout = create_composite_layout(&device);
        let pipeline_layout =
            create_pipeline_layout(&device, "composite_pipeline_layout", &[&composite_layout]);
        let composite_pipeline = RenderPipelineBuilder::new("composite_pipeline", &shader)
            .layout(&pipeline_layout)
            .vertex_buffers(GpuMesh::vertex_layouts())
            .target(config.output_format)
            .build(&device);

        let composite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let composite_groups = create_composite_groups(
            &device,
            &composite_layout,
            &composite_sampler,
            &scene_target,
            &bloom,
        );

        let quad = GpuMesh::upload(&device, "quad", &Square::new(Vec3::ZERO).build());
        let plan = FramePlan::new(config.blur_iterations);

        log::info!(
            "Frame renderer ready at {}x{} with {} blur passes",
            width,
            height,
            config.blur_iterations
        );

        Self {
            device,
            queue,
            config,
            plan,
            scene_target,
            bloom,
            composite_pipeline,
            composite_layout,
            composite_sampler,
            composite_groups,
            quad,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn set_blur_iterations(&mut self, iterations: u32) {
        self.config.blur_iterations = iterations;
        self.plan = FramePlan::new(iterations);
    }

    /// Sizes of the scene target and both blur targets, in that order.
    pub fn target_sizes(&self) -> [(u32, u32); 3] {
        let [ping0, ping1] = self.bloom.target_sizes();
        [self.scene_target.size(), ping0, ping1]
    }

    /// Destroy every offscreen target and recreate it at the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let scene_target = RenderTarget::for_scene(&self.device, "scene", width, height);
        let (width, height) = scene_target.size();
        std::mem::replace(&mut self.scene_target, scene_target).destroy();

        self.bloom.resize(
            &self.device,
            &self.queue,
            width,
            height,
            self.scene_target.color_view(1),
        );
        self.composite_groups = create_composite_groups(
            &self.device,
            &self.composite_layout,
            &self.composite_sampler,
            &self.scene_target,
            &self.bloom,
        );

        self.config.width = width;
        self.config.height = height;
        log::info!("Render targets recreated at {width}x{height}");
    }

    /// Render one frame into `output_view`.
    ///
    /// Parameters are uploaded per program, so each program should appear
    /// in at most one pass per frame.
    pub fn render_frame(&self, camera: &Camera, passes: &[ScenePass<'_>], output_view: &TextureView) {
        let view_proj = camera.view_proj();
        for pass in passes {
            pass.program
                .set_parameters(&self.queue, pass.parameters, view_proj);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        for stage in self.plan.stages() {
            match stage {
                FrameStage::Scene => self.encode_scene(&mut encoder, passes),
                FrameStage::Blur(step) => self.bloom.encode_step(&mut encoder, step, &self.quad),
                FrameStage::Composite { bloom } => {
                    // nothing wrote the target this frame; drop bloom left by an earlier plan
                    if self.plan.blur_iterations() == 0 {
                        self.bloom.clear_target(&mut encoder, *bloom);
                    }
                    self.encode_composite(&mut encoder, *bloom, output_view)
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn encode_scene(&self, encoder: &mut wgpu::CommandEncoder, passes: &[ScenePass<'_>]) {
        let clear = |color| wgpu::Operations {
            load: wgpu::LoadOp::Clear(color),
            store: wgpu::StoreOp::Store,
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: self.scene_target.color_view(0),
                    resolve_target: None,
                    depth_slice: None,
                    ops: clear(self.config.clear_color),
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: self.scene_target.color_view(1),
                    resolve_target: None,
                    depth_slice: None,
                    ops: clear(wgpu::Color::BLACK),
                }),
            ],
            depth_stencil_attachment: self.scene_target.depth_view().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for scene_pass in passes {
            scene_pass
                .program
                .draw(&mut pass, scene_pass.meshes.iter().copied());
        }
    }

    fn encode_composite(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bloom: usize,
        output_view: &TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("composite_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.config.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.composite_pipeline);
        pass.set_bind_group(0, &self.composite_groups[bloom], &[]);
        self.quad.draw(&mut pass);
    }
}

fn create_composite_groups(
    device: &Device,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    scene_target: &RenderTarget,
    bloom: &BloomChain,
) -> [BindGroup; 2] {
    [0, 1].map(|index| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_target.color_view(0)),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom.target_view(index)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RendererConfig::default();
        assert_eq!(config.blur_iterations, 10);
        assert_eq!(config.output_format, TextureFormat::Rgba8Unorm);
    }
}
