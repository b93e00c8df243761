//! Separable Gaussian blur of the bright-pass attachment.
//!
//! Two ping-pong targets are alternately written by a one-dimensional blur.
//! Target 1 always blurs horizontally and target 0 vertically, so each
//! target keeps a fixed direction uniform and every (source, target) pair
//! has a bind group built once per size.

use wgpu::{
    BindGroup, BindGroupLayout, Buffer, Device, Queue, RenderPipeline, Sampler, TextureView,
};

use super::frame_graph::{BloomSource, BlurStep};
use super::layouts::create_blur_layout;
use super::mesh::GpuMesh;
use super::pipelines::{create_pipeline_layout, create_shader, RenderPipelineBuilder};
use super::textures::{RenderTarget, COLOR_FORMAT};

/// Uniform data for one blur direction.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniforms {
    horizontal: u32,
    _padding: u32,
    texel_size: [f32; 2],
}

/// Ping-pong blur targets and the pipeline that fills them.
pub struct BloomChain {
    pipeline: RenderPipeline,
    layout: BindGroupLayout,
    sampler: Sampler,
    direction_buffers: [Buffer; 2],
    targets: [RenderTarget; 2],
    // indexed by the target being written
    from_bright: [BindGroup; 2],
    from_ping: [BindGroup; 2],
}

impl BloomChain {
    pub fn new(
        device: &Device,
        queue: &Queue,
        width: u32,
        height: u32,
        bright_view: &TextureView,
    ) -> Self {
        let shader = create_shader(device, "blur_shader", include_str!("shaders/blur.wgsl"));
        let layout = create_blur_layout(device);
        let pipeline_layout = create_pipeline_layout(device, "blur_pipeline_layout", &[&layout]);
        let pipeline = RenderPipelineBuilder::new("blur_pipeline", &shader)
            .layout(&pipeline_layout)
            .vertex_buffers(GpuMesh::vertex_layouts())
            .target(COLOR_FORMAT)
            .build(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blur_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let direction_buffers = [0, 1].map(|target| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(if target == 1 {
                    "blur_uniforms_horizontal"
                } else {
                    "blur_uniforms_vertical"
                }),
                size: std::mem::size_of::<BlurUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let targets = create_targets(device, width, height);
        let (from_bright, from_ping) =
            create_bind_groups(device, &layout, &sampler, &direction_buffers, &targets, bright_view);

        let chain = Self {
            pipeline,
            layout,
            sampler,
            direction_buffers,
            targets,
            from_bright,
            from_ping,
        };
        chain.write_uniforms(queue);
        chain
    }

    /// Destroy both targets and rebuild them at the new size.
    ///
    /// `bright_view` must be the bright-pass view of the scene target
    /// recreated at the same size.
    pub fn resize(
        &mut self,
        device: &Device,
        queue: &Queue,
        width: u32,
        height: u32,
        bright_view: &TextureView,
    ) {
        let old = std::mem::replace(&mut self.targets, create_targets(device, width, height));
        for target in old {
            target.destroy();
        }

        let (from_bright, from_ping) = create_bind_groups(
            device,
            &self.layout,
            &self.sampler,
            &self.direction_buffers,
            &self.targets,
            bright_view,
        );
        self.from_bright = from_bright;
        self.from_ping = from_ping;
        self.write_uniforms(queue);
    }

    fn write_uniforms(&self, queue: &Queue) {
        let (width, height) = self.targets[0].size();
        for (target, buffer) in self.direction_buffers.iter().enumerate() {
            let uniforms = BlurUniforms {
                horizontal: (target == 1) as u32,
                _padding: 0,
                texel_size: [1.0 / width as f32, 1.0 / height as f32],
            };
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
        }
    }

    /// Record one blur iteration.
    pub fn encode_step(&self, encoder: &mut wgpu::CommandEncoder, step: &BlurStep, quad: &GpuMesh) {
        let bind_group = match step.source {
            BloomSource::Bright => &self.from_bright[step.target],
            BloomSource::Ping(_) => &self.from_ping[step.target],
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blur_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.targets[step.target].color_view(0),
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        quad.draw(&mut pass);
    }

    /// Record a pass that only clears target `index` to black.
    pub fn clear_target(&self, encoder: &mut wgpu::CommandEncoder, index: usize) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blur_clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.targets[index].color_view(0),
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    pub fn target_view(&self, index: usize) -> &TextureView {
        self.targets[index].color_view(0)
    }

    pub fn target_sizes(&self) -> [(u32, u32); 2] {
        [self.targets[0].size(), self.targets[1].size()]
    }
}

fn create_targets(device: &Device, width: u32, height: u32) -> [RenderTarget; 2] {
    [
        RenderTarget::for_blur(device, "blur_ping0", width, height),
        RenderTarget::for_blur(device, "blur_ping1", width, height),
    ]
}

fn create_bind_groups(
    device: &Device,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    direction_buffers: &[Buffer; 2],
    targets: &[RenderTarget; 2],
    bright_view: &TextureView,
) -> ([BindGroup; 2], [BindGroup; 2]) {
    let bind = |target: usize, source: &TextureView| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blur_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: direction_buffers[target].as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    };

    let from_bright = [0, 1].map(|target| bind(target, bright_view));
    let from_ping = [0, 1].map(|target| bind(target, targets[1 - target].color_view(0)));
    (from_bright, from_ping)
}
