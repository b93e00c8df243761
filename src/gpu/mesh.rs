//! GPU-resident mesh buffers.

use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device};

use crate::geometry::{DrawMode, Mesh};

const VERTEX_LAYOUTS: [wgpu::VertexBufferLayout<'static>; 2] = [
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x4,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: 16,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x4,
        }],
    },
];

/// Immutable upload of a [`Mesh`]: index, position and normal buffers.
pub struct GpuMesh {
    index_buffer: Buffer,
    position_buffer: Buffer,
    normal_buffer: Buffer,
    element_count: u32,
    draw_mode: DrawMode,
}

impl GpuMesh {
    /// Vertex buffer layouts: positions in slot 0, normals in slot 1.
    pub fn vertex_layouts() -> &'static [wgpu::VertexBufferLayout<'static>] {
        &VERTEX_LAYOUTS
    }

    pub fn upload(device: &Device, label: &str, mesh: &Mesh) -> Self {
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_positions")),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normal_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_normals")),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            index_buffer,
            position_buffer,
            normal_buffer,
            element_count: mesh.element_count(),
            draw_mode: mesh.draw_mode,
        }
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// Bind the buffers and issue one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.position_buffer.slice(..));
        pass.set_vertex_buffer(1, self.normal_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.element_count, 0, 0..1);
    }

    /// Release the three buffers.
    pub fn destroy(self) {
        self.index_buffer.destroy();
        self.position_buffer.destroy();
        self.normal_buffer.destroy();
    }
}
