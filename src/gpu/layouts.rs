//! Bind group layouts for the scene, blur and composite passes.

use wgpu::{BindGroupLayout, BindGroupLayoutEntry, Device, ShaderStages};

/// Builder that numbers bindings in the order they are added.
pub struct BindGroupLayoutBuilder {
    label: &'static str,
    visibility: ShaderStages,
    entries: Vec<BindGroupLayoutEntry>,
}

impl BindGroupLayoutBuilder {
    pub fn new(label: &'static str, visibility: ShaderStages) -> Self {
        Self {
            label,
            visibility,
            entries: Vec::new(),
        }
    }

    fn push(mut self, ty: wgpu::BindingType) -> Self {
        self.entries.push(BindGroupLayoutEntry {
            binding: self.entries.len() as u32,
            visibility: self.visibility,
            ty,
            count: None,
        });
        self
    }

    pub fn uniform(self) -> Self {
        self.push(wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        })
    }

    pub fn texture_2d(self) -> Self {
        self.push(wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        })
    }

    pub fn sampler(self) -> Self {
        self.push(wgpu::BindingType::Sampler(
            wgpu::SamplerBindingType::Filtering,
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(self, device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(self.label),
            entries: &self.entries,
        })
    }
}

/// Program uniforms, read by both shader stages.
pub fn create_program_layout(device: &Device) -> BindGroupLayout {
    BindGroupLayoutBuilder::new(
        "program_bind_group_layout",
        ShaderStages::VERTEX | ShaderStages::FRAGMENT,
    )
    .uniform()
    .build(device)
}

/// Blur direction uniform, source texture, sampler.
pub fn create_blur_layout(device: &Device) -> BindGroupLayout {
    BindGroupLayoutBuilder::new("blur_bind_group_layout", ShaderStages::FRAGMENT)
        .uniform()
        .texture_2d()
        .sampler()
        .build(device)
}

/// Scene texture, blurred bloom texture, sampler.
pub fn create_composite_layout(device: &Device) -> BindGroupLayout {
    BindGroupLayoutBuilder::new("composite_bind_group_layout", ShaderStages::FRAGMENT)
        .texture_2d()
        .texture_2d()
        .sampler()
        .build(device)
}
