//! Offscreen render targets.

use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

use super::context::GpuError;

/// Format of the scene and blur colour attachments.
pub const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
/// Format of the scene depth attachment.
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// A texture that owns its view.
struct Attachment {
    texture: Texture,
    view: TextureView,
}

impl Attachment {
    fn new(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Colour attachments (at most two) plus an optional depth attachment,
/// all of one size.
///
/// Targets are never resized in place: a size change destroys the target
/// and builds a new one.
pub struct RenderTarget {
    width: u32,
    height: u32,
    colors: Vec<Attachment>,
    depth: Option<Attachment>,
}

impl RenderTarget {
    /// Create a target with one colour attachment per entry of `formats`.
    pub fn new(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        formats: &[TextureFormat],
        depth: Option<TextureFormat>,
        usage: TextureUsages,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let colors = formats
            .iter()
            .enumerate()
            .map(|(i, &format)| {
                Attachment::new(
                    device,
                    &format!("{label}_color{i}"),
                    width,
                    height,
                    format,
                    usage,
                )
            })
            .collect();
        let depth = depth.map(|format| {
            Attachment::new(
                device,
                &format!("{label}_depth"),
                width,
                height,
                format,
                TextureUsages::RENDER_ATTACHMENT,
            )
        });

        log::debug!("Created render target {label} at {width}x{height}");
        Self {
            width,
            height,
            colors,
            depth,
        }
    }

    /// Scene target: full colour and bright-pass attachments plus depth.
    pub fn for_scene(device: &Device, label: &str, width: u32, height: u32) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            &[COLOR_FORMAT, COLOR_FORMAT],
            Some(DEPTH_FORMAT),
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        )
    }

    /// Single sampled colour attachment, used by the blur ping-pong.
    pub fn for_blur(device: &Device, label: &str, width: u32, height: u32) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            &[COLOR_FORMAT],
            None,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        )
    }

    /// Final output that can be copied back to the CPU.
    pub fn for_output(
        device: &Device,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self::new(
            device,
            label,
            width,
            height,
            &[format],
            None,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
        )
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    /// View of colour attachment `index`.
    ///
    /// # Panics
    ///
    /// Panics if the target has no such attachment.
    pub fn color_view(&self, index: usize) -> &TextureView {
        &self.colors[index].view
    }

    pub fn color_texture(&self, index: usize) -> &Texture {
        &self.colors[index].texture
    }

    pub fn depth_view(&self) -> Option<&TextureView> {
        self.depth.as_ref().map(|d| &d.view)
    }

    /// Release the GPU memory of every attachment.
    pub fn destroy(self) {
        for attachment in self.colors.iter().chain(self.depth.iter()) {
            attachment.texture.destroy();
        }
    }
}

/// Readback buffer for copying an RGBA8 texture to the CPU.
pub struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_row_bytes: u32,
    unpadded_row_bytes: u32,
}

impl ReadbackBuffer {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let unpadded_row_bytes = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row_bytes = unpadded_row_bytes.div_ceil(align) * align;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: (padded_row_bytes * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            width,
            height,
            padded_row_bytes,
            unpadded_row_bytes,
        }
    }

    pub fn padded_row_bytes(&self) -> u32 {
        self.padded_row_bytes
    }

    /// Record a copy of `texture` into this buffer.
    pub fn copy_from(&self, encoder: &mut wgpu::CommandEncoder, texture: &Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row_bytes),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Map the buffer and return tightly packed pixels.
    pub fn read_pixels(&self, device: &Device) -> Result<Vec<u8>, GpuError> {
        let slice = self.buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| GpuError::Readback(e.to_string()))?
            .map_err(|e| GpuError::Readback(e.to_string()))?;

        let pixels = {
            let data = slice.get_mapped_range();
            let mut pixels = Vec::with_capacity((self.width * self.height * 4) as usize);
            for row in 0..self.height {
                let start = (row * self.padded_row_bytes) as usize;
                pixels.extend_from_slice(&data[start..start + self.unpadded_row_bytes as usize]);
            }
            pixels
        };
        self.buffer.unmap();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[tokio::test]
    async fn test_scene_target_has_two_colors_and_depth() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let target = RenderTarget::for_scene(&ctx.device, "test", 64, 32);
        assert_eq!(target.size(), (64, 32));
        assert_eq!(target.color_count(), 2);
        assert!(target.depth_view().is_some());
        target.destroy();
    }

    #[tokio::test]
    async fn test_zero_size_is_clamped() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let target = RenderTarget::for_blur(&ctx.device, "test", 0, 0);
        assert_eq!(target.size(), (1, 1));
        assert!(target.depth_view().is_none());
    }

    #[tokio::test]
    async fn test_readback_buffer_padding() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let buffer = ReadbackBuffer::new(&ctx.device, 10, 4);
        assert_eq!(buffer.padded_row_bytes() % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
        assert!(buffer.padded_row_bytes() >= 40);
    }
}
