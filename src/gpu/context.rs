//! GPU device acquisition.

use std::sync::Arc;
use wgpu::{Adapter, Device, Instance, Queue};

/// Errors that can occur during GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("Failed to acquire frame: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("Readback failed: {0}")]
    Readback(String),
}

/// Simultaneous colour attachments needed by the scene pass.
pub const REQUIRED_COLOR_ATTACHMENTS: u32 = 2;

/// Device and queue shared by every renderer component.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a context without a presentation surface.
    pub async fn new() -> Result<Self, GpuError> {
        Self::request(create_instance(), None).await
    }

    /// Create a context able to present to `window`, returning the surface
    /// alongside it.
    pub async fn for_window(
        window: Arc<winit::window::Window>,
    ) -> Result<(Self, wgpu::Surface<'static>), GpuError> {
        let instance = create_instance();
        let surface = instance.create_surface(window)?;
        let ctx = Self::request(instance, Some(&surface)).await?;
        Ok((ctx, surface))
    }

    async fn request(
        instance: Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: surface,
            })
            .await
            .map_err(|e| GpuError::UnsupportedPlatform(e.to_string()))?;

        let limits = adapter.limits();
        if limits.max_color_attachments < REQUIRED_COLOR_ATTACHMENTS {
            return Err(GpuError::UnsupportedPlatform(format!(
                "adapter supports {} colour attachments, {} required",
                limits.max_color_attachments, REQUIRED_COLOR_ATTACHMENTS
            )));
        }

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sonosphere"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(limits),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}

fn create_instance() -> Instance {
    Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gpu_context_creation() {
        // May fail on CI without GPU
        if let Ok(ctx) = GpuContext::new().await {
            assert!(ctx.device.limits().max_color_attachments >= REQUIRED_COLOR_ATTACHMENTS);
        }
    }
}
