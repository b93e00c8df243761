//! Windowed visualizer: winit event handling around the frame loop.

use std::path::PathBuf;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::audio::{
    load_audio, AudioAnalyser, AudioError, Track, TrackPlayer, WindowAnalyser, DEFAULT_FFT_SIZE,
};
use crate::camera::{Camera, ROTATE_SPEED};
use crate::controls::{ControlAction, Controls};
use crate::frame_loop::{FrameError, FrameInputs, FrameLoop, FrameTarget};
use crate::gpu::{
    FrameRenderer, GpuContext, GpuError, GpuMesh, ProgramKind, RendererConfig, ScenePass,
    ShaderParameters, ShaderProgram,
};
use crate::scene::SceneGeometry;

const SEPARATION_STEP: f32 = 0.05;
const LINE_ZOOM_SPEED: f32 = 0.1;
const PIXEL_ZOOM_SPEED: f32 = 0.002;

/// Startup options for [`VisualizerApp`].
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Music track played by the Play action.
    pub audio: Option<PathBuf>,
    pub controls: Controls,
    pub renderer: RendererConfig,
}

/// Everything that exists only while a window is open.
struct Stage {
    context: GpuContext,
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    renderer: FrameRenderer,
    camera: Camera,
    fire: ShaderProgram,
    line: ShaderProgram,
    inner: Option<GpuMesh>,
    outer: Option<GpuMesh>,
}

impl Stage {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self, GpuError> {
        let (ctx, surface) = pollster::block_on(GpuContext::for_window(Arc::clone(&window)))?;

        let capabilities = surface.get_capabilities(&ctx.adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| {
                GpuError::UnsupportedPlatform("surface reports no texture formats".into())
            })?;

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &surface_config);

        let renderer = FrameRenderer::new(
            &ctx,
            RendererConfig {
                width: surface_config.width,
                height: surface_config.height,
                output_format: format,
                ..config.clone()
            },
        );

        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        camera.set_aspect_ratio(surface_config.width as f32 / surface_config.height as f32);
        camera.update_projection_matrix();

        log::info!(
            "Surface configured: {}x{} {:?}",
            surface_config.width,
            surface_config.height,
            format
        );

        Ok(Self {
            fire: ShaderProgram::new(&ctx.device, ProgramKind::Fire),
            line: ShaderProgram::new(&ctx.device, ProgramKind::Line),
            context: ctx,
            window,
            surface,
            surface_config,
            renderer,
            camera,
            inner: None,
            outer: None,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface
            .configure(&self.context.device, &self.surface_config);
        self.renderer.resize(width, height);
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        self.camera.update_projection_matrix();
    }
}

impl FrameTarget for Stage {
    fn rebuild_scene(&mut self, geometry: &SceneGeometry) -> Result<(), FrameError> {
        let device = &self.context.device;
        let inner = GpuMesh::upload(device, "inner_sphere", &geometry.inner);
        let outer = GpuMesh::upload(device, "outer_sphere", &geometry.outer);

        if let Some(old) = self.inner.replace(inner) {
            old.destroy();
        }
        if let Some(old) = self.outer.replace(outer) {
            old.destroy();
        }
        Ok(())
    }

    fn update_camera(&mut self) {
        self.camera.update();
    }

    fn render(&mut self, parameters: &ShaderParameters) -> Result<(), FrameError> {
        let (Some(inner), Some(outer)) = (&self.inner, &self.outer) else {
            return Ok(());
        };

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost, reconfiguring");
                self.surface
                    .configure(&self.context.device, &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(GpuError::from(e).into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let outer_meshes = [outer];
        let inner_meshes = [inner];
        let passes = [
            ScenePass {
                program: &self.line,
                parameters,
                meshes: &outer_meshes,
            },
            ScenePass {
                program: &self.fire,
                parameters,
                meshes: &inner_meshes,
            },
        ];
        self.renderer.render_frame(&self.camera, &passes, &view);

        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    fn request_next_frame(&mut self) {
        self.window.request_redraw();
    }
}

/// The windowed application.
pub struct VisualizerApp {
    controls: Controls,
    renderer_config: RendererConfig,
    frame_loop: FrameLoop,
    stage: Option<Stage>,
    player: Option<TrackPlayer>,
    analyser: Option<WindowAnalyser<Track>>,
    dragging: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
    fatal: Option<GpuError>,
}

impl VisualizerApp {
    /// Create the app, decoding the audio track up front if one is given.
    pub fn new(options: AppOptions) -> Result<Self, AudioError> {
        let (player, analyser) = match &options.audio {
            Some(path) => {
                let track = Track::from_audio(&load_audio(path)?);
                let analyser = WindowAnalyser::new(track.clone(), DEFAULT_FFT_SIZE);
                (Some(TrackPlayer::new(track)), Some(analyser))
            }
            None => (None, None),
        };

        Ok(Self {
            controls: options.controls.clamped(),
            renderer_config: options.renderer,
            frame_loop: FrameLoop::new(),
            stage: None,
            player,
            analyser,
            dragging: false,
            last_cursor: None,
            fatal: None,
        })
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// The error that closed the event loop, if any.
    pub fn take_fatal_error(&mut self) -> Option<GpuError> {
        self.fatal.take()
    }

    fn apply(&mut self, action: ControlAction) {
        log::debug!("Control action: {action:?}");
        match action {
            ControlAction::LoadScene => self.frame_loop.invalidate_scene(),
            ControlAction::PlayMusic => match &mut self.player {
                Some(player) => {
                    if let Err(e) = player.play() {
                        log::error!("Failed to start playback: {e}");
                    }
                }
                None => log::warn!("No audio track loaded"),
            },
            ControlAction::ResetParameters => {
                self.controls.reset();
                log::info!("Parameters reset");
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyL => self.apply(ControlAction::LoadScene),
            KeyCode::KeyP => self.apply(ControlAction::PlayMusic),
            KeyCode::KeyR => self.apply(ControlAction::ResetParameters),
            KeyCode::ArrowUp => self.controls.adjust_tesselations(1),
            KeyCode::ArrowDown => self.controls.adjust_tesselations(-1),
            KeyCode::ArrowRight => self.controls.adjust_separation(SEPARATION_STEP),
            KeyCode::ArrowLeft => self.controls.adjust_separation(-SEPARATION_STEP),
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        let inputs = FrameInputs {
            controls: &self.controls,
            analyser: self
                .analyser
                .as_mut()
                .map(|analyser| analyser as &mut dyn AudioAnalyser),
        };
        if let Err(e) = self.frame_loop.tick(inputs, stage) {
            log::warn!("Frame {} failed: {e}", self.frame_loop.frame());
        }
    }
}

impl ApplicationHandler for VisualizerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.stage.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Sonosphere")
            .with_inner_size(LogicalSize::new(
                self.renderer_config.width,
                self.renderer_config.height,
            ));

        let stage = event_loop
            .create_window(attributes)
            .map_err(|e| GpuError::UnsupportedPlatform(e.to_string()))
            .and_then(|window| Stage::new(Arc::new(window), &self.renderer_config));

        match stage {
            Ok(stage) => {
                log::info!("Press P to play, L to rebuild, R to reset, ESC to quit");
                stage.window.request_redraw();
                self.stage = Some(stage);
            }
            Err(e) => {
                log::error!("Failed to initialize rendering: {e}");
                self.fatal = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(stage) = self.stage.as_mut() {
                    stage.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        ..
                    },
                ..
            } => self.handle_key(event_loop, code),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let (true, Some(last), Some(stage)) =
                    (self.dragging, self.last_cursor, self.stage.as_mut())
                {
                    let delta = Vec2::new((position.x - last.x) as f32, (position.y - last.y) as f32);
                    stage.camera.rotate(delta * ROTATE_SPEED);
                }
                self.last_cursor = Some(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(stage) = self.stage.as_mut() {
                    let zoom = match delta {
                        MouseScrollDelta::LineDelta(_, y) => -y * LINE_ZOOM_SPEED,
                        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) * PIXEL_ZOOM_SPEED,
                    };
                    stage.camera.zoom(zoom);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}
