//! Sonosphere: an audio-reactive noise sphere with bloom.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use winit::event_loop::EventLoop;

use sonosphere::app::{AppOptions, VisualizerApp};
use sonosphere::controls::Controls;
use sonosphere::gpu::{RendererConfig, DEFAULT_BLUR_ITERATIONS};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "sonosphere")]
#[command(about = "Audio-reactive noise sphere visualizer", long_about = None)]
struct Args {
    /// Music track to play (WAV, MP3, FLAC, AAC)
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,

    /// JSON file with initial control values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Gaussian blur passes applied to the bright texture
    #[arg(long, value_name = "N", default_value_t = DEFAULT_BLUR_ITERATIONS)]
    blur_passes: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let controls = match &args.config {
        Some(path) => Controls::load(path)
            .with_context(|| format!("Failed to load controls from {}", path.display()))?,
        None => Controls::default(),
    };

    let options = AppOptions {
        audio: args.audio,
        controls,
        renderer: RendererConfig {
            width: args.width,
            height: args.height,
            blur_iterations: args.blur_passes,
            ..RendererConfig::default()
        },
    };

    let mut app = VisualizerApp::new(options).context("Failed to load audio track")?;
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop
        .run_app(&mut app)
        .context("Event loop terminated abnormally")?;

    if let Some(err) = app.take_fatal_error() {
        return Err(err).context("Rendering could not start");
    }
    Ok(())
}
