use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gige_grab::{Backend, CaptureConfig, config::parse_config_file};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Capture configuration in TOML format
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial number of the camera, overriding the configuration
    #[arg(long)]
    serial: Option<u32>,

    /// Output PNG file, overriding the configuration
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of frames used to measure the frame rate
    #[arg(long)]
    fps_frames: Option<usize>,

    /// Camera backend
    #[arg(long, value_enum, default_value_t)]
    backend: Backend,

    /// Also write log messages to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    gige_grab::logging::init_logging(cli.log_file.as_deref())?;

    let mut cfg = match &cli.config {
        Some(path) => parse_config_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => CaptureConfig::default(),
    };
    if let Some(serial) = cli.serial {
        cfg.serial = serial;
    }
    if let Some(output) = cli.output {
        cfg.output = output;
    }
    if let Some(fps_frames) = cli.fps_frames {
        cfg.fps_frames = fps_frames;
    }

    let report = match cli.backend {
        Backend::Flycap2 => {
            let mut module = ci2_flycap2::new_module()?;
            gige_grab::grab(&mut module, &cfg)
        }
        Backend::Sim => {
            let mut module = ci2_sim::new_module()?;
            gige_grab::grab(&mut module, &cfg)
        }
    }
    .with_context(|| format!("grabbing from camera {} ({})", cfg.serial, cli.backend))?;

    info!(
        "Saved {} ({} raw bytes, {:.1} FPS)",
        report.png.display(),
        report.raw_bytes,
        report.fps.fps()
    );
    Ok(())
}
