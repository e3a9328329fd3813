//! Configure a GigE camera, grab frames, measure the frame rate and save a
//! PNG image.
//!
//! The work is done through the [ci2] camera interface so the same code runs
//! against FlyCapture2 cameras ([ci2_flycap2]) and the simulated camera
//! ([ci2_sim]).
use std::path::PathBuf;

use tracing::info;

use ci2::{CameraModule, DeviceTimestamp};

pub mod capture;
pub mod config;
pub mod configure;
pub mod convert;
pub mod fps;
pub mod ip_config;
pub mod logging;
pub mod session;

pub use capture::{capture_png, capture_raw};
pub use config::CaptureConfig;
pub use configure::configure;
pub use fps::{FpsReport, measure_fps};
pub use session::{Session, cleanup, connect, start_capture};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("camera error: {source}")]
    Camera {
        #[from]
        source: ci2::Error,
    },
    #[error("image error: {source}")]
    Image {
        #[from]
        source: image::ImageError,
    },
    #[error("invalid frame: {msg}")]
    InvalidFrame { msg: String },
    #[error("demosaic failed: {0:?}")]
    Bayer(bayer::BayerError),
}

impl From<bayer::BayerError> for Error {
    fn from(orig: bayer::BayerError) -> Error {
        Error::Bayer(orig)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Camera backend selectable from the command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// FlyCapture2 GigE cameras
    #[default]
    Flycap2,
    /// in-process simulated camera
    Sim,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Backend::Flycap2 => "flycap2",
            Backend::Sim => "sim",
        };
        write!(f, "{s}")
    }
}

/// Summary of a [grab] run.
#[derive(Debug, Clone)]
pub struct GrabReport {
    /// Size of the raw frame.
    pub raw_bytes: usize,
    pub timestamp: Option<DeviceTimestamp>,
    pub png: PathBuf,
    pub fps: FpsReport,
}

/// Connect, configure, grab a raw frame and a PNG, measure the frame rate
/// and disconnect.
pub fn grab<M: CameraModule>(module: &mut M, cfg: &CaptureConfig) -> Result<GrabReport> {
    let mut session = connect(module, cfg.serial)?;
    configure(&mut session, cfg)?;
    start_capture(&mut session)?;

    let frame = capture_raw(&mut session)?;
    info!("Raw data contains {} bytes", frame.data.len());

    capture_png(&mut session, &cfg.output)?;
    let fps = measure_fps(&mut session, cfg.fps_frames)?;
    cleanup(session)?;

    Ok(GrabReport {
        raw_bytes: frame.data.len(),
        timestamp: frame.device_timestamp,
        png: cfg.output.clone(),
        fps,
    })
}
