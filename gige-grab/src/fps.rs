use std::time::{Duration, Instant};

use tracing::{debug, info};

use ci2::{Camera, ErrorKind};

use crate::{Result, Session};

/// Outcome of [measure_fps].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FpsReport {
    pub ok: usize,
    pub timeouts: usize,
    pub link_down: usize,
    pub other: usize,
    pub elapsed: Duration,
}

impl FpsReport {
    pub fn failed(&self) -> usize {
        self.timeouts + self.link_down + self.other
    }

    /// Successfully retrieved frames per second.
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.ok as f64 / secs
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for FpsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OK: {} Failed: {} FPS: {:.1}",
            self.ok,
            self.failed(),
            self.fps()
        )
    }
}

/// Time `n_frames` retrievals after one warm-up frame.
///
/// Failed retrievals are counted by kind and do not stop the measurement. A
/// failure of the warm-up frame is returned as an error.
pub fn measure_fps<C: Camera>(session: &mut Session<C>, n_frames: usize) -> Result<FpsReport> {
    info!("Measuring FPS");
    let camera = session.camera_mut();
    camera.next_frame()?;

    let mut report = FpsReport::default();
    let start = Instant::now();
    for _ in 0..n_frames {
        match camera.next_frame() {
            Ok(_) => report.ok += 1,
            Err(e) => {
                debug!("frame retrieval failed: {e}");
                match e.kind() {
                    ErrorKind::Timeout => report.timeouts += 1,
                    ErrorKind::LinkDown => report.link_down += 1,
                    ErrorKind::Other => report.other += 1,
                }
            }
        }
    }
    report.elapsed = start.elapsed();
    if report.timeouts + report.link_down + report.other > 0 {
        info!(
            "timeouts: {} link down: {} other: {}",
            report.timeouts, report.link_down, report.other
        );
    }
    info!("{report}");
    Ok(report)
}
