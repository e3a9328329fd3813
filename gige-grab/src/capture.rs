use std::path::Path;

use tracing::{info, warn};

use ci2::{Camera, RawFrame};

use crate::{Result, Session, convert};

/// Grab one frame and log its embedded timestamp.
pub fn capture_raw<C: Camera>(session: &mut Session<C>) -> Result<RawFrame> {
    info!("Grabbing image");
    let frame = session.camera_mut().next_frame()?;
    match &frame.device_timestamp {
        Some(ts) => info!("Timestamp: {:.3}", ts.as_secs_f64()),
        None => warn!("frame {} has no embedded timestamp", frame.host_timing.fno),
    }
    Ok(frame)
}

/// Grab one frame, convert it to RGB and save it as PNG.
pub fn capture_png<C: Camera, P: AsRef<Path>>(session: &mut Session<C>, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Grabbing image");
    let frame = session.camera_mut().next_frame()?;
    info!("Saving to {}", path.display());
    let rgb = convert::to_rgb8(&frame)?;
    rgb.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
