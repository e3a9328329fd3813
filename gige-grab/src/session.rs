use tracing::{error, info};

use ci2::{Camera, CameraModule};

use crate::Result;

/// A connected camera.
///
/// Dropping the session stops a running capture and disconnects, also when
/// an error cut the work short.
pub struct Session<C: Camera> {
    camera: C,
}

impl<C: Camera> Session<C> {
    pub fn new(camera: C) -> Self {
        Self { camera }
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }
}

impl<C: Camera> Drop for Session<C> {
    fn drop(&mut self) {
        if self.camera.is_acquiring() {
            if let Err(e) = self.camera.acquisition_stop() {
                error!("while stopping capture of {}: {e}", self.camera.serial());
            }
        }
    }
}

/// Connect to the camera with serial number `serial`.
pub fn connect<M: CameraModule>(module: &mut M, serial: u32) -> Result<Session<M::CameraType>> {
    info!("Connecting to camera {serial} using {}", module.name());
    let camera = module.camera_by_serial(serial)?;
    Ok(Session::new(camera))
}

pub fn start_capture<C: Camera>(session: &mut Session<C>) -> Result<()> {
    info!("Starting image capture...");
    session.camera_mut().acquisition_start()?;
    Ok(())
}

/// Stop capture, if running, and disconnect.
pub fn cleanup<C: Camera>(mut session: Session<C>) -> Result<()> {
    info!("Shutting down");
    if session.camera().is_acquiring() {
        session.camera_mut().acquisition_stop()?;
    }
    Ok(())
}
