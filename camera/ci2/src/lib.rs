pub mod registers;
mod types;

pub use types::{
    BayerTile, CameraInfo, DeviceTimestamp, GigEImageSettings, GigEImageSettingsInfo,
    GigEPropertyType, PixelFormat, Property, PropertyInfo, PropertyType,
};

// ---------------------------
// errors

pub type Result<M> = std::result::Result<M, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Timeout")]
    Timeout,
    #[error("link to camera is down: {0}")]
    LinkDown(String),
    #[error("property {0} not present")]
    PropertyNotPresent(PropertyType),
    #[error("camera not found: {0}")]
    CameraNotFound(String),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
    #[error("CI2Error({msg})")]
    CI2Error { msg: String },
    #[error("BackendError({0})")]
    BackendError(#[from] anyhow::Error),
    #[error("io error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

/// Coarse classification of an [Error].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No frame arrived in time. The camera may still be fine.
    Timeout,
    /// The camera stopped responding or was disconnected.
    LinkDown,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout => ErrorKind::Timeout,
            Error::LinkDown(_) => ErrorKind::LinkDown,
            _ => ErrorKind::Other,
        }
    }
}

fn _test_error_is_send() {
    // Compile-time test to ensure Error implements Send trait.
    fn implements<T: Send>() {}
    implements::<Error>();
}

impl<'a> From<&'a str> for Error {
    fn from(orig: &'a str) -> Error {
        Error::CI2Error {
            msg: orig.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Error {
        Error::CI2Error { msg }
    }
}

// ---------------------------
// CameraModule

/// A module for opening cameras (e.g. FlyCapture2).
pub trait CameraModule: Send {
    type CameraType: Camera;

    fn name(&self) -> &str;
    fn camera_infos(&self) -> Result<Vec<CameraInfo>>;
    fn camera_by_serial(&mut self, serial: u32) -> Result<Self::CameraType>;
    fn camera_by_index(&mut self, index: usize) -> Result<Self::CameraType>;

    /// Make every reachable camera pick a valid IP address for its subnet.
    fn force_all_ip_addresses(&mut self) -> Result<()>;
}

// ---------------------------
// frames

/// Timing information acquired on the host computer.
///
/// This can be considered the "least common denominator" of frame timing
/// information, as it will always be present but is not necessarily as accurate
/// as the timestamp embedded by the camera.
#[derive(Debug, Clone)]
pub struct HostTimingInfo {
    /// The frame number as counted by the host.
    ///
    /// This can deviate from the "real" frame number if the frames were
    /// dropped.
    pub fno: usize,
    /// The timestamp of the frame when it was acquired by the host.
    pub datetime: chrono::DateTime<chrono::Utc>,
}

/// A frame copied out of the camera backend.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Number of bytes per row.
    pub stride: u32,
    pub pixel_format: PixelFormat,
    pub bayer_tile: BayerTile,
    pub data: Vec<u8>,
    /// Present only when the embedded timestamp is enabled.
    pub device_timestamp: Option<DeviceTimestamp>,
    pub host_timing: HostTimingInfo,
}

impl RawFrame {
    /// The bytes of row `y`, without stride padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride as usize;
        let len = self.width as usize * self.pixel_format.bits_per_pixel() as usize / 8;
        &self.data[start..start + len]
    }
}

// ---------------------------
// Camera

/// A connected camera. Dropping it disconnects.
pub trait Camera: Send {
    fn serial(&self) -> u32;
    fn camera_info(&self) -> Result<CameraInfo>;

    // Settings: properties ----------------------------
    fn property_info(&self, property_type: PropertyType) -> Result<PropertyInfo>;
    fn property(&self, property_type: PropertyType) -> Result<Property>;
    fn set_property(&mut self, property: &Property) -> Result<()>;

    // Settings: GigE transport ----------------------------
    fn set_gige_property(&mut self, property_type: GigEPropertyType, value: u32) -> Result<()>;
    fn gige_image_settings_info(&self) -> Result<GigEImageSettingsInfo>;
    fn gige_image_settings(&self) -> Result<GigEImageSettings>;
    fn set_gige_image_settings(&mut self, settings: &GigEImageSettings) -> Result<()>;

    /// Enable or disable the timestamp embedded in each frame.
    fn set_embedded_timestamp(&mut self, on: bool) -> Result<()>;

    // Registers ----------------------------
    fn read_register(&self, address: u32) -> Result<u32>;
    fn write_register(&mut self, address: u32, value: u32) -> Result<()>;
    fn read_gvcp_register(&self, address: u32) -> Result<u32>;
    fn write_gvcp_register(&mut self, address: u32, value: u32, broadcast: bool) -> Result<()>;

    // Acquisition ----------------------------
    fn acquisition_start(&mut self) -> Result<()>;
    fn acquisition_stop(&mut self) -> Result<()>;
    fn is_acquiring(&self) -> bool;

    /// synchronous (blocking) frame acquisition
    fn next_frame(&mut self) -> Result<RawFrame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(Error::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(Error::LinkDown("gone".into()).kind(), ErrorKind::LinkDown);
        assert_eq!(Error::from("boom").kind(), ErrorKind::Other);
        assert_eq!(
            Error::PropertyNotPresent(PropertyType::Gain).to_string(),
            "property Gain not present"
        );
    }

    #[test]
    fn row_skips_padding() {
        let frame = RawFrame {
            width: 2,
            height: 2,
            stride: 4,
            pixel_format: PixelFormat::Mono8,
            bayer_tile: BayerTile::None,
            data: vec![1, 2, 0, 0, 3, 4, 0, 0],
            device_timestamp: None,
            host_timing: HostTimingInfo {
                fno: 0,
                datetime: chrono::Utc::now(),
            },
        };
        assert_eq!(frame.row(0), &[1, 2]);
        assert_eq!(frame.row(1), &[3, 4]);
    }
}
