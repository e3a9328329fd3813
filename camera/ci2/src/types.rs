use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// A configurable camera parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Brightness,
    AutoExposure,
    Sharpness,
    WhiteBalance,
    Hue,
    Saturation,
    Gamma,
    Iris,
    Focus,
    Zoom,
    Pan,
    Tilt,
    Shutter,
    Gain,
    TriggerMode,
    TriggerDelay,
    FrameRate,
    Temperature,
}

impl PropertyType {
    pub const ALL: [PropertyType; 18] = [
        PropertyType::Brightness,
        PropertyType::AutoExposure,
        PropertyType::Sharpness,
        PropertyType::WhiteBalance,
        PropertyType::Hue,
        PropertyType::Saturation,
        PropertyType::Gamma,
        PropertyType::Iris,
        PropertyType::Focus,
        PropertyType::Zoom,
        PropertyType::Pan,
        PropertyType::Tilt,
        PropertyType::Shutter,
        PropertyType::Gain,
        PropertyType::TriggerMode,
        PropertyType::TriggerDelay,
        PropertyType::FrameRate,
        PropertyType::Temperature,
    ];
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Capabilities of a property as reported by the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub property_type: PropertyType,
    pub present: bool,
    pub auto_supported: bool,
    pub manual_supported: bool,
    pub on_off_supported: bool,
    pub one_push_supported: bool,
    pub abs_val_supported: bool,
    pub read_out_supported: bool,
    pub min: u32,
    pub max: u32,
    pub abs_min: f32,
    pub abs_max: f32,
    pub units: String,
    pub unit_abbr: String,
}

impl PropertyInfo {
    /// Info for a property the camera does not have.
    pub fn not_present(property_type: PropertyType) -> Self {
        Self {
            property_type,
            present: false,
            auto_supported: false,
            manual_supported: false,
            on_off_supported: false,
            one_push_supported: false,
            abs_val_supported: false,
            read_out_supported: false,
            min: 0,
            max: 0,
            abs_min: 0.0,
            abs_max: 0.0,
            units: String::new(),
            unit_abbr: String::new(),
        }
    }
}

/// The state of a property, as read from or written to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property {
    pub property_type: PropertyType,
    pub present: bool,
    pub abs_control: bool,
    pub one_push: bool,
    pub on_off: bool,
    pub auto_manual_mode: bool,
    pub value_a: u32,
    pub value_b: u32,
    pub abs_value: f32,
}

impl Property {
    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            present: false,
            abs_control: false,
            one_push: false,
            on_off: false,
            auto_manual_mode: false,
            value_a: 0,
            value_b: 0,
            abs_value: 0.0,
        }
    }
}

/// Transport-level settings of a GigE camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GigEPropertyType {
    Heartbeat,
    HeartbeatTimeout,
    PacketSize,
    PacketDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Mono8,
    Mono16,
    Raw8,
    Raw16,
    Rgb8,
    Bgr8,
}

impl PixelFormat {
    pub fn bits_per_pixel(&self) -> u8 {
        use PixelFormat::*;
        match self {
            Mono8 | Raw8 => 8,
            Mono16 | Raw16 => 16,
            Rgb8 | Bgr8 => 24,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Arrangement of the color filter array over a raw sensor.
///
/// The name gives the colors of the top-left 2x2 tile, row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BayerTile {
    #[default]
    None,
    RGGB,
    GRBG,
    GBRG,
    BGGR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GigEImageSettingsInfo {
    pub max_width: u32,
    pub max_height: u32,
    pub offset_h_step_size: u32,
    pub offset_v_step_size: u32,
    pub image_h_step_size: u32,
    pub image_v_step_size: u32,
    /// Bitfield of the vendor pixel format codes the camera supports.
    pub pixel_format_bit_field: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GigEImageSettings {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

/// Timestamp embedded in a frame by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceTimestamp {
    pub seconds: i64,
    pub micro_seconds: u32,
    pub cycle_seconds: u32,
    pub cycle_count: u32,
    pub cycle_offset: u32,
}

impl DeviceTimestamp {
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.micro_seconds as f64 / 1e6
    }
}

/// Identification and network information of a camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    pub serial: u32,
    pub model: String,
    pub vendor: String,
    pub sensor_info: String,
    pub sensor_resolution: String,
    pub is_color: bool,
    pub firmware_version: String,
    pub ip_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub default_gateway: Ipv4Addr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_seconds() {
        let ts = DeviceTimestamp {
            seconds: 12,
            micro_seconds: 345_678,
            ..Default::default()
        };
        assert!((ts.as_secs_f64() - 12.345678).abs() < 1e-9);
        assert_eq!(format!("{:.3}", ts.as_secs_f64()), "12.346");
    }

    #[test]
    fn bits_per_pixel() {
        assert_eq!(PixelFormat::Raw8.bits_per_pixel(), 8);
        assert_eq!(PixelFormat::Mono16.bits_per_pixel(), 16);
        assert_eq!(PixelFormat::Bgr8.bits_per_pixel(), 24);
    }
}
