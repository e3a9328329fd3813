use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ci2::{PixelFormat, PropertyType, registers::WhiteBalance};

/// The configuration error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
    #[error("TOML deserialization error: {source}")]
    TomlDeError {
        #[from]
        source: toml::de::Error,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// The default value for [CaptureConfig::serial].
pub const DEFAULT_SERIAL: u32 = 16452901;
/// The default value for [CaptureConfig::output].
pub const DEFAULT_OUTPUT: &str = "test.png";
/// The default value for [CaptureConfig::fps_frames].
pub const DEFAULT_FPS_FRAMES: usize = 30;
/// The default value for [GigEConfig::packet_size], in bytes.
pub const DEFAULT_PACKET_SIZE: u32 = 1400;
/// The default value for [GigEConfig::packet_delay].
pub const DEFAULT_PACKET_DELAY: u32 = 1000;
/// The default frame rate in frames per second.
pub const DEFAULT_FRAME_RATE: f32 = 30.0;
/// The default blue component of [WhiteBalanceConfig].
pub const DEFAULT_WB_BLUE: u16 = 800;
/// The default red component of [WhiteBalanceConfig].
pub const DEFAULT_WB_RED: u16 = 550;

fn default_serial() -> u32 {
    DEFAULT_SERIAL
}

fn default_output() -> PathBuf {
    DEFAULT_OUTPUT.into()
}

fn default_fps_frames() -> usize {
    DEFAULT_FPS_FRAMES
}

fn default_packet_size() -> u32 {
    DEFAULT_PACKET_SIZE
}

fn default_packet_delay() -> u32 {
    DEFAULT_PACKET_DELAY
}

fn default_pixel_format() -> PixelFormat {
    PixelFormat::Raw8
}

fn default_wb_blue() -> u16 {
    DEFAULT_WB_BLUE
}

fn default_wb_red() -> u16 {
    DEFAULT_WB_RED
}

fn default_true() -> bool {
    true
}

fn default_properties() -> Vec<PropertySetting> {
    vec![
        PropertySetting {
            property: PropertyType::FrameRate,
            auto: false,
            value: DEFAULT_FRAME_RATE,
        },
        PropertySetting {
            property: PropertyType::AutoExposure,
            auto: true,
            value: 0.0,
        },
        PropertySetting {
            property: PropertyType::Gain,
            auto: true,
            value: 0.0,
        },
    ]
}

/// Everything needed to configure a camera and grab from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    /// Serial number of the camera. Defaults to [DEFAULT_SERIAL].
    #[serde(default = "default_serial")]
    pub serial: u32,
    /// Where the PNG image is written. Defaults to [DEFAULT_OUTPUT].
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Number of frames attempted when measuring the frame rate.
    #[serde(default = "default_fps_frames")]
    pub fps_frames: usize,
    #[serde(default = "default_true")]
    pub embedded_timestamp: bool,
    #[serde(default)]
    pub gige: GigEConfig,
    #[serde(default)]
    pub image: ImageConfig,
    /// Applied in order. A property the camera lacks is skipped.
    #[serde(default = "default_properties")]
    pub properties: Vec<PropertySetting>,
    #[serde(default)]
    pub white_balance: WhiteBalanceConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            serial: default_serial(),
            output: default_output(),
            fps_frames: default_fps_frames(),
            embedded_timestamp: true,
            gige: Default::default(),
            image: Default::default(),
            properties: default_properties(),
            white_balance: Default::default(),
        }
    }
}

/// GigE transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GigEConfig {
    #[serde(default = "default_packet_size")]
    pub packet_size: u32,
    #[serde(default = "default_packet_delay")]
    pub packet_delay: u32,
}

impl Default for GigEConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            packet_delay: DEFAULT_PACKET_DELAY,
        }
    }
}

/// Region of interest and pixel format.
///
/// A missing width or height means the largest the sensor allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    #[serde(default)]
    pub offset_x: u32,
    #[serde(default)]
    pub offset_y: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default = "default_pixel_format")]
    pub pixel_format: PixelFormat,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            width: None,
            height: None,
            pixel_format: default_pixel_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySetting {
    pub property: PropertyType,
    /// Use automatic mode, where the camera supports it.
    pub auto: bool,
    /// Absolute value, ignored in automatic mode.
    #[serde(default)]
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhiteBalanceConfig {
    #[serde(default = "default_wb_blue")]
    pub blue: u16,
    #[serde(default = "default_wb_red")]
    pub red: u16,
    #[serde(default = "default_true")]
    pub on: bool,
    #[serde(default = "default_true")]
    pub auto: bool,
}

impl Default for WhiteBalanceConfig {
    fn default() -> Self {
        Self {
            blue: DEFAULT_WB_BLUE,
            red: DEFAULT_WB_RED,
            on: true,
            auto: true,
        }
    }
}

impl From<&WhiteBalanceConfig> for WhiteBalance {
    fn from(orig: &WhiteBalanceConfig) -> Self {
        WhiteBalance {
            blue: orig.blue,
            red: orig.red,
            on: orig.on,
            auto: orig.auto,
        }
    }
}

/// Parse a `.toml` file and return a [CaptureConfig] structure.
pub fn parse_config_file<P: AsRef<std::path::Path>>(fname: P) -> Result<CaptureConfig> {
    let contents = std::fs::read_to_string(fname.as_ref())?;
    Ok(toml::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: CaptureConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, CaptureConfig::default());
        assert_eq!(cfg.serial, 16452901);
        assert_eq!(cfg.output, PathBuf::from("test.png"));
        assert_eq!(cfg.gige.packet_size, 1400);
        assert_eq!(cfg.gige.packet_delay, 1000);
        assert_eq!(cfg.image.pixel_format, PixelFormat::Raw8);
        assert_eq!(cfg.properties.len(), 3);
        assert_eq!(cfg.properties[0].property, PropertyType::FrameRate);
        assert!(!cfg.properties[0].auto);
        assert_eq!(
            WhiteBalance::from(&cfg.white_balance)
                .register_value()
                .unwrap(),
            0x0332_0226
        );
    }

    #[test]
    fn overrides() {
        let buf = r#"
            serial = 1234
            fps_frames = 5

            [gige]
            packet_size = 9000

            [image]
            width = 320
            pixel_format = "Mono8"

            [[properties]]
            property = "Shutter"
            auto = false
            value = 10.5
        "#;
        let cfg: CaptureConfig = toml::from_str(buf).unwrap();
        assert_eq!(cfg.serial, 1234);
        assert_eq!(cfg.fps_frames, 5);
        assert_eq!(cfg.gige.packet_size, 9000);
        assert_eq!(cfg.gige.packet_delay, DEFAULT_PACKET_DELAY);
        assert_eq!(cfg.image.width, Some(320));
        assert_eq!(cfg.image.height, None);
        assert_eq!(cfg.image.pixel_format, PixelFormat::Mono8);
        assert_eq!(
            cfg.properties,
            vec![PropertySetting {
                property: PropertyType::Shutter,
                auto: false,
                value: 10.5,
            }]
        );
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(toml::from_str::<CaptureConfig>("serail = 1").is_err());
    }
}
