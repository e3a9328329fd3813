//! Raw declarations for the subset of the FlyCapture2 C API used to drive
//! GigE cameras.
//!
//! Nothing here links against the vendor library at build time. Call
//! [FlyCapture2C::new] with the path of `libflycapture-c` (or
//! `FlyCapture2_C.dll`) to resolve the function pointers at runtime.
#![allow(non_snake_case, non_camel_case_types, non_upper_case_globals)]

use std::os::raw::{c_char, c_float, c_int, c_uchar, c_uint, c_ushort, c_void};

mod load;

pub use load::FlyCapture2C;

pub type BOOL = c_int;
pub type fc2Context = *mut c_void;
pub type fc2ImageImpl = *mut c_void;

pub const MAX_STRING_LENGTH: usize = 512;

/// Default name of the shared library on this platform.
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAME: &str = "FlyCapture2_C.dll";
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_LIBRARY_NAME: &str = "libflycapture-c.so.2";

pub mod _fc2Error {
    pub type Type = std::os::raw::c_int;
    pub const FC2_ERROR_UNDEFINED: Type = -1;
    pub const FC2_ERROR_OK: Type = 0;
    pub const FC2_ERROR_FAILED: Type = 1;
    pub const FC2_ERROR_NOT_IMPLEMENTED: Type = 2;
    pub const FC2_ERROR_FAILED_BUS_MASTER_CONNECTION: Type = 3;
    pub const FC2_ERROR_NOT_CONNECTED: Type = 4;
    pub const FC2_ERROR_INIT_FAILED: Type = 5;
    pub const FC2_ERROR_NOT_INTITIALIZED: Type = 6;
    pub const FC2_ERROR_INVALID_PARAMETER: Type = 7;
    pub const FC2_ERROR_INVALID_SETTINGS: Type = 8;
    pub const FC2_ERROR_INVALID_BUS_MANAGER: Type = 9;
    pub const FC2_ERROR_MEMORY_ALLOCATION_FAILED: Type = 10;
    pub const FC2_ERROR_LOW_LEVEL_FAILURE: Type = 11;
    pub const FC2_ERROR_NOT_FOUND: Type = 12;
    pub const FC2_ERROR_FAILED_GUID: Type = 13;
    pub const FC2_ERROR_INVALID_PACKET_SIZE: Type = 14;
    pub const FC2_ERROR_INVALID_MODE: Type = 15;
    pub const FC2_ERROR_NOT_IN_FORMAT7: Type = 16;
    pub const FC2_ERROR_NOT_SUPPORTED: Type = 17;
    pub const FC2_ERROR_TIMEOUT: Type = 18;
    pub const FC2_ERROR_BUS_MASTER_FAILED: Type = 19;
    pub const FC2_ERROR_INVALID_GENERATION: Type = 20;
    pub const FC2_ERROR_LUT_FAILED: Type = 21;
    pub const FC2_ERROR_IIDC_FAILED: Type = 22;
    pub const FC2_ERROR_STROBE_FAILED: Type = 23;
    pub const FC2_ERROR_TRIGGER_FAILED: Type = 24;
    pub const FC2_ERROR_PROPERTY_FAILED: Type = 25;
    pub const FC2_ERROR_PROPERTY_NOT_PRESENT: Type = 26;
    pub const FC2_ERROR_REGISTER_FAILED: Type = 27;
    pub const FC2_ERROR_READ_REGISTER_FAILED: Type = 28;
    pub const FC2_ERROR_WRITE_REGISTER_FAILED: Type = 29;
    pub const FC2_ERROR_ISOCH_FAILED: Type = 30;
    pub const FC2_ERROR_ISOCH_ALREADY_STARTED: Type = 31;
    pub const FC2_ERROR_ISOCH_NOT_STARTED: Type = 32;
    pub const FC2_ERROR_ISOCH_START_FAILED: Type = 33;
    pub const FC2_ERROR_ISOCH_RETRIEVE_BUFFER_FAILED: Type = 34;
    pub const FC2_ERROR_ISOCH_STOP_FAILED: Type = 35;
    pub const FC2_ERROR_ISOCH_SYNC_FAILED: Type = 36;
    pub const FC2_ERROR_ISOCH_BANDWIDTH_EXCEEDED: Type = 37;
    pub const FC2_ERROR_IMAGE_CONVERSION_FAILED: Type = 38;
    pub const FC2_ERROR_IMAGE_LIBRARY_FAILURE: Type = 39;
    pub const FC2_ERROR_BUFFER_TOO_SMALL: Type = 40;
    pub const FC2_ERROR_IMAGE_CONSISTENCY_ERROR: Type = 41;
    pub const FC2_ERROR_INCOMPATIBLE_DRIVER: Type = 42;
}
pub type fc2Error = _fc2Error::Type;

pub mod _fc2PropertyType {
    pub type Type = std::os::raw::c_int;
    pub const FC2_BRIGHTNESS: Type = 0;
    pub const FC2_AUTO_EXPOSURE: Type = 1;
    pub const FC2_SHARPNESS: Type = 2;
    pub const FC2_WHITE_BALANCE: Type = 3;
    pub const FC2_HUE: Type = 4;
    pub const FC2_SATURATION: Type = 5;
    pub const FC2_GAMMA: Type = 6;
    pub const FC2_IRIS: Type = 7;
    pub const FC2_FOCUS: Type = 8;
    pub const FC2_ZOOM: Type = 9;
    pub const FC2_PAN: Type = 10;
    pub const FC2_TILT: Type = 11;
    pub const FC2_SHUTTER: Type = 12;
    pub const FC2_GAIN: Type = 13;
    pub const FC2_TRIGGER_MODE: Type = 14;
    pub const FC2_TRIGGER_DELAY: Type = 15;
    pub const FC2_FRAME_RATE: Type = 16;
    pub const FC2_TEMPERATURE: Type = 17;
    pub const FC2_UNSPECIFIED_PROPERTY_TYPE: Type = 18;
}
pub type fc2PropertyType = _fc2PropertyType::Type;

pub mod _fc2GigEPropertyType {
    pub type Type = std::os::raw::c_int;
    pub const FC2_HEARTBEAT: Type = 0;
    pub const FC2_HEARTBEAT_TIMEOUT: Type = 1;
    pub const PACKET_SIZE: Type = 2;
    pub const PACKET_DELAY: Type = 3;
}
pub type fc2GigEPropertyType = _fc2GigEPropertyType::Type;

pub mod _fc2PixelFormat {
    pub type Type = std::os::raw::c_uint;
    pub const FC2_PIXEL_FORMAT_MONO8: Type = 0x8000_0000;
    pub const FC2_PIXEL_FORMAT_411YUV8: Type = 0x4000_0000;
    pub const FC2_PIXEL_FORMAT_422YUV8: Type = 0x2000_0000;
    pub const FC2_PIXEL_FORMAT_444YUV8: Type = 0x1000_0000;
    pub const FC2_PIXEL_FORMAT_RGB8: Type = 0x0800_0000;
    pub const FC2_PIXEL_FORMAT_MONO16: Type = 0x0400_0000;
    pub const FC2_PIXEL_FORMAT_RGB16: Type = 0x0200_0000;
    pub const FC2_PIXEL_FORMAT_S_MONO16: Type = 0x0100_0000;
    pub const FC2_PIXEL_FORMAT_S_RGB16: Type = 0x0080_0000;
    pub const FC2_PIXEL_FORMAT_RAW8: Type = 0x0040_0000;
    pub const FC2_PIXEL_FORMAT_RAW16: Type = 0x0020_0000;
    pub const FC2_PIXEL_FORMAT_MONO12: Type = 0x0010_0000;
    pub const FC2_PIXEL_FORMAT_RAW12: Type = 0x0008_0000;
    pub const FC2_PIXEL_FORMAT_BGR: Type = 0x8000_0008;
    pub const FC2_PIXEL_FORMAT_BGRU: Type = 0x4000_0008;
    pub const FC2_PIXEL_FORMAT_RGB: Type = FC2_PIXEL_FORMAT_RGB8;
    pub const FC2_PIXEL_FORMAT_RGBU: Type = 0x4000_0002;
    pub const FC2_UNSPECIFIED_PIXEL_FORMAT: Type = 0;
}
pub type fc2PixelFormat = _fc2PixelFormat::Type;

pub mod _fc2BayerTileFormat {
    pub type Type = std::os::raw::c_int;
    pub const FC2_BT_NONE: Type = 0;
    pub const FC2_BT_RGGB: Type = 1;
    pub const FC2_BT_GRBG: Type = 2;
    pub const FC2_BT_GBRG: Type = 3;
    pub const FC2_BT_BGGR: Type = 4;
}
pub type fc2BayerTileFormat = _fc2BayerTileFormat::Type;

// The following enums are only ever stored in structs filled by the library.
pub type fc2InterfaceType = c_int;
pub type fc2DriverType = c_int;
pub type fc2BusSpeed = c_int;
pub type fc2PCIeBusSpeed = c_int;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct fc2PGRGuid {
    pub value: [c_uint; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2IPAddress {
    pub octets: [c_uchar; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2MACAddress {
    pub octets: [c_uchar; 6],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct fc2ConfigROM {
    pub nodeVendorId: c_uint,
    pub chipIdHi: c_uint,
    pub chipIdLo: c_uint,
    pub unitSpecId: c_uint,
    pub unitSWVer: c_uint,
    pub unitSubSWVer: c_uint,
    pub vendorUniqueInfo_0: c_uint,
    pub vendorUniqueInfo_1: c_uint,
    pub vendorUniqueInfo_2: c_uint,
    pub vendorUniqueInfo_3: c_uint,
    pub pszKeyword: [c_char; MAX_STRING_LENGTH],
    pub reserved: [c_uint; 16],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct fc2CameraInfo {
    pub serialNumber: c_uint,
    pub interfaceType: fc2InterfaceType,
    pub driverType: fc2DriverType,
    pub isColorCamera: BOOL,
    pub modelName: [c_char; MAX_STRING_LENGTH],
    pub vendorName: [c_char; MAX_STRING_LENGTH],
    pub sensorInfo: [c_char; MAX_STRING_LENGTH],
    pub sensorResolution: [c_char; MAX_STRING_LENGTH],
    pub driverName: [c_char; MAX_STRING_LENGTH],
    pub firmwareVersion: [c_char; MAX_STRING_LENGTH],
    pub firmwareBuildTime: [c_char; MAX_STRING_LENGTH],
    pub maximumBusSpeed: fc2BusSpeed,
    pub pcieBusSpeed: fc2PCIeBusSpeed,
    pub bayerTileFormat: fc2BayerTileFormat,
    pub busNumber: c_ushort,
    pub nodeNumber: c_ushort,
    pub iidcVer: c_uint,
    pub configROM: fc2ConfigROM,
    pub gigEMajorVersion: c_uint,
    pub gigEMinorVersion: c_uint,
    pub userDefinedName: [c_char; MAX_STRING_LENGTH],
    pub xmlURL1: [c_char; MAX_STRING_LENGTH],
    pub xmlURL2: [c_char; MAX_STRING_LENGTH],
    pub macAddress: fc2MACAddress,
    pub ipAddress: fc2IPAddress,
    pub subnetMask: fc2IPAddress,
    pub defaultGateway: fc2IPAddress,
    pub ccpStatus: c_uint,
    pub applicationIPAddress: c_uint,
    pub applicationPort: c_uint,
    pub reserved: [c_uint; 16],
}

impl Default for fc2CameraInfo {
    fn default() -> Self {
        // All-zero is a valid bit pattern for every field.
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct fc2PropertyInfo {
    /// In C, this field is named `type`.
    pub type_: fc2PropertyType,
    pub present: BOOL,
    pub autoSupported: BOOL,
    pub manualSupported: BOOL,
    pub onOffSupported: BOOL,
    pub onePushSupported: BOOL,
    pub absValSupported: BOOL,
    pub readOutSupported: BOOL,
    pub min: c_uint,
    pub max: c_uint,
    pub absMin: c_float,
    pub absMax: c_float,
    pub pUnits: [c_char; MAX_STRING_LENGTH],
    pub pUnitAbbr: [c_char; MAX_STRING_LENGTH],
    pub reserved: [c_uint; 8],
}

impl fc2PropertyInfo {
    pub fn for_type(type_: fc2PropertyType) -> Self {
        let mut result: Self = unsafe { std::mem::zeroed() };
        result.type_ = type_;
        result
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2Property {
    /// In C, this field is named `type`.
    pub type_: fc2PropertyType,
    pub present: BOOL,
    pub absControl: BOOL,
    pub onePush: BOOL,
    pub onOff: BOOL,
    pub autoManualMode: BOOL,
    pub valueA: c_uint,
    pub valueB: c_uint,
    pub absValue: c_float,
    pub reserved: [c_uint; 8],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2GigEProperty {
    pub propType: fc2GigEPropertyType,
    pub isReadable: BOOL,
    pub isWritable: BOOL,
    pub min: c_uint,
    pub max: c_uint,
    pub value: c_uint,
    pub reserved: [c_uint; 8],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2GigEImageSettingsInfo {
    pub maxWidth: c_uint,
    pub maxHeight: c_uint,
    pub offsetHStepSize: c_uint,
    pub offsetVStepSize: c_uint,
    pub imageHStepSize: c_uint,
    pub imageVStepSize: c_uint,
    pub pixelFormatBitField: c_uint,
    pub vendorPixelFormatBitField: c_uint,
    pub reserved: [c_uint; 16],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2GigEImageSettings {
    pub offsetX: c_uint,
    pub offsetY: c_uint,
    pub width: c_uint,
    pub height: c_uint,
    pub pixelFormat: fc2PixelFormat,
    pub reserved: [c_uint; 8],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2EmbeddedImageInfoProperty {
    pub available: BOOL,
    pub onOff: BOOL,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2EmbeddedImageInfo {
    pub timestamp: fc2EmbeddedImageInfoProperty,
    pub gain: fc2EmbeddedImageInfoProperty,
    pub shutter: fc2EmbeddedImageInfoProperty,
    pub brightness: fc2EmbeddedImageInfoProperty,
    pub exposure: fc2EmbeddedImageInfoProperty,
    pub whiteBalance: fc2EmbeddedImageInfoProperty,
    pub frameCounter: fc2EmbeddedImageInfoProperty,
    pub strobePattern: fc2EmbeddedImageInfoProperty,
    pub GPIOPinState: fc2EmbeddedImageInfoProperty,
    pub ROIPosition: fc2EmbeddedImageInfoProperty,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct fc2TimeStamp {
    pub seconds: i64,
    pub microSeconds: c_uint,
    pub cycleSeconds: c_uint,
    pub cycleCount: c_uint,
    pub cycleOffset: c_uint,
    pub reserved: [c_uint; 8],
}

#[repr(C)]
#[derive(Debug)]
pub struct fc2Image {
    pub rows: c_uint,
    pub cols: c_uint,
    pub stride: c_uint,
    pub pData: *mut c_uchar,
    pub dataSize: c_uint,
    pub receivedDataSize: c_uint,
    pub format: fc2PixelFormat,
    pub bayerFormat: fc2BayerTileFormat,
    pub imageImpl: fc2ImageImpl,
}

impl Default for fc2Image {
    fn default() -> fc2Image {
        fc2Image {
            rows: 0,
            cols: 0,
            stride: 0,
            pData: std::ptr::null_mut(),
            dataSize: 0,
            receivedDataSize: 0,
            format: _fc2PixelFormat::FC2_UNSPECIFIED_PIXEL_FORMAT,
            bayerFormat: _fc2BayerTileFormat::FC2_BT_NONE,
            imageImpl: std::ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_sizes_match_c_headers() {
        assert_eq!(std::mem::size_of::<fc2PGRGuid>(), 16);
        assert_eq!(std::mem::size_of::<fc2Property>(), 4 * 9 + 4 * 8);
        assert_eq!(std::mem::size_of::<fc2GigEProperty>(), 4 * 6 + 4 * 8);
        assert_eq!(std::mem::size_of::<fc2GigEImageSettings>(), 4 * 5 + 4 * 8);
        assert_eq!(std::mem::size_of::<fc2GigEImageSettingsInfo>(), 4 * 8 + 4 * 16);
        assert_eq!(std::mem::size_of::<fc2EmbeddedImageInfo>(), 8 * 10);
        assert_eq!(std::mem::size_of::<fc2TimeStamp>(), 8 + 4 * 4 + 4 * 8);
    }

    #[test]
    fn rgb_alias() {
        assert_eq!(
            _fc2PixelFormat::FC2_PIXEL_FORMAT_RGB,
            _fc2PixelFormat::FC2_PIXEL_FORMAT_RGB8
        );
    }
}
