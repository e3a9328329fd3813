//! Safe wrapper over the FlyCapture2 C API, restricted to GigE cameras.
//!
//! The vendor library is opened at runtime. Use [FlyCapture2Library::new] to
//! load it from the default location (or from `FLYCAP2_LIB`).
use std::{net::Ipv4Addr, os::raw::c_char, path::Path, sync::Arc};

pub use flycap2_sys as ffi;
use tracing::{debug, error, trace};

mod error;

pub use error::{Error, Fc2Error, Result};
use error::fc2_result;

/// Environment variable overriding the path of the FlyCapture2 C library.
pub const LIBRARY_PATH_ENV_VAR: &str = "FLYCAP2_LIB";

macro_rules! fc2_call {
    ($lib:expr, $name:ident ( $($arg:expr),* )) => {{
        trace!("calling: {} {}:{}", stringify!($name), file!(), line!());
        let code = unsafe { ($lib.$name)($($arg),*) };
        fc2_result(code)
    }};
}

// ---------------------------
// library

/// Handle to the loaded FlyCapture2 C library.
///
/// Cloning is cheap. Every context created from this handle keeps the library
/// loaded.
#[derive(Clone)]
pub struct FlyCapture2Library {
    api: Arc<ffi::FlyCapture2C>,
}

impl std::fmt::Debug for FlyCapture2Library {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FlyCapture2Library").finish_non_exhaustive()
    }
}

impl FlyCapture2Library {
    /// Load the library from `$FLYCAP2_LIB` or from the platform default name.
    pub fn new() -> Result<Self> {
        let path = std::env::var_os(LIBRARY_PATH_ENV_VAR)
            .unwrap_or_else(|| ffi::DEFAULT_LIBRARY_NAME.into());
        Self::from_dynamic_lib_path(path)
    }

    pub fn from_dynamic_lib_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading FlyCapture2 C library from {}", path.display());
        let api = unsafe { ffi::FlyCapture2C::new(path.as_os_str()) }.map_err(|source| {
            Error::LibLoading {
                source,
                path: path.to_path_buf(),
            }
        })?;
        Ok(Self { api: Arc::new(api) })
    }

    /// Create a context used to enumerate cameras on the network.
    pub fn bus_manager(&self) -> Result<BusManager> {
        Ok(BusManager {
            cx: BareContext::new(self.api.clone())?,
        })
    }

    /// Connect to the camera identified by `guid`.
    pub fn connect(&self, guid: Guid) -> Result<GigECamera> {
        GigECamera::new(self.api.clone(), guid)
    }

    /// Ask every reachable camera to take an automatically chosen IP address.
    pub fn force_all_ip_addresses_automatically(&self) -> Result<()> {
        debug!("forcing IP addresses of all cameras");
        fc2_call!(self.api, fc2ForceAllIPAddressesAutomatically())?;
        Ok(())
    }
}

// ---------------------------
// GUID

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Guid {
    inner: ffi::fc2PGRGuid,
}

impl Guid {
    pub fn new(v0: u32, v1: u32, v2: u32, v3: u32) -> Guid {
        Guid {
            inner: ffi::fc2PGRGuid {
                value: [v0, v1, v2, v3],
            },
        }
    }
}

impl std::str::FromStr for Guid {
    type Err = Error;
    fn from_str(s: &str) -> Result<Guid> {
        let elements: Vec<&str> = s.split('-').collect();
        if elements.len() != 4 {
            return Err(Error::UnparsableGuid);
        }
        let mut v = [0u32; 4];
        for (dest, e) in v.iter_mut().zip(elements.iter()) {
            *dest = u32::from_str_radix(e, 16).map_err(|_| Error::UnparsableGuid)?;
        }
        Ok(Guid::new(v[0], v[1], v[2], v[3]))
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let v = &self.inner.value;
        write!(f, "{:08X}-{:08X}-{:08X}-{:08X}", v[0], v[1], v[2], v[3])
    }
}

impl std::fmt::Debug for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Guid {{ {} }}", self)
    }
}

impl From<ffi::fc2PGRGuid> for Guid {
    fn from(inner: ffi::fc2PGRGuid) -> Self {
        Guid { inner }
    }
}

impl From<Guid> for ffi::fc2PGRGuid {
    fn from(s: Guid) -> Self {
        s.inner
    }
}

// ---------------------------
// camera information

/// Identification and network information reported by a camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    pub serial: u32,
    pub model: String,
    pub vendor: String,
    pub sensor_info: String,
    pub sensor_resolution: String,
    pub is_color: bool,
    pub firmware_version: String,
    pub bayer_tile_format: ffi::fc2BayerTileFormat,
    pub mac_address: [u8; 6],
    pub ip_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub default_gateway: Ipv4Addr,
}

/// Read a NUL terminated fixed size string field.
pub fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl From<&ffi::fc2CameraInfo> for CameraInfo {
    fn from(orig: &ffi::fc2CameraInfo) -> Self {
        Self {
            serial: orig.serialNumber,
            model: c_chars_to_string(&orig.modelName),
            vendor: c_chars_to_string(&orig.vendorName),
            sensor_info: c_chars_to_string(&orig.sensorInfo),
            sensor_resolution: c_chars_to_string(&orig.sensorResolution),
            is_color: orig.isColorCamera != 0,
            firmware_version: c_chars_to_string(&orig.firmwareVersion),
            bayer_tile_format: orig.bayerTileFormat,
            mac_address: orig.macAddress.octets,
            ip_address: Ipv4Addr::from(orig.ipAddress.octets),
            subnet_mask: Ipv4Addr::from(orig.subnetMask.octets),
            default_gateway: Ipv4Addr::from(orig.defaultGateway.octets),
        }
    }
}

// ---------------------------
// BareContext

struct BareContext {
    api: Arc<ffi::FlyCapture2C>,
    inner: ffi::fc2Context,
}

// The context handle is only used through `&self`/`&mut self` of its owner.
unsafe impl Send for BareContext {}

impl BareContext {
    fn new(api: Arc<ffi::FlyCapture2C>) -> Result<BareContext> {
        let mut inner: ffi::fc2Context = std::ptr::null_mut();
        fc2_call!(api, fc2CreateGigEContext(&mut inner))?;
        Ok(BareContext { api, inner })
    }
}

impl Drop for BareContext {
    fn drop(&mut self) {
        if let Err(e) = fc2_call!(self.api, fc2DestroyContext(self.inner)) {
            error!("while destroying context: {e}");
        }
    }
}

// ---------------------------
// BusManager

/// Enumerates the cameras visible to the library.
pub struct BusManager {
    cx: BareContext,
}

impl BusManager {
    pub fn num_cameras(&self) -> Result<usize> {
        let mut n_cams = 0;
        fc2_call!(self.cx.api, fc2GetNumOfCameras(self.cx.inner, &mut n_cams))?;
        Ok(n_cams as usize)
    }

    pub fn guid_for_index(&self, index: usize) -> Result<Guid> {
        let mut result = ffi::fc2PGRGuid::default();
        fc2_call!(
            self.cx.api,
            fc2GetCameraFromIndex(self.cx.inner, index as u32, &mut result)
        )?;
        Ok(result.into())
    }

    pub fn guid_for_serial(&self, serial: u32) -> Result<Guid> {
        let mut result = ffi::fc2PGRGuid::default();
        fc2_call!(
            self.cx.api,
            fc2GetCameraFromSerialNumber(self.cx.inner, serial, &mut result)
        )?;
        Ok(result.into())
    }
}

// ---------------------------
// Image

/// A frame buffer owned by the library.
pub struct Image {
    api: Arc<ffi::FlyCapture2C>,
    inner: ffi::fc2Image,
}

unsafe impl Send for Image {}

impl Image {
    fn new(api: Arc<ffi::FlyCapture2C>) -> Result<Image> {
        let mut inner = ffi::fc2Image::default();
        fc2_call!(api, fc2CreateImage(&mut inner))?;
        Ok(Image { api, inner })
    }

    pub fn rows(&self) -> u32 {
        self.inner.rows
    }

    pub fn cols(&self) -> u32 {
        self.inner.cols
    }

    pub fn stride(&self) -> u32 {
        self.inner.stride
    }

    pub fn pixel_format(&self) -> ffi::fc2PixelFormat {
        self.inner.format
    }

    pub fn bayer_format(&self) -> ffi::fc2BayerTileFormat {
        self.inner.bayerFormat
    }

    /// The pixel data, `stride * rows` bytes long.
    pub fn data(&self) -> &[u8] {
        if self.inner.pData.is_null() {
            return &[];
        }
        let len = (self.inner.stride as usize * self.inner.rows as usize)
            .min(self.inner.dataSize as usize);
        unsafe { std::slice::from_raw_parts(self.inner.pData, len) }
    }

    /// The timestamp embedded by the camera, if enabled.
    pub fn timestamp(&mut self) -> ffi::fc2TimeStamp {
        unsafe { (self.api.fc2GetImageTimeStamp)(&mut self.inner) }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        if let Err(e) = fc2_call!(self.api, fc2DestroyImage(&mut self.inner)) {
            error!("while destroying image: {e}");
        }
    }
}

// ---------------------------
// GigECamera

/// A connected GigE camera.
///
/// Dropping it stops capture, if started, and disconnects.
pub struct GigECamera {
    cx: BareContext,
    guid: Guid,
    started: bool,
}

impl std::fmt::Debug for GigECamera {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("GigECamera")
            .field("guid", &self.guid)
            .field("started", &self.started)
            .finish()
    }
}

impl GigECamera {
    fn new(api: Arc<ffi::FlyCapture2C>, guid: Guid) -> Result<GigECamera> {
        let cx = BareContext::new(api)?;
        let mut raw_guid: ffi::fc2PGRGuid = guid.into();
        debug!("connecting to {guid}");
        fc2_call!(cx.api, fc2Connect(cx.inner, &mut raw_guid))
            .map_err(|source| Error::CameraFc2 { guid, source })?;
        Ok(GigECamera {
            cx,
            guid,
            started: false,
        })
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    pub fn is_capturing(&self) -> bool {
        self.started
    }

    fn check(&self, r: std::result::Result<(), Fc2Error>) -> Result<()> {
        r.map_err(|source| Error::CameraFc2 {
            guid: self.guid,
            source,
        })
    }

    pub fn camera_info(&self) -> Result<CameraInfo> {
        let mut result = ffi::fc2CameraInfo::default();
        self.check(fc2_call!(
            self.cx.api,
            fc2GetCameraInfo(self.cx.inner, &mut result)
        ))?;
        Ok(CameraInfo::from(&result))
    }

    pub fn property_info(&self, type_: ffi::fc2PropertyType) -> Result<ffi::fc2PropertyInfo> {
        let mut result = ffi::fc2PropertyInfo::for_type(type_);
        self.check(fc2_call!(
            self.cx.api,
            fc2GetPropertyInfo(self.cx.inner, &mut result)
        ))?;
        Ok(result)
    }

    pub fn property(&self, type_: ffi::fc2PropertyType) -> Result<ffi::fc2Property> {
        let mut result = ffi::fc2Property {
            type_,
            ..Default::default()
        };
        self.check(fc2_call!(
            self.cx.api,
            fc2GetProperty(self.cx.inner, &mut result)
        ))?;
        Ok(result)
    }

    pub fn set_property(&self, prop: &ffi::fc2Property) -> Result<()> {
        let mut prop = *prop;
        self.check(fc2_call!(
            self.cx.api,
            fc2SetProperty(self.cx.inner, &mut prop)
        ))
    }

    pub fn gige_property(&self, prop_type: ffi::fc2GigEPropertyType) -> Result<ffi::fc2GigEProperty> {
        let mut result = ffi::fc2GigEProperty {
            propType: prop_type,
            ..Default::default()
        };
        self.check(fc2_call!(
            self.cx.api,
            fc2GetGigEProperty(self.cx.inner, &mut result)
        ))?;
        Ok(result)
    }

    pub fn set_gige_property(&self, prop_type: ffi::fc2GigEPropertyType, value: u32) -> Result<()> {
        let mut prop = self.gige_property(prop_type)?;
        prop.value = value;
        self.check(fc2_call!(
            self.cx.api,
            fc2SetGigEProperty(self.cx.inner, &prop)
        ))
    }

    pub fn gige_image_settings_info(&self) -> Result<ffi::fc2GigEImageSettingsInfo> {
        let mut result = ffi::fc2GigEImageSettingsInfo::default();
        self.check(fc2_call!(
            self.cx.api,
            fc2GetGigEImageSettingsInfo(self.cx.inner, &mut result)
        ))?;
        Ok(result)
    }

    pub fn gige_image_settings(&self) -> Result<ffi::fc2GigEImageSettings> {
        let mut result = ffi::fc2GigEImageSettings::default();
        self.check(fc2_call!(
            self.cx.api,
            fc2GetGigEImageSettings(self.cx.inner, &mut result)
        ))?;
        Ok(result)
    }

    pub fn set_gige_image_settings(&self, settings: &ffi::fc2GigEImageSettings) -> Result<()> {
        self.check(fc2_call!(
            self.cx.api,
            fc2SetGigEImageSettings(self.cx.inner, settings)
        ))
    }

    /// Turn the embedded timestamp in each image on or off.
    pub fn set_embedded_timestamp(&self, on: bool) -> Result<()> {
        let mut info = ffi::fc2EmbeddedImageInfo::default();
        self.check(fc2_call!(
            self.cx.api,
            fc2GetEmbeddedImageInfo(self.cx.inner, &mut info)
        ))?;
        info.timestamp.onOff = on as ffi::BOOL;
        self.check(fc2_call!(
            self.cx.api,
            fc2SetEmbeddedImageInfo(self.cx.inner, &mut info)
        ))
    }

    pub fn read_register(&self, address: u32) -> Result<u32> {
        let mut value = 0;
        self.check(fc2_call!(
            self.cx.api,
            fc2ReadRegister(self.cx.inner, address, &mut value)
        ))?;
        Ok(value)
    }

    pub fn write_register(&self, address: u32, value: u32) -> Result<()> {
        trace!("register 0x{address:X} <- 0x{value:08X}");
        self.check(fc2_call!(
            self.cx.api,
            fc2WriteRegister(self.cx.inner, address, value)
        ))
    }

    pub fn read_gvcp_register(&self, address: u32) -> Result<u32> {
        let mut value = 0;
        self.check(fc2_call!(
            self.cx.api,
            fc2ReadGVCPRegister(self.cx.inner, address, &mut value)
        ))?;
        Ok(value)
    }

    /// Write a GVCP register, optionally as a broadcast packet.
    ///
    /// Broadcast reaches a camera whose current address is not routable from
    /// this host.
    pub fn write_gvcp_register(&self, address: u32, value: u32, broadcast: bool) -> Result<()> {
        trace!("GVCP register 0x{address:X} <- 0x{value:08X} (broadcast: {broadcast})");
        if broadcast {
            self.check(fc2_call!(
                self.cx.api,
                fc2WriteGVCPRegisterBroadcast(self.cx.inner, address, value)
            ))
        } else {
            self.check(fc2_call!(
                self.cx.api,
                fc2WriteGVCPRegister(self.cx.inner, address, value)
            ))
        }
    }

    pub fn start_capture(&mut self) -> Result<()> {
        debug!("starting capture on {}", self.guid);
        self.check(fc2_call!(self.cx.api, fc2StartCapture(self.cx.inner)))?;
        self.started = true;
        Ok(())
    }

    pub fn stop_capture(&mut self) -> Result<()> {
        debug!("stopping capture on {}", self.guid);
        self.check(fc2_call!(self.cx.api, fc2StopCapture(self.cx.inner)))?;
        self.started = false;
        Ok(())
    }

    /// Block until the next frame arrives or the library times out.
    pub fn retrieve_buffer(&self) -> Result<Image> {
        let mut im = Image::new(self.cx.api.clone())?;
        self.check(fc2_call!(
            self.cx.api,
            fc2RetrieveBuffer(self.cx.inner, &mut im.inner)
        ))?;
        Ok(im)
    }
}

impl Drop for GigECamera {
    fn drop(&mut self) {
        if self.started {
            if let Err(e) = self.stop_capture() {
                error!("while stopping capture on drop: {e}");
            }
        }
        debug!("disconnecting from {}", self.guid);
        if let Err(e) = fc2_call!(self.cx.api, fc2Disconnect(self.cx.inner)) {
            error!("while disconnecting {}: {e}", self.guid);
        }
    }
}

fn _test_camera_is_send() {
    fn implements<T: Send>() {}
    implements::<GigECamera>();
    implements::<FlyCapture2Library>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_roundtrip() {
        let guid1 = Guid::new(1, 2, 3, 4);
        let s = guid1.to_string();
        assert_eq!(s, "00000001-00000002-00000003-00000004");
        let guid2: Guid = s.parse().unwrap();
        assert_eq!(guid1, guid2);
    }

    #[test]
    fn guid_parse() {
        let guid: Guid = "2D8357D5-21DB8DAD-ECACF53C-24A87704".parse().unwrap();
        assert_eq!(guid, Guid::new(0x2D8357D5, 0x21DB8DAD, 0xECACF53C, 0x24A87704));
        assert_eq!(guid.to_string(), "2D8357D5-21DB8DAD-ECACF53C-24A87704");
        let short: Guid = "1-A-0-FF".parse().unwrap();
        assert_eq!(short.to_string(), "00000001-0000000A-00000000-000000FF");
        assert!("1-2-3".parse::<Guid>().is_err());
        assert!("1-2-3-xyz".parse::<Guid>().is_err());
    }

    #[test]
    fn camera_info_from_ffi() {
        let mut raw = ffi::fc2CameraInfo::default();
        raw.serialNumber = 16452901;
        for (dest, src) in raw.modelName.iter_mut().zip(b"Blackfly BFLY-PGE-13S2C") {
            *dest = *src as c_char;
        }
        raw.isColorCamera = 1;
        raw.ipAddress.octets = [192, 168, 1, 2];
        let info = CameraInfo::from(&raw);
        assert_eq!(info.serial, 16452901);
        assert_eq!(info.model, "Blackfly BFLY-PGE-13S2C");
        assert_eq!(info.vendor, "");
        assert!(info.is_color);
        assert_eq!(info.ip_address, Ipv4Addr::new(192, 168, 1, 2));
    }

    #[test]
    fn missing_library_is_an_error() {
        let result = FlyCapture2Library::from_dynamic_lib_path("/nonexistent/libflycapture-c.so");
        assert!(matches!(result, Err(Error::LibLoading { .. })));
    }
}
