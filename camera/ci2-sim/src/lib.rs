//! A simulated GigE camera backend.
//!
//! Devices live in a [SimModule]. Their registers, properties and addresses
//! persist across connections, so a value written through one connection can
//! be read back through the next. Every state change made through the
//! [ci2::Camera] interface is appended to a shared [EventLog].
use std::{collections::HashMap, net::Ipv4Addr, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tracing::{debug, info};

use ci2::{
    BayerTile, CameraInfo, DeviceTimestamp, GigEImageSettings, GigEImageSettingsInfo,
    GigEPropertyType, HostTimingInfo, PixelFormat, Property, PropertyInfo, PropertyType, RawFrame,
};

/// Color of every pixel of the simulated color sensor.
pub const TEST_PATTERN_RGB: [u8; 3] = [200, 100, 50];
/// Value of every pixel of the simulated monochrome sensor.
pub const TEST_PATTERN_MONO: u8 = 128;

const FIRST_DEVICE_SECONDS: i64 = 1000;

/// Something that happened to a simulated camera.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Connected { serial: u32 },
    Disconnected { serial: u32 },
    ForceIpAddresses,
    SetProperty { serial: u32, property: Property },
    SetGigEProperty {
        serial: u32,
        property_type: GigEPropertyType,
        value: u32,
    },
    SetImageSettings {
        serial: u32,
        settings: GigEImageSettings,
    },
    EmbeddedTimestamp { serial: u32, on: bool },
    WriteRegister { serial: u32, address: u32, value: u32 },
    WriteGvcpRegister {
        serial: u32,
        address: u32,
        value: u32,
        broadcast: bool,
    },
    AcquisitionStarted { serial: u32 },
    AcquisitionStopped { serial: u32 },
}

pub type EventLog = Arc<Mutex<Vec<SimEvent>>>;

/// Injected misbehavior of a simulated camera.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    /// Zero-based `next_frame` attempts (counted per connection) that time
    /// out.
    pub timeout_on_attempts: Vec<usize>,
    /// After this many delivered frames, every further `next_frame` reports
    /// the link as down.
    pub link_down_after: Option<usize>,
    /// Writing this property fails.
    pub failing_property: Option<PropertyType>,
}

/// Static description of a simulated camera.
#[derive(Debug, Clone)]
pub struct SimCameraConfig {
    pub serial: u32,
    pub model: String,
    pub vendor: String,
    pub sensor_info: String,
    pub is_color: bool,
    pub firmware_version: String,
    pub max_width: u32,
    pub max_height: u32,
    pub ip_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub default_gateway: Ipv4Addr,
    /// Address taken when IP addresses are forced automatically.
    pub forced_ip_address: Ipv4Addr,
    /// Properties the camera does not have.
    pub missing_properties: Vec<PropertyType>,
    /// Properties without automatic mode.
    pub manual_only_properties: Vec<PropertyType>,
    /// Time taken to deliver a frame.
    pub frame_period: Duration,
    pub failures: Failures,
}

impl Default for SimCameraConfig {
    fn default() -> Self {
        Self {
            serial: 16452901,
            model: "Blackfly BFLY-PGE-13S2C".into(),
            vendor: "Point Grey Research".into(),
            sensor_info: "Sony ICX445AQ (1/3\" 1296x964 CCD)".into(),
            is_color: true,
            firmware_version: "1.33.3.0".into(),
            max_width: 64,
            max_height: 48,
            ip_address: Ipv4Addr::new(169, 254, 0, 10),
            subnet_mask: Ipv4Addr::new(255, 255, 0, 0),
            default_gateway: Ipv4Addr::new(0, 0, 0, 0),
            forced_ip_address: Ipv4Addr::new(192, 168, 0, 10),
            missing_properties: Vec::new(),
            manual_only_properties: Vec::new(),
            frame_period: Duration::from_micros(33_333),
            failures: Failures::default(),
        }
    }
}

impl SimCameraConfig {
    fn supported_pixel_formats(&self) -> Vec<PixelFormat> {
        if self.is_color {
            vec![
                PixelFormat::Raw8,
                PixelFormat::Raw16,
                PixelFormat::Mono8,
                PixelFormat::Rgb8,
                PixelFormat::Bgr8,
            ]
        } else {
            vec![PixelFormat::Mono8, PixelFormat::Mono16]
        }
    }
}

/// Mutable state of one simulated camera.
#[derive(Debug)]
struct SimDevice {
    config: SimCameraConfig,
    ip_address: Ipv4Addr,
    settings: GigEImageSettings,
    gige_properties: HashMap<GigEPropertyType, u32>,
    properties: HashMap<PropertyType, Property>,
    registers: HashMap<u32, u32>,
    gvcp_registers: HashMap<u32, u32>,
    embedded_timestamp: bool,
}

impl SimDevice {
    fn new(config: SimCameraConfig) -> Self {
        let settings = GigEImageSettings {
            offset_x: 0,
            offset_y: 0,
            width: config.max_width,
            height: config.max_height,
            pixel_format: PixelFormat::Mono8,
        };
        let gige_properties = [
            (GigEPropertyType::Heartbeat, 1),
            (GigEPropertyType::HeartbeatTimeout, 3000),
            (GigEPropertyType::PacketSize, 1500),
            (GigEPropertyType::PacketDelay, 400),
        ]
        .into_iter()
        .collect();
        Self {
            ip_address: config.ip_address,
            config,
            settings,
            gige_properties,
            properties: HashMap::new(),
            registers: HashMap::new(),
            gvcp_registers: HashMap::new(),
            embedded_timestamp: false,
        }
    }

    fn info(&self) -> CameraInfo {
        let c = &self.config;
        CameraInfo {
            serial: c.serial,
            model: c.model.clone(),
            vendor: c.vendor.clone(),
            sensor_info: c.sensor_info.clone(),
            sensor_resolution: format!("{}x{}", c.max_width, c.max_height),
            is_color: c.is_color,
            firmware_version: c.firmware_version.clone(),
            ip_address: self.ip_address,
            subnet_mask: c.subnet_mask,
            default_gateway: c.default_gateway,
        }
    }

    fn property_info(&self, property_type: PropertyType) -> PropertyInfo {
        if self.config.missing_properties.contains(&property_type) {
            return PropertyInfo::not_present(property_type);
        }
        PropertyInfo {
            present: true,
            auto_supported: !self.config.manual_only_properties.contains(&property_type),
            manual_supported: true,
            on_off_supported: true,
            one_push_supported: false,
            abs_val_supported: true,
            read_out_supported: true,
            min: 0,
            max: 4095,
            abs_min: 0.0,
            abs_max: 100.0,
            ..PropertyInfo::not_present(property_type)
        }
    }
}

// ---------------------------
// module

pub struct SimModule {
    devices: Vec<Arc<Mutex<SimDevice>>>,
    log: EventLog,
}

/// A module with one camera in its default configuration.
pub fn new_module() -> ci2::Result<SimModule> {
    Ok(SimModule::new(vec![SimCameraConfig::default()]))
}

impl SimModule {
    pub fn new(cameras: Vec<SimCameraConfig>) -> Self {
        Self {
            devices: cameras
                .into_iter()
                .map(|c| Arc::new(Mutex::new(SimDevice::new(c))))
                .collect(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn event_log(&self) -> EventLog {
        self.log.clone()
    }

    /// A copy of every event recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.log.lock().clone()
    }

    /// The stored value of a GVCP register, if ever written.
    pub fn gvcp_register(&self, serial: u32, address: u32) -> Option<u32> {
        self.devices
            .iter()
            .map(|d| d.lock())
            .find(|d| d.config.serial == serial)
            .and_then(|d| d.gvcp_registers.get(&address).copied())
    }

    fn connect(&self, device: &Arc<Mutex<SimDevice>>) -> SimCamera {
        let serial = device.lock().config.serial;
        debug!("connecting to simulated camera {serial}");
        self.log.lock().push(SimEvent::Connected { serial });
        SimCamera {
            device: device.clone(),
            log: self.log.clone(),
            serial,
            acquiring: false,
            attempts: 0,
            delivered: 0,
        }
    }
}

impl ci2::CameraModule for SimModule {
    type CameraType = SimCamera;

    fn name(&self) -> &str {
        "sim"
    }

    fn camera_infos(&self) -> ci2::Result<Vec<CameraInfo>> {
        Ok(self.devices.iter().map(|d| d.lock().info()).collect())
    }

    fn camera_by_serial(&mut self, serial: u32) -> ci2::Result<SimCamera> {
        let device = self
            .devices
            .iter()
            .find(|d| d.lock().config.serial == serial)
            .ok_or_else(|| ci2::Error::CameraNotFound(format!("serial {serial}")))?;
        Ok(self.connect(device))
    }

    fn camera_by_index(&mut self, index: usize) -> ci2::Result<SimCamera> {
        let device = self.devices.get(index).ok_or_else(|| {
            ci2::Error::CameraNotFound(format!(
                "index {index} ({} camera(s) present)",
                self.devices.len()
            ))
        })?;
        Ok(self.connect(device))
    }

    fn force_all_ip_addresses(&mut self) -> ci2::Result<()> {
        for device in self.devices.iter() {
            let mut device = device.lock();
            device.ip_address = device.config.forced_ip_address;
            info!(
                "simulated camera {} now at {}",
                device.config.serial, device.ip_address
            );
        }
        self.log.lock().push(SimEvent::ForceIpAddresses);
        Ok(())
    }
}

// ---------------------------
// camera

pub struct SimCamera {
    device: Arc<Mutex<SimDevice>>,
    log: EventLog,
    serial: u32,
    acquiring: bool,
    attempts: usize,
    delivered: usize,
}

fn _test_camera_is_send() {
    // Compile-time test to ensure SimCamera implements Send trait.
    fn implements<T: Send>() {}
    implements::<SimCamera>();
}

impl SimCamera {
    fn record(&self, event: SimEvent) {
        self.log.lock().push(event);
    }
}

impl ci2::Camera for SimCamera {
    fn serial(&self) -> u32 {
        self.serial
    }

    fn camera_info(&self) -> ci2::Result<CameraInfo> {
        Ok(self.device.lock().info())
    }

    fn property_info(&self, property_type: PropertyType) -> ci2::Result<PropertyInfo> {
        Ok(self.device.lock().property_info(property_type))
    }

    fn property(&self, property_type: PropertyType) -> ci2::Result<Property> {
        let device = self.device.lock();
        if !device.property_info(property_type).present {
            return Err(ci2::Error::PropertyNotPresent(property_type));
        }
        Ok(device
            .properties
            .get(&property_type)
            .copied()
            .unwrap_or_else(|| Property {
                present: true,
                ..Property::new(property_type)
            }))
    }

    fn set_property(&mut self, property: &Property) -> ci2::Result<()> {
        {
            let mut device = self.device.lock();
            if !device.property_info(property.property_type).present {
                return Err(ci2::Error::PropertyNotPresent(property.property_type));
            }
            if device.config.failures.failing_property == Some(property.property_type) {
                return Err(ci2::Error::from(format!(
                    "simulated failure writing {}",
                    property.property_type
                )));
            }
            device.properties.insert(property.property_type, *property);
        }
        self.record(SimEvent::SetProperty {
            serial: self.serial,
            property: *property,
        });
        Ok(())
    }

    fn set_gige_property(&mut self, property_type: GigEPropertyType, value: u32) -> ci2::Result<()> {
        self.device
            .lock()
            .gige_properties
            .insert(property_type, value);
        self.record(SimEvent::SetGigEProperty {
            serial: self.serial,
            property_type,
            value,
        });
        Ok(())
    }

    fn gige_image_settings_info(&self) -> ci2::Result<GigEImageSettingsInfo> {
        let device = self.device.lock();
        Ok(GigEImageSettingsInfo {
            max_width: device.config.max_width,
            max_height: device.config.max_height,
            offset_h_step_size: 2,
            offset_v_step_size: 2,
            image_h_step_size: 2,
            image_v_step_size: 2,
            pixel_format_bit_field: 0,
        })
    }

    fn gige_image_settings(&self) -> ci2::Result<GigEImageSettings> {
        Ok(self.device.lock().settings)
    }

    fn set_gige_image_settings(&mut self, settings: &GigEImageSettings) -> ci2::Result<()> {
        {
            let mut device = self.device.lock();
            let c = &device.config;
            let fits = |offset: u32, size: u32, max: u32| {
                offset.checked_add(size).is_some_and(|end| end <= max)
            };
            if !fits(settings.offset_x, settings.width, c.max_width)
                || !fits(settings.offset_y, settings.height, c.max_height)
            {
                return Err(ci2::Error::InvalidSetting(format!(
                    "region {}x{}+{}+{} exceeds sensor {}x{}",
                    settings.width,
                    settings.height,
                    settings.offset_x,
                    settings.offset_y,
                    c.max_width,
                    c.max_height
                )));
            }
            if !c.supported_pixel_formats().contains(&settings.pixel_format) {
                return Err(ci2::Error::InvalidSetting(format!(
                    "pixel format {} not supported",
                    settings.pixel_format
                )));
            }
            device.settings = *settings;
        }
        self.record(SimEvent::SetImageSettings {
            serial: self.serial,
            settings: *settings,
        });
        Ok(())
    }

    fn set_embedded_timestamp(&mut self, on: bool) -> ci2::Result<()> {
        self.device.lock().embedded_timestamp = on;
        self.record(SimEvent::EmbeddedTimestamp {
            serial: self.serial,
            on,
        });
        Ok(())
    }

    fn read_register(&self, address: u32) -> ci2::Result<u32> {
        Ok(self
            .device
            .lock()
            .registers
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    fn write_register(&mut self, address: u32, value: u32) -> ci2::Result<()> {
        self.device.lock().registers.insert(address, value);
        self.record(SimEvent::WriteRegister {
            serial: self.serial,
            address,
            value,
        });
        Ok(())
    }

    fn read_gvcp_register(&self, address: u32) -> ci2::Result<u32> {
        Ok(self
            .device
            .lock()
            .gvcp_registers
            .get(&address)
            .copied()
            .unwrap_or(0))
    }

    fn write_gvcp_register(&mut self, address: u32, value: u32, broadcast: bool) -> ci2::Result<()> {
        self.device.lock().gvcp_registers.insert(address, value);
        self.record(SimEvent::WriteGvcpRegister {
            serial: self.serial,
            address,
            value,
            broadcast,
        });
        Ok(())
    }

    fn acquisition_start(&mut self) -> ci2::Result<()> {
        if self.acquiring {
            return Err(ci2::Error::from("capture already started"));
        }
        self.acquiring = true;
        self.record(SimEvent::AcquisitionStarted {
            serial: self.serial,
        });
        Ok(())
    }

    fn acquisition_stop(&mut self) -> ci2::Result<()> {
        if !self.acquiring {
            return Err(ci2::Error::from("capture not started"));
        }
        self.acquiring = false;
        self.record(SimEvent::AcquisitionStopped {
            serial: self.serial,
        });
        Ok(())
    }

    fn is_acquiring(&self) -> bool {
        self.acquiring
    }

    fn next_frame(&mut self) -> ci2::Result<RawFrame> {
        if !self.acquiring {
            return Err(ci2::Error::from("capture not started"));
        }
        let attempt = self.attempts;
        self.attempts += 1;

        let device = self.device.lock();
        let failures = &device.config.failures;
        if failures
            .link_down_after
            .is_some_and(|k| self.delivered >= k)
        {
            return Err(ci2::Error::LinkDown(format!(
                "simulated camera {} unreachable",
                self.serial
            )));
        }
        std::thread::sleep(device.config.frame_period);
        if failures.timeout_on_attempts.contains(&attempt) {
            return Err(ci2::Error::Timeout);
        }

        let fno = self.delivered;
        self.delivered += 1;

        let settings = device.settings;
        let bayer_tile = match settings.pixel_format {
            PixelFormat::Raw8 | PixelFormat::Raw16 => BayerTile::RGGB,
            _ => BayerTile::None,
        };
        let device_timestamp = device.embedded_timestamp.then(|| {
            let micros = fno as u64 * device.config.frame_period.as_micros() as u64;
            DeviceTimestamp {
                seconds: FIRST_DEVICE_SECONDS + (micros / 1_000_000) as i64,
                micro_seconds: (micros % 1_000_000) as u32,
                ..Default::default()
            }
        });
        let stride = settings.width * u32::from(settings.pixel_format.bits_per_pixel()) / 8;
        Ok(RawFrame {
            width: settings.width,
            height: settings.height,
            stride,
            pixel_format: settings.pixel_format,
            bayer_tile,
            data: test_pattern(&settings, device.config.is_color),
            device_timestamp,
            host_timing: HostTimingInfo {
                fno,
                datetime: chrono::Utc::now(),
            },
        })
    }
}

impl Drop for SimCamera {
    fn drop(&mut self) {
        if self.acquiring {
            self.record(SimEvent::AcquisitionStopped {
                serial: self.serial,
            });
        }
        debug!("disconnecting from simulated camera {}", self.serial);
        self.record(SimEvent::Disconnected {
            serial: self.serial,
        });
    }
}

/// Pixel value at `(x, y)` of an RGGB mosaic of [TEST_PATTERN_RGB].
fn rggb_sample(x: u32, y: u32) -> u8 {
    let [r, g, b] = TEST_PATTERN_RGB;
    match (y % 2, x % 2) {
        (0, 0) => r,
        (1, 1) => b,
        _ => g,
    }
}

fn test_pattern(settings: &GigEImageSettings, is_color: bool) -> Vec<u8> {
    let (w, h) = (settings.width, settings.height);
    let n = w as usize * h as usize;
    let [r, g, b] = TEST_PATTERN_RGB;
    match settings.pixel_format {
        PixelFormat::Mono8 => {
            let v = if is_color { g } else { TEST_PATTERN_MONO };
            vec![v; n]
        }
        PixelFormat::Mono16 => [0, TEST_PATTERN_MONO].repeat(n),
        PixelFormat::Raw8 => (0..h)
            .flat_map(|y| (0..w).map(move |x| rggb_sample(x, y)))
            .collect(),
        PixelFormat::Raw16 => (0..h)
            .flat_map(|y| (0..w).flat_map(move |x| [0, rggb_sample(x, y)]))
            .collect(),
        PixelFormat::Rgb8 => [r, g, b].repeat(n),
        PixelFormat::Bgr8 => [b, g, r].repeat(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci2::{Camera, CameraModule};
    use test_log::test;

    fn fast_config() -> SimCameraConfig {
        SimCameraConfig {
            frame_period: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[test]
    fn lifecycle_is_logged() {
        let mut module = SimModule::new(vec![fast_config()]);
        {
            let mut cam = module.camera_by_serial(16452901).unwrap();
            cam.acquisition_start().unwrap();
            let frame = cam.next_frame().unwrap();
            assert_eq!(frame.width, 64);
            assert_eq!(frame.data.len(), 64 * 48);
        }
        assert_eq!(
            module.events(),
            vec![
                SimEvent::Connected { serial: 16452901 },
                SimEvent::AcquisitionStarted { serial: 16452901 },
                SimEvent::AcquisitionStopped { serial: 16452901 },
                SimEvent::Disconnected { serial: 16452901 },
            ]
        );
    }

    #[test]
    fn unknown_camera() {
        let mut module = SimModule::new(vec![fast_config()]);
        assert!(matches!(
            module.camera_by_serial(1),
            Err(ci2::Error::CameraNotFound(_))
        ));
        assert!(matches!(
            module.camera_by_index(1),
            Err(ci2::Error::CameraNotFound(_))
        ));
    }

    #[test]
    fn raw8_pattern_is_rggb() {
        let mut module = SimModule::new(vec![fast_config()]);
        let mut cam = module.camera_by_index(0).unwrap();
        cam.set_gige_image_settings(&GigEImageSettings {
            offset_x: 0,
            offset_y: 0,
            width: 4,
            height: 2,
            pixel_format: PixelFormat::Raw8,
        })
        .unwrap();
        cam.acquisition_start().unwrap();
        let frame = cam.next_frame().unwrap();
        assert_eq!(frame.bayer_tile, BayerTile::RGGB);
        assert_eq!(frame.data, vec![200, 100, 200, 100, 100, 50, 100, 50]);
        assert!(frame.device_timestamp.is_none());
    }

    #[test]
    fn injected_failures() {
        let mut config = fast_config();
        config.failures.timeout_on_attempts = vec![1];
        config.failures.link_down_after = Some(2);
        let mut module = SimModule::new(vec![config]);
        let mut cam = module.camera_by_index(0).unwrap();
        cam.acquisition_start().unwrap();
        assert!(cam.next_frame().is_ok());
        assert_eq!(cam.next_frame().unwrap_err().kind(), ci2::ErrorKind::Timeout);
        assert!(cam.next_frame().is_ok());
        assert_eq!(
            cam.next_frame().unwrap_err().kind(),
            ci2::ErrorKind::LinkDown
        );
    }

    #[test]
    fn embedded_timestamp_advances() {
        let mut module = SimModule::new(vec![fast_config()]);
        let mut cam = module.camera_by_index(0).unwrap();
        cam.set_embedded_timestamp(true).unwrap();
        cam.acquisition_start().unwrap();
        let t0 = cam.next_frame().unwrap().device_timestamp.unwrap();
        let t1 = cam.next_frame().unwrap().device_timestamp.unwrap();
        assert_eq!(t0.seconds, FIRST_DEVICE_SECONDS);
        assert!(t1.as_secs_f64() > t0.as_secs_f64());
    }

    #[test]
    fn registers_persist_across_connections() {
        let mut module = SimModule::new(vec![fast_config()]);
        {
            let mut cam = module.camera_by_index(0).unwrap();
            cam.write_gvcp_register(0x64C, 0x0A00_A8C0, true).unwrap();
        }
        let cam = module.camera_by_index(0).unwrap();
        assert_eq!(cam.read_gvcp_register(0x64C).unwrap(), 0x0A00_A8C0);
        assert_eq!(module.gvcp_register(16452901, 0x64C), Some(0x0A00_A8C0));
    }

    #[test]
    fn forcing_ips_changes_address() {
        let mut module = SimModule::new(vec![fast_config()]);
        assert_eq!(
            module.camera_infos().unwrap()[0].ip_address,
            Ipv4Addr::new(169, 254, 0, 10)
        );
        module.force_all_ip_addresses().unwrap();
        assert_eq!(
            module.camera_infos().unwrap()[0].ip_address,
            Ipv4Addr::new(192, 168, 0, 10)
        );
    }

    #[test]
    fn oversized_region_rejected() {
        let mut module = SimModule::new(vec![fast_config()]);
        let mut cam = module.camera_by_index(0).unwrap();
        let result = cam.set_gige_image_settings(&GigEImageSettings {
            offset_x: 2,
            offset_y: 0,
            width: 64,
            height: 48,
            pixel_format: PixelFormat::Raw8,
        });
        assert!(matches!(result, Err(ci2::Error::InvalidSetting(_))));
    }

    #[test]
    fn overflowing_region_rejected() {
        let mut module = SimModule::new(vec![fast_config()]);
        let mut cam = module.camera_by_index(0).unwrap();
        for (offset_x, offset_y) in [(u32::MAX, 0), (0, u32::MAX - 1)] {
            let result = cam.set_gige_image_settings(&GigEImageSettings {
                offset_x,
                offset_y,
                width: 64,
                height: 48,
                pixel_format: PixelFormat::Raw8,
            });
            assert!(matches!(result, Err(ci2::Error::InvalidSetting(_))));
        }
        assert!(
            !module
                .events()
                .iter()
                .any(|e| matches!(e, SimEvent::SetImageSettings { .. }))
        );
    }
}
