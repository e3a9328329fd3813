use lazy_static::lazy_static;
use tracing::{debug, info};

use ci2::{
    BayerTile, CameraInfo, DeviceTimestamp, GigEImageSettings, GigEImageSettingsInfo,
    GigEPropertyType, HostTimingInfo, PixelFormat, Property, PropertyInfo, PropertyType, RawFrame,
};
use flycap2::{FlyCapture2Library, c_chars_to_string, ffi};

lazy_static! {
    static ref FLYCAP2_LIB: std::result::Result<FlyCapture2Library, String> =
        FlyCapture2Library::new().map_err(|e| e.to_string());
}

/// convert flycap2::Error to ci2::Error
fn fe2ce(orig: flycap2::Error) -> ci2::Error {
    if let Some(code) = orig.fc2_error() {
        if code.is_timeout() {
            return ci2::Error::Timeout;
        }
        if code.is_link_down() {
            return ci2::Error::LinkDown(orig.to_string());
        }
    }
    ci2::Error::from(anyhow::Error::new(orig))
}

trait ResultExt<T> {
    fn ci2err(self) -> ci2::Result<T>;
}

impl<T> ResultExt<T> for flycap2::Result<T> {
    fn ci2err(self) -> ci2::Result<T> {
        self.map_err(fe2ce)
    }
}

// ---------------------------
// module

#[derive(Clone)]
pub struct WrappedModule {
    lib: FlyCapture2Library,
}

/// Open the FlyCapture2 library shared by the whole process.
pub fn new_module() -> ci2::Result<WrappedModule> {
    let lib = FLYCAP2_LIB
        .as_ref()
        .map_err(|msg| ci2::Error::from(anyhow::anyhow!("{msg}")))?;
    Ok(WrappedModule { lib: lib.clone() })
}

/// Open the FlyCapture2 library found at `path` rather than the default one.
pub fn new_module_from_path<P: AsRef<std::path::Path>>(path: P) -> ci2::Result<WrappedModule> {
    let lib = FlyCapture2Library::from_dynamic_lib_path(path).ci2err()?;
    Ok(WrappedModule { lib })
}

impl WrappedModule {
    fn connect(&self, guid: flycap2::Guid) -> ci2::Result<WrappedCamera> {
        let camera = self.lib.connect(guid).ci2err()?;
        let serial = camera.camera_info().ci2err()?.serial;
        Ok(WrappedCamera {
            camera,
            serial,
            embedded_timestamp: false,
            fno: 0,
        })
    }
}

impl ci2::CameraModule for WrappedModule {
    type CameraType = WrappedCamera;

    fn name(&self) -> &str {
        "flycap2"
    }

    fn camera_infos(&self) -> ci2::Result<Vec<CameraInfo>> {
        let bus = self.lib.bus_manager().ci2err()?;
        let n_cams = bus.num_cameras().ci2err()?;
        debug!("{n_cams} camera(s) found");
        let mut infos = Vec::with_capacity(n_cams);
        for i in 0..n_cams {
            let guid = bus.guid_for_index(i).ci2err()?;
            let camera = self.lib.connect(guid).ci2err()?;
            infos.push(convert_camera_info(camera.camera_info().ci2err()?));
        }
        Ok(infos)
    }

    fn camera_by_serial(&mut self, serial: u32) -> ci2::Result<WrappedCamera> {
        let bus = self.lib.bus_manager().ci2err()?;
        let guid = match bus.guid_for_serial(serial) {
            Ok(guid) => guid,
            Err(e) if e.fc2_error().is_some_and(|c| c.is_not_found()) => {
                return Err(ci2::Error::CameraNotFound(format!("serial {serial}")));
            }
            Err(e) => return Err(fe2ce(e)),
        };
        info!("camera {serial} has GUID {guid}");
        self.connect(guid)
    }

    fn camera_by_index(&mut self, index: usize) -> ci2::Result<WrappedCamera> {
        let bus = self.lib.bus_manager().ci2err()?;
        let n_cams = bus.num_cameras().ci2err()?;
        if index >= n_cams {
            return Err(ci2::Error::CameraNotFound(format!(
                "index {index} ({n_cams} camera(s) present)"
            )));
        }
        let guid = bus.guid_for_index(index).ci2err()?;
        self.connect(guid)
    }

    fn force_all_ip_addresses(&mut self) -> ci2::Result<()> {
        self.lib.force_all_ip_addresses_automatically().ci2err()
    }
}

// ---------------------------
// camera

pub struct WrappedCamera {
    camera: flycap2::GigECamera,
    serial: u32,
    embedded_timestamp: bool,
    fno: usize,
}

fn _test_camera_is_send() {
    // Compile-time test to ensure WrappedCamera implements Send trait.
    fn implements<T: Send>() {}
    implements::<WrappedCamera>();
}

impl ci2::Camera for WrappedCamera {
    fn serial(&self) -> u32 {
        self.serial
    }

    fn camera_info(&self) -> ci2::Result<CameraInfo> {
        Ok(convert_camera_info(self.camera.camera_info().ci2err()?))
    }

    fn property_info(&self, property_type: PropertyType) -> ci2::Result<PropertyInfo> {
        let raw = self
            .camera
            .property_info(property_type_to_ffi(property_type))
            .ci2err()?;
        Ok(PropertyInfo {
            property_type,
            present: raw.present != 0,
            auto_supported: raw.autoSupported != 0,
            manual_supported: raw.manualSupported != 0,
            on_off_supported: raw.onOffSupported != 0,
            one_push_supported: raw.onePushSupported != 0,
            abs_val_supported: raw.absValSupported != 0,
            read_out_supported: raw.readOutSupported != 0,
            min: raw.min,
            max: raw.max,
            abs_min: raw.absMin,
            abs_max: raw.absMax,
            units: c_chars_to_string(&raw.pUnits),
            unit_abbr: c_chars_to_string(&raw.pUnitAbbr),
        })
    }

    fn property(&self, property_type: PropertyType) -> ci2::Result<Property> {
        let raw = self
            .camera
            .property(property_type_to_ffi(property_type))
            .ci2err()?;
        Ok(Property {
            property_type,
            present: raw.present != 0,
            abs_control: raw.absControl != 0,
            one_push: raw.onePush != 0,
            on_off: raw.onOff != 0,
            auto_manual_mode: raw.autoManualMode != 0,
            value_a: raw.valueA,
            value_b: raw.valueB,
            abs_value: raw.absValue,
        })
    }

    fn set_property(&mut self, property: &Property) -> ci2::Result<()> {
        let raw = ffi::fc2Property {
            type_: property_type_to_ffi(property.property_type),
            present: property.present.into(),
            absControl: property.abs_control.into(),
            onePush: property.one_push.into(),
            onOff: property.on_off.into(),
            autoManualMode: property.auto_manual_mode.into(),
            valueA: property.value_a,
            valueB: property.value_b,
            absValue: property.abs_value,
            reserved: [0; 8],
        };
        self.camera.set_property(&raw).ci2err()
    }

    fn set_gige_property(&mut self, property_type: GigEPropertyType, value: u32) -> ci2::Result<()> {
        use ffi::_fc2GigEPropertyType::*;
        let raw_type = match property_type {
            GigEPropertyType::Heartbeat => FC2_HEARTBEAT,
            GigEPropertyType::HeartbeatTimeout => FC2_HEARTBEAT_TIMEOUT,
            GigEPropertyType::PacketSize => PACKET_SIZE,
            GigEPropertyType::PacketDelay => PACKET_DELAY,
        };
        self.camera.set_gige_property(raw_type, value).ci2err()
    }

    fn gige_image_settings_info(&self) -> ci2::Result<GigEImageSettingsInfo> {
        let raw = self.camera.gige_image_settings_info().ci2err()?;
        Ok(GigEImageSettingsInfo {
            max_width: raw.maxWidth,
            max_height: raw.maxHeight,
            offset_h_step_size: raw.offsetHStepSize,
            offset_v_step_size: raw.offsetVStepSize,
            image_h_step_size: raw.imageHStepSize,
            image_v_step_size: raw.imageVStepSize,
            pixel_format_bit_field: raw.pixelFormatBitField,
        })
    }

    fn gige_image_settings(&self) -> ci2::Result<GigEImageSettings> {
        let raw = self.camera.gige_image_settings().ci2err()?;
        Ok(GigEImageSettings {
            offset_x: raw.offsetX,
            offset_y: raw.offsetY,
            width: raw.width,
            height: raw.height,
            pixel_format: pixel_format_from_ffi(raw.pixelFormat)?,
        })
    }

    fn set_gige_image_settings(&mut self, settings: &GigEImageSettings) -> ci2::Result<()> {
        let raw = ffi::fc2GigEImageSettings {
            offsetX: settings.offset_x,
            offsetY: settings.offset_y,
            width: settings.width,
            height: settings.height,
            pixelFormat: pixel_format_to_ffi(settings.pixel_format),
            reserved: [0; 8],
        };
        self.camera.set_gige_image_settings(&raw).ci2err()
    }

    fn set_embedded_timestamp(&mut self, on: bool) -> ci2::Result<()> {
        self.camera.set_embedded_timestamp(on).ci2err()?;
        self.embedded_timestamp = on;
        Ok(())
    }

    fn read_register(&self, address: u32) -> ci2::Result<u32> {
        self.camera.read_register(address).ci2err()
    }

    fn write_register(&mut self, address: u32, value: u32) -> ci2::Result<()> {
        self.camera.write_register(address, value).ci2err()
    }

    fn read_gvcp_register(&self, address: u32) -> ci2::Result<u32> {
        self.camera.read_gvcp_register(address).ci2err()
    }

    fn write_gvcp_register(&mut self, address: u32, value: u32, broadcast: bool) -> ci2::Result<()> {
        self.camera
            .write_gvcp_register(address, value, broadcast)
            .ci2err()
    }

    fn acquisition_start(&mut self) -> ci2::Result<()> {
        self.camera.start_capture().ci2err()?;
        info!("      started capture");
        Ok(())
    }

    fn acquisition_stop(&mut self) -> ci2::Result<()> {
        self.camera.stop_capture().ci2err()?;
        info!("      stopped capture");
        Ok(())
    }

    fn is_acquiring(&self) -> bool {
        self.camera.is_capturing()
    }

    fn next_frame(&mut self) -> ci2::Result<RawFrame> {
        let mut im = self.camera.retrieve_buffer().ci2err()?;
        let now = chrono::Utc::now();
        let device_timestamp = if self.embedded_timestamp {
            let ts = im.timestamp();
            Some(DeviceTimestamp {
                seconds: ts.seconds,
                micro_seconds: ts.microSeconds,
                cycle_seconds: ts.cycleSeconds,
                cycle_count: ts.cycleCount,
                cycle_offset: ts.cycleOffset,
            })
        } else {
            None
        };
        let fno = self.fno;
        self.fno += 1;
        Ok(RawFrame {
            width: im.cols(),
            height: im.rows(),
            stride: im.stride(),
            pixel_format: pixel_format_from_ffi(im.pixel_format())?,
            bayer_tile: bayer_tile_from_ffi(im.bayer_format()),
            data: im.data().to_vec(), // copy data
            device_timestamp,
            host_timing: HostTimingInfo { fno, datetime: now },
        })
    }
}

// ---------------------------
// type conversions

fn convert_camera_info(orig: flycap2::CameraInfo) -> CameraInfo {
    CameraInfo {
        serial: orig.serial,
        model: orig.model,
        vendor: orig.vendor,
        sensor_info: orig.sensor_info,
        sensor_resolution: orig.sensor_resolution,
        is_color: orig.is_color,
        firmware_version: orig.firmware_version,
        ip_address: orig.ip_address,
        subnet_mask: orig.subnet_mask,
        default_gateway: orig.default_gateway,
    }
}

fn property_type_to_ffi(orig: PropertyType) -> ffi::fc2PropertyType {
    use ffi::_fc2PropertyType::*;
    match orig {
        PropertyType::Brightness => FC2_BRIGHTNESS,
        PropertyType::AutoExposure => FC2_AUTO_EXPOSURE,
        PropertyType::Sharpness => FC2_SHARPNESS,
        PropertyType::WhiteBalance => FC2_WHITE_BALANCE,
        PropertyType::Hue => FC2_HUE,
        PropertyType::Saturation => FC2_SATURATION,
        PropertyType::Gamma => FC2_GAMMA,
        PropertyType::Iris => FC2_IRIS,
        PropertyType::Focus => FC2_FOCUS,
        PropertyType::Zoom => FC2_ZOOM,
        PropertyType::Pan => FC2_PAN,
        PropertyType::Tilt => FC2_TILT,
        PropertyType::Shutter => FC2_SHUTTER,
        PropertyType::Gain => FC2_GAIN,
        PropertyType::TriggerMode => FC2_TRIGGER_MODE,
        PropertyType::TriggerDelay => FC2_TRIGGER_DELAY,
        PropertyType::FrameRate => FC2_FRAME_RATE,
        PropertyType::Temperature => FC2_TEMPERATURE,
    }
}

fn pixel_format_to_ffi(orig: PixelFormat) -> ffi::fc2PixelFormat {
    use ffi::_fc2PixelFormat::*;
    match orig {
        PixelFormat::Mono8 => FC2_PIXEL_FORMAT_MONO8,
        PixelFormat::Mono16 => FC2_PIXEL_FORMAT_MONO16,
        PixelFormat::Raw8 => FC2_PIXEL_FORMAT_RAW8,
        PixelFormat::Raw16 => FC2_PIXEL_FORMAT_RAW16,
        PixelFormat::Rgb8 => FC2_PIXEL_FORMAT_RGB8,
        PixelFormat::Bgr8 => FC2_PIXEL_FORMAT_BGR,
    }
}

fn pixel_format_from_ffi(orig: ffi::fc2PixelFormat) -> ci2::Result<PixelFormat> {
    use ffi::_fc2PixelFormat::*;
    let e = match orig {
        FC2_PIXEL_FORMAT_MONO8 => PixelFormat::Mono8,
        FC2_PIXEL_FORMAT_MONO16 => PixelFormat::Mono16,
        FC2_PIXEL_FORMAT_RAW8 => PixelFormat::Raw8,
        FC2_PIXEL_FORMAT_RAW16 => PixelFormat::Raw16,
        FC2_PIXEL_FORMAT_RGB8 => PixelFormat::Rgb8,
        FC2_PIXEL_FORMAT_BGR => PixelFormat::Bgr8,
        other => {
            return Err(ci2::Error::from(format!(
                "unimplemented pixel format 0x{other:08X}"
            )));
        }
    };
    Ok(e)
}

fn bayer_tile_from_ffi(orig: ffi::fc2BayerTileFormat) -> BayerTile {
    use ffi::_fc2BayerTileFormat::*;
    match orig {
        FC2_BT_RGGB => BayerTile::RGGB,
        FC2_BT_GRBG => BayerTile::GRBG,
        FC2_BT_GBRG => BayerTile::GBRG,
        FC2_BT_BGGR => BayerTile::BGGR,
        _ => BayerTile::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_codes_follow_declaration_order() {
        for (i, t) in PropertyType::ALL.iter().enumerate() {
            assert_eq!(property_type_to_ffi(*t), i as ffi::fc2PropertyType);
        }
    }

    #[test]
    fn pixel_format_roundtrip() {
        for fmt in [
            PixelFormat::Mono8,
            PixelFormat::Mono16,
            PixelFormat::Raw8,
            PixelFormat::Raw16,
            PixelFormat::Rgb8,
            PixelFormat::Bgr8,
        ] {
            assert_eq!(pixel_format_from_ffi(pixel_format_to_ffi(fmt)).unwrap(), fmt);
        }
        assert!(pixel_format_from_ffi(ffi::_fc2PixelFormat::FC2_PIXEL_FORMAT_411YUV8).is_err());
    }

    #[test]
    fn error_classification() {
        let timeout = flycap2::Error::from(flycap2::Fc2Error {
            code: ffi::_fc2Error::FC2_ERROR_TIMEOUT,
        });
        assert_eq!(fe2ce(timeout).kind(), ci2::ErrorKind::Timeout);

        let gone = flycap2::Error::CameraFc2 {
            guid: flycap2::Guid::new(1, 2, 3, 4),
            source: flycap2::Fc2Error {
                code: ffi::_fc2Error::FC2_ERROR_NOT_CONNECTED,
            },
        };
        assert_eq!(fe2ce(gone).kind(), ci2::ErrorKind::LinkDown);

        let other = flycap2::Error::UnparsableGuid;
        assert_eq!(fe2ce(other).kind(), ci2::ErrorKind::Other);
    }

    #[test]
    fn module_from_missing_library() {
        assert!(new_module_from_path("/nonexistent/libflycapture-c.so").is_err());
    }
}
