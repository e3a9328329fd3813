use tracing::{info, warn};

use ci2::{
    Camera, CameraInfo, GigEImageSettings, GigEPropertyType, Property, PropertyType,
    registers::{self, WhiteBalance},
};

use crate::{Result, Session, config::CaptureConfig};

fn log_camera_info(info: &CameraInfo) {
    info!(
        "Serial: {} model: {} sensor: {} resolution: {}",
        info.serial, info.model, info.sensor_info, info.sensor_resolution
    );
}

/// Set a property if the camera has it.
///
/// Automatic mode is used only where both requested and supported. Returns
/// whether the property was written.
pub fn set_property<C: Camera>(
    camera: &mut C,
    property_type: PropertyType,
    auto: bool,
    value: f32,
) -> Result<bool> {
    let info = camera.property_info(property_type)?;
    if !info.present {
        warn!("Property {property_type} not available");
        return Ok(false);
    }
    let property = Property {
        present: true,
        auto_manual_mode: auto && info.auto_supported,
        abs_control: info.abs_val_supported,
        on_off: info.on_off_supported,
        abs_value: value,
        ..Property::new(property_type)
    };
    camera.set_property(&property)?;
    Ok(true)
}

/// Write the white balance register.
///
/// The presence bit is written on its own first, then the full value.
pub fn set_white_balance<C: Camera>(camera: &mut C, white_balance: &WhiteBalance) -> Result<()> {
    let value = white_balance.register_value()?;
    camera.write_register(registers::WHITE_BALANCE, registers::WB_PRESENCE)?;
    camera.write_register(registers::WHITE_BALANCE, value)?;
    Ok(())
}

/// Apply `cfg` to a connected camera.
pub fn configure<C: Camera>(session: &mut Session<C>, cfg: &CaptureConfig) -> Result<()> {
    let camera = session.camera_mut();
    log_camera_info(&camera.camera_info()?);

    info!("Setting packet size and delay");
    camera.set_gige_property(GigEPropertyType::PacketSize, cfg.gige.packet_size)?;
    camera.set_gige_property(GigEPropertyType::PacketDelay, cfg.gige.packet_delay)?;

    info!("Querying GigE image setting information...");
    let settings_info = camera.gige_image_settings_info()?;
    let settings = GigEImageSettings {
        offset_x: cfg.image.offset_x,
        offset_y: cfg.image.offset_y,
        width: cfg.image.width.unwrap_or(settings_info.max_width),
        height: cfg.image.height.unwrap_or(settings_info.max_height),
        pixel_format: cfg.image.pixel_format,
    };

    info!("Setting GigE image settings...");
    camera.set_gige_image_settings(&settings)?;
    camera.set_embedded_timestamp(cfg.embedded_timestamp)?;

    for setting in cfg.properties.iter() {
        set_property(camera, setting.property, setting.auto, setting.value)?;
    }

    set_white_balance(camera, &WhiteBalance::from(&cfg.white_balance))?;
    Ok(())
}
