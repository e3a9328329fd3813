//! Make the automatically assigned camera addresses persistent.
use std::net::Ipv4Addr;

use tracing::{error, info, warn};

use ci2::{
    Camera, CameraInfo, CameraModule,
    registers::{self, ip_from_register, ip_to_register},
};

use crate::Result;

fn log_camera_info(index: usize, info: &CameraInfo) {
    info!(
        "[{index}]Serial: {}, Model: {}, Vendor: {}, Sensor: {}, Resolution: {}, Color: {}, Firmware Version: {}",
        info.serial,
        info.model,
        info.vendor,
        info.sensor_info,
        info.sensor_resolution,
        info.is_color,
        info.firmware_version
    );
    info!(
        "  IP: {} Sub: {} GW: {}",
        info.ip_address, info.subnet_mask, info.default_gateway
    );
}

fn log_no_cameras() {
    info!("No PointGrey cameras detected on this computer.");
    info!("Note that you may need to restart udev and replug your camera, eg:");
    info!("  sudo service udev restart");
}

/// List the cameras, logging and swallowing any error.
///
/// A camera with an address outside the host's subnet can fail to answer
/// until its address has been forced.
fn camera_infos_or_log<M: CameraModule>(module: &M) -> Vec<CameraInfo> {
    module.camera_infos().unwrap_or_else(|e| {
        error!("There was an error checking the active cameras: {e}");
        Vec::new()
    })
}

/// Log every camera found. Returns their number.
pub fn print_all_camera_info<M: CameraModule>(module: &M) -> usize {
    info!("Getting camera info...");
    let infos = camera_infos_or_log(module);
    if infos.is_empty() {
        log_no_cameras();
    } else {
        info!("Number of cameras found: {}", infos.len());
        for (i, info) in infos.iter().enumerate() {
            log_camera_info(i, info);
        }
    }
    infos.len()
}

pub fn assign_ips<M: CameraModule>(module: &mut M) -> Result<()> {
    info!("Forcing IPs...");
    module.force_all_ip_addresses()?;
    Ok(())
}

/// Persistent addresses of one camera, before [store_ips] changed them.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIp {
    pub serial: u32,
    pub previous_ip: Ipv4Addr,
    pub previous_gateway: Ipv4Addr,
    pub ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
}

/// Copy each camera's current IP address and gateway into its persistent
/// GVCP registers.
///
/// The writes are broadcast so they reach cameras whose address is not
/// routable. With `dry_run` the registers are only read. Cameras that
/// cannot be listed or connected are skipped.
pub fn store_ips<M: CameraModule>(module: &mut M, dry_run: bool) -> Result<Vec<StoredIp>> {
    info!("Saving IPs...");
    let n_cams = camera_infos_or_log(module).len();
    if n_cams == 0 {
        log_no_cameras();
        return Ok(Vec::new());
    }

    let mut stored = Vec::with_capacity(n_cams);
    for i in 0..n_cams {
        let mut camera = match module.camera_by_index(i) {
            Ok(camera) => camera,
            Err(e) => {
                warn!("[{i}]cannot connect, not storing IP: {e}");
                continue;
            }
        };
        let info = camera.camera_info()?;

        let previous_ip = ip_from_register(camera.read_gvcp_register(registers::GVCP_PERSISTENT_IP)?);
        let previous_gateway =
            ip_from_register(camera.read_gvcp_register(registers::GVCP_PERSISTENT_GATEWAY)?);
        info!("[{i}]IP register: {previous_ip} GW: {previous_gateway}");

        if dry_run {
            info!(
                "[{i}]would store IP: {} GW: {}",
                info.ip_address, info.default_gateway
            );
        } else {
            camera.write_gvcp_register(
                registers::GVCP_PERSISTENT_IP,
                ip_to_register(info.ip_address),
                true,
            )?;
            camera.write_gvcp_register(
                registers::GVCP_PERSISTENT_GATEWAY,
                ip_to_register(info.default_gateway),
                true,
            )?;
        }

        stored.push(StoredIp {
            serial: info.serial,
            previous_ip,
            previous_gateway,
            ip: info.ip_address,
            gateway: info.default_gateway,
        });
    }
    Ok(stored)
}

/// List cameras, force their addresses, persist them and list again.
pub fn run<M: CameraModule>(module: &mut M, dry_run: bool) -> Result<Vec<StoredIp>> {
    print_all_camera_info(module);
    if dry_run {
        info!("Dry run: not forcing IPs");
    } else {
        assign_ips(module)?;
    }
    let stored = store_ips(module, dry_run)?;
    print_all_camera_info(module);
    Ok(stored)
}
