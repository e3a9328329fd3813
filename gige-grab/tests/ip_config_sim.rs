use std::{net::Ipv4Addr, time::Duration};

use test_log::test;

use ci2::{
    CameraInfo, CameraModule,
    registers::{GVCP_PERSISTENT_GATEWAY, GVCP_PERSISTENT_IP},
};
use ci2_sim::{SimCamera, SimCameraConfig, SimEvent, SimModule};
use gige_grab::ip_config;

fn two_cameras() -> SimModule {
    let a = SimCameraConfig {
        frame_period: Duration::from_millis(1),
        ..Default::default()
    };
    let b = SimCameraConfig {
        serial: 17000001,
        ip_address: Ipv4Addr::new(169, 254, 0, 11),
        default_gateway: Ipv4Addr::new(192, 168, 0, 1),
        forced_ip_address: Ipv4Addr::new(192, 168, 0, 11),
        ..a.clone()
    };
    SimModule::new(vec![a, b])
}

#[test]
fn forced_addresses_are_stored() {
    let mut module = two_cameras();
    let stored = ip_config::run(&mut module, false).unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].serial, 16452901);
    assert_eq!(stored[0].previous_ip, Ipv4Addr::UNSPECIFIED);
    assert_eq!(stored[0].ip, Ipv4Addr::new(192, 168, 0, 10));
    assert_eq!(stored[1].ip, Ipv4Addr::new(192, 168, 0, 11));
    assert_eq!(stored[1].gateway, Ipv4Addr::new(192, 168, 0, 1));

    // The first octet is the least significant byte.
    assert_eq!(
        module.gvcp_register(16452901, GVCP_PERSISTENT_IP),
        Some(0x0A00_A8C0)
    );
    assert_eq!(
        module.gvcp_register(17000001, GVCP_PERSISTENT_GATEWAY),
        Some(0x0100_A8C0)
    );

    let events = module.events();
    assert_eq!(events.first(), Some(&SimEvent::ForceIpAddresses));
    let writes: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SimEvent::WriteGvcpRegister { .. }))
        .collect();
    assert_eq!(writes.len(), 4);
    assert!(
        writes
            .iter()
            .all(|e| matches!(e, SimEvent::WriteGvcpRegister { broadcast: true, .. }))
    );
}

#[test]
fn second_run_reports_previous_values() {
    let mut module = two_cameras();
    ip_config::run(&mut module, false).unwrap();
    let stored = ip_config::store_ips(&mut module, false).unwrap();
    assert_eq!(stored[0].previous_ip, Ipv4Addr::new(192, 168, 0, 10));
    assert_eq!(stored[1].previous_gateway, Ipv4Addr::new(192, 168, 0, 1));
}

#[test]
fn dry_run_changes_nothing() {
    let mut module = two_cameras();
    let stored = ip_config::run(&mut module, true).unwrap();

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].ip, Ipv4Addr::new(169, 254, 0, 10));
    assert_eq!(module.gvcp_register(16452901, GVCP_PERSISTENT_IP), None);
    assert!(module.events().iter().all(|e| matches!(
        e,
        SimEvent::Connected { .. } | SimEvent::Disconnected { .. }
    )));
}

#[test]
fn no_cameras() {
    let mut module = SimModule::new(Vec::new());
    assert_eq!(ip_config::print_all_camera_info(&module), 0);
    assert!(ip_config::run(&mut module, false).unwrap().is_empty());
}

/// Cameras on a foreign subnet: listing and connecting fail until their
/// addresses have been forced.
struct UnreachableUntilForced {
    inner: SimModule,
    forced: bool,
}

impl UnreachableUntilForced {
    fn check(&self) -> ci2::Result<()> {
        if self.forced {
            Ok(())
        } else {
            Err(ci2::Error::from("failed to connect to camera"))
        }
    }
}

impl CameraModule for UnreachableUntilForced {
    type CameraType = SimCamera;

    fn name(&self) -> &str {
        "unreachable-until-forced"
    }
    fn camera_infos(&self) -> ci2::Result<Vec<CameraInfo>> {
        self.check()?;
        self.inner.camera_infos()
    }
    fn camera_by_serial(&mut self, serial: u32) -> ci2::Result<SimCamera> {
        self.check()?;
        self.inner.camera_by_serial(serial)
    }
    fn camera_by_index(&mut self, index: usize) -> ci2::Result<SimCamera> {
        self.check()?;
        self.inner.camera_by_index(index)
    }
    fn force_all_ip_addresses(&mut self) -> ci2::Result<()> {
        self.inner.force_all_ip_addresses()?;
        self.forced = true;
        Ok(())
    }
}

#[test]
fn listing_error_does_not_prevent_forcing() {
    let mut module = UnreachableUntilForced {
        inner: two_cameras(),
        forced: false,
    };
    assert_eq!(ip_config::print_all_camera_info(&module), 0);

    let stored = ip_config::run(&mut module, false).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].ip, Ipv4Addr::new(192, 168, 0, 10));
    assert_eq!(
        module.inner.events().first(),
        Some(&SimEvent::ForceIpAddresses)
    );
    assert_eq!(
        module.inner.gvcp_register(17000001, GVCP_PERSISTENT_IP),
        Some(0x0B00_A8C0)
    );
}

#[test]
fn unreachable_cameras_are_skipped_when_storing() {
    let mut module = UnreachableUntilForced {
        inner: two_cameras(),
        forced: false,
    };
    assert!(ip_config::store_ips(&mut module, false).unwrap().is_empty());
    assert!(module.inner.events().is_empty());
}
