//! Camera register addresses and value encodings.
//!
//! These are IIDC-style control registers and GigE Vision (GVCP) bootstrap
//! registers. Their meaning is defined by the camera, the helpers here only
//! pack and unpack the values.
use std::net::Ipv4Addr;

use crate::{Error, Result};

/// White balance control register.
pub const WHITE_BALANCE: u32 = 0x80C;

/// Set when the white balance feature is present. Writing it alone selects
/// the feature before the value is written.
pub const WB_PRESENCE: u32 = 1 << 31;
/// White balance on (set) or off (clear).
pub const WB_ON_OFF: u32 = 1 << 25;
/// Automatic (set) or manual (clear) white balance.
pub const WB_AUTO: u32 = 1 << 24;

const WB_BLUE_SHIFT: u32 = 12;
/// Largest value of one 12 bit white balance component.
pub const WB_COMPONENT_MAX: u16 = 0xFFF;

/// Persistent IP address, used by the camera at power up.
pub const GVCP_PERSISTENT_IP: u32 = 0x64C;
/// Persistent default gateway, used by the camera at power up.
pub const GVCP_PERSISTENT_GATEWAY: u32 = 0x66C;

/// Contents of the [WHITE_BALANCE] register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhiteBalance {
    /// Blue component, bits 12..24.
    pub blue: u16,
    /// Red component, bits 0..12.
    pub red: u16,
    pub on: bool,
    pub auto: bool,
}

impl WhiteBalance {
    pub fn register_value(&self) -> Result<u32> {
        for (name, v) in [("blue", self.blue), ("red", self.red)] {
            if v > WB_COMPONENT_MAX {
                return Err(Error::InvalidSetting(format!(
                    "white balance {name} value {v} exceeds {WB_COMPONENT_MAX}"
                )));
            }
        }
        let mut value = (u32::from(self.blue) << WB_BLUE_SHIFT) | u32::from(self.red);
        if self.on {
            value |= WB_ON_OFF;
        }
        if self.auto {
            value |= WB_AUTO;
        }
        Ok(value)
    }

    pub fn from_register_value(value: u32) -> Self {
        let mask = u32::from(WB_COMPONENT_MAX);
        Self {
            blue: ((value >> WB_BLUE_SHIFT) & mask) as u16,
            red: (value & mask) as u16,
            on: value & WB_ON_OFF != 0,
            auto: value & WB_AUTO != 0,
        }
    }
}

/// Encode an address for a GVCP IP register. The first octet goes in the
/// least significant byte.
pub fn ip_to_register(ip: Ipv4Addr) -> u32 {
    u32::from_le_bytes(ip.octets())
}

pub fn ip_from_register(value: u32) -> Ipv4Addr {
    Ipv4Addr::from(value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_balance_encoding() {
        let wb = WhiteBalance {
            blue: 800,
            red: 550,
            on: true,
            auto: true,
        };
        let value = wb.register_value().unwrap();
        assert_eq!(value, 0x0332_0226);
        assert_eq!(WhiteBalance::from_register_value(value), wb);

        let manual_off = WhiteBalance {
            on: false,
            auto: false,
            ..wb
        };
        assert_eq!(manual_off.register_value().unwrap(), 0x0032_0226);
    }

    #[test]
    fn white_balance_out_of_range() {
        let wb = WhiteBalance {
            blue: 4096,
            red: 0,
            on: true,
            auto: false,
        };
        assert!(matches!(wb.register_value(), Err(Error::InvalidSetting(_))));
        let wb = WhiteBalance {
            blue: 4095,
            red: 4095,
            on: false,
            auto: false,
        };
        assert_eq!(wb.register_value().unwrap(), 0x00FF_FFFF);
    }

    #[test]
    fn ip_octet_order() {
        let ip = Ipv4Addr::new(192, 168, 1, 20);
        assert_eq!(ip_to_register(ip), 0x1401_A8C0);
        assert_eq!(ip_from_register(0x1401_A8C0), ip);
        let gw = Ipv4Addr::new(10, 0, 0, 1);
        assert_eq!(ip_from_register(ip_to_register(gw)), gw);
    }
}
