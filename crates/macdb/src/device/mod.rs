//! Per-vendor table access.
//!
//! Every supported device family implements [`DeviceTables`]: fetch the
//! MAC-address table, the ARP table(s) and the port descriptions, each as
//! parsed [`RawRecord`]s with shared column names (`mac`, `port`, `type`,
//! `ip`). The collector drives any implementation through the same merge
//! path.
//!
//! ```text
//!   DeviceSession ──> IosDevice / Sg500Device ──> RawRecord ──> collector
//!   (transport)       (commands + TableSpec)
//! ```

mod ios;
mod session;
mod sg500;

pub use ios::IosDevice;
pub use session::{CapturedSession, CommandSession, DeviceSession, MemorySession, capture_file_name};
pub use sg500::Sg500Device;

use crate::error::{MacdbError, Result};
use crate::parser::PortDescriptions;
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Cisco IOS switches (`show mac-address-table` / `show ip arp`)
    Ios,
    /// Cisco SG500 small-business switches
    Sg500,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vendor::Ios => "ios",
            Vendor::Sg500 => "sg500",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Vendor {
    type Err = MacdbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Vendor::Ios),
            "sg500" => Ok(Vendor::Sg500),
            other => Err(MacdbError::Config(format!("unknown vendor: {}", other))),
        }
    }
}

/// Table access for one device.
pub trait DeviceTables {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// `type` value this vendor uses for the switch's own interface MACs.
    fn self_type(&self) -> &'static str;

    /// MAC-address table rows with at least `mac`, `port` and `type`.
    fn fetch_mac_table(&mut self) -> Result<Vec<RawRecord>>;

    /// ARP rows with at least `mac` and `ip`, across every configured
    /// routing context.
    fn fetch_arp_table(&mut self) -> Result<Vec<RawRecord>>;

    /// Port name to description mapping.
    fn fetch_port_descriptions(&mut self) -> Result<PortDescriptions>;

    /// Release the underlying session.
    fn disconnect(&mut self) -> Result<()>;

    /// True when a MAC-table row describes the device itself.
    fn is_self_row(&self, record: &RawRecord) -> bool {
        record
            .get(crate::parser::COL_TYPE)
            .is_some_and(|t| t.eq_ignore_ascii_case(self.self_type()))
    }
}

/// Build the table accessor for `vendor` on top of `session`.
pub fn open_device(
    vendor: Vendor,
    name: impl Into<String>,
    session: Box<dyn DeviceSession>,
    vrfs: Vec<String>,
) -> Box<dyn DeviceTables> {
    match vendor {
        Vendor::Ios => Box::new(IosDevice::new(name, session, vrfs)),
        Vendor::Sg500 => Box::new(Sg500Device::new(name, session)),
    }
}

impl<S: DeviceSession + ?Sized> DeviceSession for Box<S> {
    fn send_command(&mut self, command: &str) -> Result<String> {
        (**self).send_command(command)
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}
