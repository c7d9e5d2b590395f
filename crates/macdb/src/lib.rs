//! MAC Address Inventory
//!
//! Builds a deduplicated inventory of the MAC addresses seen on a switched
//! network. Switch MAC-address and ARP tables are read over a device
//! session, parsed per vendor, and folded into one entry per MAC with port
//! location, port description, vendor name and known IPs. The inventory is
//! persisted as a JSON array and every first sighting raises an alert.
//!
//! NIST 800-53 Rev5 [CM-8]: System Component Inventory - Canonical MAC inventory
//! NIST 800-53 Rev5 [SI-4]: System Monitoring - New device alerting

pub mod collector;
pub mod config_file;
pub mod device;
pub mod entry;
pub mod error;
pub mod merge;
pub mod notify;
pub mod parser;
pub mod record;
pub mod store;
pub mod vendor;

pub use collector::collect;
pub use config_file::{DeviceConfig, InventoryConfig, MacdbConfig, NotifyConfig, TransportConfig};
pub use device::{DeviceSession, DeviceTables, Vendor, open_device};
pub use entry::{Entry, EntryBuilder, timestamp_now};
pub use error::*;
pub use merge::{Inventory, MergeOutcome, MergeStats};
pub use notify::{GotifyNotifier, Notifier};
pub use parser::{PortDescriptions, TableSpec, parse_table};
pub use record::RawRecord;
pub use vendor::{NoVendorLookup, OuiVendorLookup, VendorLookup};

pub use macdb_types::{IpAddress, MacAddress, ParseError, normalize_ip, normalize_ips, normalize_mac};
