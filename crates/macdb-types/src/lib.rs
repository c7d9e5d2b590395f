//! Address types for the macdb inventory.
//!
//! Every observation coming off a switch passes through this crate before
//! it reaches the inventory:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC address with a single canonical
//!   text form, whatever notation the device printed
//! - [`IpAddress`]: IPv4 or IPv6 address in its normalized text form
//! - [`normalize_mac`], [`normalize_ip`], [`normalize_ips`]: the
//!   normalizer entry points used by the parsers and the JSON store

mod ip;
mod mac;

pub use ip::{IpAddress, normalize_ip, normalize_ips};
pub use mac::{MacAddress, normalize_mac};

/// Common error type for address parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),
}
