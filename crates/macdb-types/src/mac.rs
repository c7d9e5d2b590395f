//! MAC address type with notation-agnostic parsing and canonical formatting.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Parsing accepts the notations switches print in their tables; the
/// canonical text form is upper-case and dash separated.
///
/// # Examples
///
/// ```
/// use macdb_types::MacAddress;
///
/// let mac: MacAddress = "00:11:22:aa:bb:cc".parse().unwrap();
/// assert_eq!(mac.to_string(), "00-11-22-AA-BB-CC");
///
/// // Cisco dotted notation names the same address
/// let cisco: MacAddress = "0011.22aa.bbcc".parse().unwrap();
/// assert_eq!(mac, cisco);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this is a locally administered address.
    ///
    /// Randomized client MACs land here and have no vendor.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Colon-separated lower-case form, as OUI databases expect it.
    pub fn to_colon_string(&self) -> String {
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}-{:02X}-{:02X}-{:02X}-{:02X}-{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = if trimmed.contains(':') {
            parse_grouped(trimmed, ':', 2)
        } else if trimmed.contains('-') {
            parse_grouped(trimmed, '-', 2)
        } else if trimmed.contains('.') {
            parse_grouped(trimmed, '.', 4)
        } else {
            parse_grouped_bare(trimmed)
        };

        bytes
            .map(MacAddress)
            .ok_or_else(|| ParseError::InvalidMacAddress(s.to_string()))
    }
}

/// Parse `sep`-delimited groups of `width` hex digits into six octets.
fn parse_grouped(s: &str, sep: char, width: usize) -> Option<[u8; 6]> {
    let groups: Vec<&str> = s.split(sep).collect();
    if groups.len() * width != 12 || groups.iter().any(|g| g.len() != width) {
        return None;
    }
    decode_hex(&groups.concat())
}

fn parse_grouped_bare(s: &str) -> Option<[u8; 6]> {
    if s.len() != 12 {
        return None;
    }
    decode_hex(s)
}

fn decode_hex(digits: &str) -> Option<[u8; 6]> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut bytes = [0u8; 6];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(bytes)
}

/// Canonicalize a raw MAC token.
///
/// Fails with [`ParseError::InvalidMacAddress`] when the token does not
/// decode to exactly six octets.
pub fn normalize_mac(raw: &str) -> Result<MacAddress, ParseError> {
    raw.parse()
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}
