//! Canonical inventory record, one per MAC address
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - One record per physical address
//! - IA-3: Device Identification - MAC address as identity key

use crate::error::{Downgrade, MacdbError, Result};
use crate::vendor::VendorLookup;
use chrono::Local;
use macdb_types::{IpAddress, MacAddress, normalize_ips};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Timestamp layout used for `date` and `last_seen`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persisted field names.
pub const FIELD_MAC: &str = "mac";
pub const FIELD_PORT: &str = "port";
pub const FIELD_DATE: &str = "date";
pub const FIELD_PORT_DESCRIPTION: &str = "port_description";
pub const FIELD_LAST_SEEN: &str = "last_seen";
pub const FIELD_COMPANY: &str = "company";
pub const FIELD_IP: &str = "ip";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Inventory record for a single MAC address.
///
/// Empty strings mean "unknown" for every text field, including the two
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Identity key, never changes once the entry exists
    pub mac: MacAddress,
    /// Last switch port the address was learned on
    pub port: String,
    /// Description configured on that port
    pub port_description: String,
    /// Manufacturer resolved from the OUI; first non-empty value wins
    pub company: String,
    /// Addresses seen for this MAC in ARP tables; only grows
    pub ip: Vec<IpAddress>,
    /// First-seen timestamp; written once
    pub date: String,
    /// Timestamp of the most recent observation
    pub last_seen: String,
}

impl Entry {
    /// Start building an entry for `mac`.
    pub fn builder(mac: MacAddress) -> EntryBuilder {
        EntryBuilder {
            mac,
            port: None,
            port_description: None,
            company: None,
            ip: Vec::new(),
            date: None,
            last_seen: None,
        }
    }

    /// Render as a field-complete JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(FIELD_MAC.to_string(), Value::String(self.mac.to_string()));
        map.insert(FIELD_PORT.to_string(), Value::String(self.port.clone()));
        map.insert(FIELD_DATE.to_string(), Value::String(self.date.clone()));
        map.insert(
            FIELD_PORT_DESCRIPTION.to_string(),
            Value::String(self.port_description.clone()),
        );
        map.insert(
            FIELD_LAST_SEEN.to_string(),
            Value::String(self.last_seen.clone()),
        );
        map.insert(FIELD_COMPANY.to_string(), Value::String(self.company.clone()));
        map.insert(
            FIELD_IP.to_string(),
            Value::Array(
                self.ip
                    .iter()
                    .map(|ip| Value::String(ip.to_string()))
                    .collect(),
            ),
        );
        map
    }

    /// Rebuild an entry from a JSON object written by [`Entry::to_map`].
    ///
    /// Missing text fields read as empty, invalid stored IPs are dropped, a
    /// single string `ip` reads as a one-element list, and no vendor lookup
    /// happens here. Only the `mac` field can reject the record.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let raw_mac = map
            .get(FIELD_MAC)
            .and_then(Value::as_str)
            .ok_or_else(|| MacdbError::InvalidRecord("missing \"mac\" field".to_string()))?;
        let mac: MacAddress = raw_mac.parse()?;

        let ip = match map.get(FIELD_IP) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => normalize_ips(items.iter().filter_map(Value::as_str)),
            Some(Value::String(single)) => normalize_ips([single.as_str()]),
            Some(other) => {
                warn!(mac = %mac, ip = %other, "Ignoring stored ip field");
                Vec::new()
            }
        };

        Ok(Self {
            mac,
            port: text_field(map, FIELD_PORT),
            port_description: text_field(map, FIELD_PORT_DESCRIPTION),
            company: text_field(map, FIELD_COMPANY),
            ip,
            date: text_field(map, FIELD_DATE),
            last_seen: text_field(map, FIELD_LAST_SEEN),
        })
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ips: Vec<String> = self.ip.iter().map(ToString::to_string).collect();
        write!(
            f,
            "{} port={} desc={:?} vendor={:?} ip=[{}] first={} last={}",
            self.mac,
            self.port,
            self.port_description,
            self.company,
            ips.join(","),
            self.date,
            self.last_seen
        )
    }
}

/// Builder for [`Entry`] with the inventory defaults applied in `build`.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    mac: MacAddress,
    port: Option<String>,
    port_description: Option<String>,
    company: Option<String>,
    ip: Vec<IpAddress>,
    date: Option<String>,
    last_seen: Option<String>,
}

impl EntryBuilder {
    pub fn mac(&self) -> &MacAddress {
        &self.mac
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn port_description(mut self, description: impl Into<String>) -> Self {
        self.port_description = Some(description.into());
        self
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn ip(mut self, ip: Vec<IpAddress>) -> Self {
        self.ip = ip;
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn last_seen(mut self, last_seen: impl Into<String>) -> Self {
        self.last_seen = Some(last_seen.into());
        self
    }

    /// Finish the entry, resolving `company` through `lookup` when it was
    /// not supplied. A failed lookup leaves `company` empty, and locally
    /// administered MACs are never looked up.
    pub fn build(self, lookup: &dyn VendorLookup) -> Entry {
        let company = match self.company.as_deref() {
            Some(company) if !company.is_empty() => company.to_string(),
            _ if self.mac.is_local() => String::new(),
            _ => lookup.lookup(&self.mac).or_logged("vendor lookup"),
        };
        self.finish(company)
    }

    /// Finish the entry without consulting a vendor database.
    pub fn build_without_lookup(self) -> Entry {
        let company = self.company.clone().unwrap_or_default();
        self.finish(company)
    }

    fn finish(self, company: String) -> Entry {
        Entry {
            mac: self.mac,
            port: self.port.unwrap_or_default(),
            port_description: self.port_description.unwrap_or_default(),
            company,
            ip: self.ip,
            date: self.date.unwrap_or_else(timestamp_now),
            last_seen: self.last_seen.unwrap_or_default(),
        }
    }
}
