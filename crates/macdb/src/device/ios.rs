//! Cisco IOS table access.

use super::{DeviceSession, DeviceTables};
use crate::error::Result;
use crate::parser::{COL_PORT, PortDescriptions, TableSpec, is_rule_line, parse_table};
use crate::record::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::{debug, instrument};

pub const MAC_TABLE_CMD: &str = "show mac-address-table";
pub const ARP_CMD: &str = "show ip arp";
pub const DESCRIPTION_CMD: &str = "show interfaces description";

/// `Destination Address  Address Type  VLAN  Destination Port`
pub const MAC_TABLE: TableSpec = TableSpec {
    name: "ios mac-address-table",
    header_lines: 2,
    columns: &["mac", "type", "vlan", "port"],
    rest_column: false,
    rewrite: None,
    skip_line: skip_mac_table_line,
};

/// `Protocol  Address  Age (min)  Hardware Addr  Type  Interface`
pub const ARP_TABLE: TableSpec = TableSpec {
    name: "ios ip arp",
    header_lines: 1,
    columns: &["protocol", "ip", "age", "mac", "type", "interface"],
    rest_column: false,
    rewrite: None,
    skip_line: is_rule_line,
};

/// `Interface  Status  Protocol  Description`
pub const DESCRIPTION_TABLE: TableSpec = TableSpec {
    name: "ios interfaces description",
    header_lines: 1,
    columns: &["port", "status", "protocol", "description"],
    rest_column: true,
    rewrite: Some(join_admin_down),
    skip_line: is_rule_line,
};

/// The status column prints `admin down` as two words.
static ADMIN_DOWN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\badmin down\b").expect("Invalid regex pattern"));

fn join_admin_down(text: &str) -> Cow<'_, str> {
    ADMIN_DOWN_RE.replace_all(text, "admin-down")
}

/// `show interfaces description` abbreviates names (`Fa0/1`); the MAC
/// table prints them in full (`FastEthernet0/1`).
static SHORT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d.*)$").expect("Invalid regex pattern"));

const INTERFACE_PREFIXES: &[(&str, &str)] = &[
    ("Fa", "FastEthernet"),
    ("Gi", "GigabitEthernet"),
    ("Tw", "TwoGigabitEthernet"),
    ("Te", "TenGigabitEthernet"),
    ("Fo", "FortyGigabitEthernet"),
    ("Hu", "HundredGigE"),
    ("Et", "Ethernet"),
    ("Po", "Port-channel"),
    ("Vl", "Vlan"),
    ("Lo", "Loopback"),
    ("Tu", "Tunnel"),
];

/// Full IOS interface name for an abbreviated one; other names pass through.
pub fn expand_interface_name(port: &str) -> Cow<'_, str> {
    let Some(caps) = SHORT_NAME_RE.captures(port) else {
        return Cow::Borrowed(port);
    };
    let (prefix, number) = (&caps[1], &caps[2]);
    INTERFACE_PREFIXES
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(prefix))
        .map_or(Cow::Borrowed(port), |(_, full)| {
            Cow::Owned(format!("{}{}", full, number))
        })
}

fn skip_mac_table_line(line: &str) -> bool {
    is_rule_line(line) || line.trim_start().starts_with("Total")
}

/// Table access for a Cisco IOS switch.
///
/// Besides the global ARP table, one ARP table is read per configured VRF.
pub struct IosDevice<S> {
    name: String,
    session: S,
    vrfs: Vec<String>,
}

impl<S: DeviceSession> IosDevice<S> {
    pub fn new(name: impl Into<String>, session: S, vrfs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            session,
            vrfs,
        }
    }

    fn arp_commands(&self) -> Vec<String> {
        std::iter::once(ARP_CMD.to_string())
            .chain(self.vrfs.iter().map(|vrf| format!("{} vrf {}", ARP_CMD, vrf)))
            .collect()
    }
}

impl<S: DeviceSession> DeviceTables for IosDevice<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn self_type(&self) -> &'static str {
        "Self"
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_mac_table(&mut self) -> Result<Vec<RawRecord>> {
        let output = self.session.send_command(MAC_TABLE_CMD)?;
        Ok(parse_table(&output, &MAC_TABLE))
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_arp_table(&mut self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for command in self.arp_commands() {
            let output = self.session.send_command(&command)?;
            let rows = parse_table(&output, &ARP_TABLE);
            debug!(command, rows = rows.len(), "Read ARP table");
            records.extend(rows);
        }
        Ok(records)
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_port_descriptions(&mut self) -> Result<PortDescriptions> {
        let output = self.session.send_command(DESCRIPTION_CMD)?;
        let mut records = parse_table(&output, &DESCRIPTION_TABLE);
        for record in &mut records {
            if let Some(port) = record.get(COL_PORT) {
                let full = expand_interface_name(port).into_owned();
                record.insert(COL_PORT, full);
            }
        }
        Ok(PortDescriptions::from_records(&records))
    }

    fn disconnect(&mut self) -> Result<()> {
        self.session.disconnect()
    }
}
