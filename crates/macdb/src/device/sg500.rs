//! Cisco SG500 small-business switch table access.

use super::{DeviceSession, DeviceTables};
use crate::error::Result;
use crate::parser::{PortDescriptions, TableSpec, is_rule_line, parse_table};
use crate::record::RawRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::instrument;

pub const MAC_TABLE_CMD: &str = "show mac address-table";
pub const ARP_CMD: &str = "show arp";
pub const DESCRIPTION_CMD: &str = "show interface description";

pub const MAC_TABLE: TableSpec = TableSpec {
    name: "sg500 mac address-table",
    header_lines: 5,
    columns: &["vlan", "mac", "port", "type"],
    rest_column: false,
    rewrite: None,
    skip_line: is_rule_line,
};

pub const ARP_TABLE: TableSpec = TableSpec {
    name: "sg500 arp",
    header_lines: 5,
    columns: &["vlan", "vlan_number", "interface", "ip", "mac", "status"],
    rest_column: false,
    rewrite: Some(fill_blank_interface),
    skip_line: is_rule_line,
};

pub const DESCRIPTION_TABLE: TableSpec = TableSpec {
    name: "sg500 interface description",
    header_lines: 2,
    columns: &["port", "description"],
    rest_column: true,
    rewrite: None,
    skip_line: is_rule_line,
};

/// An ARP entry learned on a VLAN interface leaves the interface column as
/// a run of 12 spaces, which would shift every later column left.
static BLANK_INTERFACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {12}").expect("Invalid regex pattern"));

fn fill_blank_interface(text: &str) -> Cow<'_, str> {
    BLANK_INTERFACE_RE.replace_all(text, " unknown")
}

pub struct Sg500Device<S> {
    name: String,
    session: S,
}

impl<S: DeviceSession> Sg500Device<S> {
    pub fn new(name: impl Into<String>, session: S) -> Self {
        Self {
            name: name.into(),
            session,
        }
    }
}

impl<S: DeviceSession> DeviceTables for Sg500Device<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn self_type(&self) -> &'static str {
        "self"
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_mac_table(&mut self) -> Result<Vec<RawRecord>> {
        let output = self.session.send_command(MAC_TABLE_CMD)?;
        Ok(parse_table(&output, &MAC_TABLE))
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_arp_table(&mut self) -> Result<Vec<RawRecord>> {
        let output = self.session.send_command(ARP_CMD)?;
        Ok(parse_table(&output, &ARP_TABLE))
    }

    #[instrument(skip(self), fields(device = %self.name))]
    fn fetch_port_descriptions(&mut self) -> Result<PortDescriptions> {
        let output = self.session.send_command(DESCRIPTION_CMD)?;
        Ok(PortDescriptions::from_records(&parse_table(
            &output,
            &DESCRIPTION_TABLE,
        )))
    }

    fn disconnect(&mut self) -> Result<()> {
        self.session.disconnect()
    }
}
