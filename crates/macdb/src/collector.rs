//! Device collection pass
//!
//! Drains one device: port descriptions, MAC-address table and ARP
//! table(s) are fetched, joined and folded into the inventory through the
//! shared merge engine, then the session is released.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Every learned MAC becomes an entry
//! - IA-3: Device Identification - Port and IP association per MAC
//! - AU-12: Audit Record Generation - Per-device merge statistics

use crate::device::DeviceTables;
use crate::entry::{Entry, EntryBuilder};
use crate::error::{Downgrade, Result};
use crate::merge::{Inventory, MergeStats};
use crate::notify::Notifier;
use crate::parser::{COL_IP, COL_MAC, COL_PORT, PortDescriptions};
use crate::record::RawRecord;
use crate::vendor::VendorLookup;
use macdb_types::{MacAddress, normalize_ips, normalize_mac};
use tracing::{debug, info, instrument, warn};

/// Collect every table from `device` into `inventory`.
///
/// The device is disconnected whether or not the fetches succeed. A fetch
/// error aborts this device and is returned; rows merged before it stay.
#[instrument(skip_all, fields(device = %device.name()))]
pub fn collect(
    inventory: &mut Inventory,
    device: &mut dyn DeviceTables,
    lookup: &dyn VendorLookup,
    notifier: Option<&dyn Notifier>,
) -> Result<MergeStats> {
    let result = merge_tables(inventory, device, lookup, notifier);
    device.disconnect().or_logged("disconnect");

    let stats = result?;
    info!(
        inserted = stats.inserted,
        updated = stats.updated,
        rejected = stats.rejected,
        skipped_self = stats.skipped_self,
        total = inventory.len(),
        "Device collected"
    );
    Ok(stats)
}

fn merge_tables(
    inventory: &mut Inventory,
    device: &mut dyn DeviceTables,
    lookup: &dyn VendorLookup,
    notifier: Option<&dyn Notifier>,
) -> Result<MergeStats> {
    let descriptions = device.fetch_port_descriptions()?;
    let mac_rows = device.fetch_mac_table()?;
    let arp_rows = device.fetch_arp_table()?;
    let mut stats = MergeStats::default();

    for row in &mac_rows {
        if device.is_self_row(row) {
            stats.skipped_self += 1;
            continue;
        }
        let Some(mac) = row_mac(row) else {
            stats.rejected += 1;
            continue;
        };

        let port = row.get(COL_PORT).unwrap_or_default();
        let candidate = observation(mac)
            .port(port)
            .port_description(describe(&descriptions, port));
        let candidate = finish(inventory, candidate, lookup);
        stats.record(inventory.update(candidate, notifier));
    }

    for row in &arp_rows {
        let Some(mac) = row_mac(row) else {
            stats.rejected += 1;
            continue;
        };

        let ip = normalize_ips(row.get(COL_IP));
        let candidate = finish(inventory, observation(mac).ip(ip), lookup);
        stats.record(inventory.update(candidate, notifier));
    }

    Ok(stats)
}

/// Table rows carry no first-seen date; the merge stamps new entries.
fn observation(mac: MacAddress) -> EntryBuilder {
    Entry::builder(mac).date("")
}

fn row_mac(row: &RawRecord) -> Option<MacAddress> {
    let raw = row.get(COL_MAC).unwrap_or_default();
    match normalize_mac(raw) {
        Ok(mac) => Some(mac),
        Err(e) => {
            warn!(row = %row, error = %e, "Cannot parse row");
            None
        }
    }
}

fn describe(descriptions: &PortDescriptions, port: &str) -> String {
    if port.is_empty() {
        return String::new();
    }
    descriptions.describe(port).or_debug("port description")
}

/// Known entries with a vendor skip the lookup; it could not change them.
fn finish(
    inventory: &Inventory,
    candidate: EntryBuilder,
    lookup: &dyn VendorLookup,
) -> Entry {
    let known_vendor = inventory
        .get(candidate.mac())
        .is_some_and(|entry| !entry.company.is_empty());
    if known_vendor {
        debug!(mac = %candidate.mac(), "Vendor already known");
        candidate.build_without_lookup()
    } else {
        candidate.build(lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{IosDevice, MemorySession, Sg500Device};
    use crate::error::MacdbError;
    use crate::notify::MockNotifier;
    use crate::vendor::MockVendorLookup;
    use pretty_assertions::assert_eq;

    const IOS_MAC_TABLE: &str = "\
Destination Address  Address Type  VLAN  Destination Port
-------------------  ------------  ----  --------------------
0008.e3ff.fc28       Self          1     Vlan1
0010.7b3b.1a10       Dynamic       1     FastEthernet0/1
00d0.2bd4.3f01       Dynamic       10    FastEthernet0/2
";

    const IOS_ARP: &str = "\
Protocol  Address          Age (min)  Hardware Addr   Type   Interface
Internet  10.0.0.21              12   0010.7b3b.1a10  ARPA   Vlan1
Internet  10.0.0.22               4   0010.7b3b.1a10  ARPA   Vlan1
Internet  10.0.0.99               0   Incomplete      ARPA
";

    const IOS_DESCRIPTIONS: &str = "\
Interface                      Status         Protocol Description
Fa0/1                          up             up       Front desk
";

    fn ios_session() -> MemorySession {
        MemorySession::new()
            .with_output("show mac-address-table", IOS_MAC_TABLE)
            .with_output("show ip arp", IOS_ARP)
            .with_output("show interfaces description", IOS_DESCRIPTIONS)
    }

    fn vendor(company: &'static str) -> MockVendorLookup {
        let mut lookup = MockVendorLookup::new();
        lookup
            .expect_lookup()
            .returning(move |_| Ok(company.to_string()));
        lookup
    }

    #[test]
    fn test_self_rows_are_not_merged() {
        let mut inventory = Inventory::new();
        let mut device = IosDevice::new("edge-1", ios_session(), Vec::new());
        let mut notifier = MockNotifier::new();
        notifier.expect_notify_new_mac().times(2).returning(|_| Ok(()));

        let stats = collect(&mut inventory, &mut device, &vendor("Cisco"), Some(&notifier)).unwrap();

        assert_eq!(stats.skipped_self, 1);
        assert_eq!(stats.inserted, 2);
        assert_eq!(inventory.len(), 2);
        assert!(!inventory.contains(&"0008.e3ff.fc28".parse().unwrap()));
    }

    #[test]
    fn test_descriptions_and_arp_are_joined() {
        let mut inventory = Inventory::new();
        let mut device = IosDevice::new("edge-1", ios_session(), Vec::new());

        let stats = collect(&mut inventory, &mut device, &vendor("Cisco"), None).unwrap();

        let host = inventory.get(&"0010.7b3b.1a10".parse().unwrap()).unwrap();
        assert_eq!(host.port, "FastEthernet0/1");
        assert_eq!(host.port_description, "Front desk");
        assert_eq!(host.company, "Cisco");
        assert_eq!(host.ip, normalize_ips(["10.0.0.21", "10.0.0.22"]));

        // no description row for this port
        let other = inventory.get(&"00d0.2bd4.3f01".parse().unwrap()).unwrap();
        assert_eq!(other.port_description, "");
        assert!(other.ip.is_empty());

        assert_eq!(stats.updated, 2);
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn test_existing_vendor_skips_lookup() {
        let mac: MacAddress = "0010.7b3b.1a10".parse().unwrap();
        let mut inventory = Inventory::from_entries(vec![
            Entry::builder(mac)
                .company("Known Vendor")
                .date("2024-01-01 00:00:00")
                .build_without_lookup(),
        ]);
        let mut lookup = MockVendorLookup::new();
        lookup
            .expect_lookup()
            .withf(move |m| *m != mac)
            .returning(|_| Ok("Other".to_string()));

        let mut device = IosDevice::new("edge-1", ios_session(), Vec::new());
        collect(&mut inventory, &mut device, &lookup, None).unwrap();

        let entry = inventory.get(&mac).unwrap();
        assert_eq!(entry.company, "Known Vendor");
        assert_eq!(entry.date, "2024-01-01 00:00:00");
        assert_eq!(entry.port, "FastEthernet0/1");
    }

    #[test]
    fn test_fetch_error_aborts_device_and_disconnects() {
        let session = MemorySession::new()
            .with_output("show interface description", "Port Description\n----  ----\n");
        let mut device = Sg500Device::new("branch", session);
        let mut inventory = Inventory::new();

        let result = collect(&mut inventory, &mut device, &vendor("x"), None);

        assert!(matches!(result, Err(MacdbError::Session(_))));
        assert!(inventory.is_empty());
        assert!(device.fetch_arp_table().is_err());
    }

    #[test]
    fn test_unknown_port_description_is_empty() {
        let descriptions = PortDescriptions::new();
        assert_eq!(describe(&descriptions, "Gi0/9"), "");
        assert_eq!(describe(&descriptions, ""), "");
    }
}
