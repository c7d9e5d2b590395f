//! Inventory merge engine
//!
//! Folds observations into the ordered entry collection under the
//! inventory's non-overwrite rules.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Deduplicated device inventory
//! - AU-12: Audit Record Generation - Log every insert and update
//! - SI-4: System Monitoring - First sighting of a MAC raises an alert

use crate::entry::{Entry, timestamp_now};
use crate::error::Downgrade;
use crate::notify::Notifier;
use crate::vendor::VendorLookup;
use macdb_types::MacAddress;
use std::collections::HashMap;
use tracing::{debug, info};

/// What [`Inventory::update`] did with an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// MAC was not in the inventory; a new entry was appended
    Inserted,
    /// MAC was already known; its entry was updated in place
    Updated,
}

/// Counters for one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    /// Rows dropped because their MAC did not parse
    pub rejected: usize,
    /// Rows describing the device's own interfaces
    pub skipped_self: usize,
}

impl MergeStats {
    pub fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Updated => self.updated += 1,
        }
    }

    pub fn absorb(&mut self, other: MergeStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.rejected += other.rejected;
        self.skipped_self += other.skipped_self;
    }
}

/// Ordered collection of entries with exactly one entry per MAC.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    entries: Vec<Entry>,
    index: HashMap<MacAddress, usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from already-canonical entries.
    ///
    /// A MAC that appears more than once is folded into its first
    /// occurrence with the regular merge rules, keeping the most recent
    /// non-empty `last_seen` of the two.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let mut inventory = Self::new();
        for entry in entries {
            match inventory.index.get(&entry.mac) {
                Some(&pos) => {
                    debug!(mac = %entry.mac, "Folding duplicate stored entry");
                    let existing = &mut inventory.entries[pos];
                    let last_seen = existing.last_seen.clone().max(entry.last_seen.clone());
                    fold_into(existing, entry, &last_seen);
                }
                None => inventory.push(entry),
            }
        }
        inventory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn get(&self, mac: &MacAddress) -> Option<&Entry> {
        self.index.get(mac).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.index.contains_key(mac)
    }

    /// Merge `candidate` using the current local time.
    pub fn update(&mut self, candidate: Entry, notifier: Option<&dyn Notifier>) -> MergeOutcome {
        self.update_at(candidate, &timestamp_now(), notifier)
    }

    /// Merge `candidate`, stamping it with `now`.
    ///
    /// New MAC: keep the candidate's `date` (or `now` if unset), set
    /// `last_seen = now`, append, then notify. Notification failure is
    /// logged and never affects the inventory.
    ///
    /// Known MAC: union IPs, overwrite `port`/`port_description` only with
    /// non-empty values, fill `date` only if unset, never touch a
    /// non-empty `company`, always set `last_seen = now`.
    pub fn update_at(
        &mut self,
        mut candidate: Entry,
        now: &str,
        notifier: Option<&dyn Notifier>,
    ) -> MergeOutcome {
        if let Some(&pos) = self.index.get(&candidate.mac) {
            let entry = &mut self.entries[pos];
            fold_into(entry, candidate, now);
            debug!(mac = %entry.mac, port = %entry.port, "Updated entry");
            return MergeOutcome::Updated;
        }

        if candidate.date.is_empty() {
            candidate.date = now.to_string();
        }
        candidate.last_seen = now.to_string();
        info!(
            mac = %candidate.mac,
            port = %candidate.port,
            vendor = %candidate.company,
            "New MAC address"
        );
        self.push(candidate);

        if let Some(notifier) = notifier {
            let entry = &self.entries[self.entries.len() - 1];
            notifier.notify_new_mac(entry).or_logged("notify");
        }

        MergeOutcome::Inserted
    }

    /// Resolve vendors for entries whose `company` is still empty.
    ///
    /// Locally administered MACs have no OUI and are left alone. Returns
    /// the number of entries that gained a vendor.
    pub fn backfill_vendors(&mut self, lookup: &dyn VendorLookup) -> usize {
        let mut filled = 0;
        let pending = self
            .entries
            .iter_mut()
            .filter(|e| e.company.is_empty() && !e.mac.is_local());
        for entry in pending {
            let company = lookup.lookup(&entry.mac).or_logged("vendor backfill");
            if !company.is_empty() {
                debug!(mac = %entry.mac, vendor = %company, "Backfilled vendor");
                entry.company = company;
                filled += 1;
            }
        }
        filled
    }

    fn push(&mut self, entry: Entry) {
        self.index.insert(entry.mac, self.entries.len());
        self.entries.push(entry);
    }
}

/// Apply the existing-MAC merge rules of `observation` onto `entry`.
fn fold_into(entry: &mut Entry, observation: Entry, now: &str) {
    for ip in observation.ip {
        if !entry.ip.contains(&ip) {
            entry.ip.push(ip);
        }
    }
    if !observation.port.is_empty() {
        entry.port = observation.port;
    }
    if !observation.port_description.is_empty() {
        entry.port_description = observation.port_description;
    }
    if entry.company.is_empty() && !observation.company.is_empty() {
        entry.company = observation.company;
    }
    if entry.date.is_empty() {
        entry.date = now.to_string();
    }
    entry.last_seen = now.to_string();
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
