//! JSON persistence for the inventory
//!
//! The on-disk form is a JSON array of field-complete entry objects, the
//! only contract shared between runs.

use crate::entry::Entry;
use crate::error::{MacdbError, Result};
use crate::merge::Inventory;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Decode a JSON array of entry records.
///
/// Records with an unparseable identity are skipped with a warning so one
/// bad row cannot lose the rest of the inventory.
pub fn from_json(text: &str) -> Result<Inventory> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(records) = value else {
        return Err(MacdbError::InvalidRecord(
            "inventory file must contain a JSON array".to_string(),
        ));
    };

    let mut entries = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let parsed = match record {
            Value::Object(map) => Entry::from_map(map),
            other => Err(MacdbError::InvalidRecord(format!(
                "expected object, got {}",
                other
            ))),
        };
        match parsed {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(position, error = %e, "Skipping stored record"),
        }
    }

    Ok(Inventory::from_entries(entries))
}

/// Encode the whole inventory as a pretty-printed JSON array.
pub fn to_json(inventory: &Inventory) -> Result<String> {
    let records: Vec<Value> = inventory
        .iter()
        .map(|entry| Value::Object(entry.to_map()))
        .collect();
    Ok(serde_json::to_string_pretty(&Value::Array(records))?)
}

/// Load the inventory stored at `path`.
#[instrument(skip_all)]
pub fn load(path: impl AsRef<Path>) -> Result<Inventory> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let inventory = from_json(&text)?;
    info!(path = %path.display(), entries = inventory.len(), "Loaded inventory");
    Ok(inventory)
}

/// Load the inventory at `path`, starting empty when the file does not exist.
pub fn load_or_empty(path: impl AsRef<Path>) -> Result<Inventory> {
    let path = path.as_ref();
    match load(path) {
        Err(MacdbError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No inventory file yet, starting empty");
            Ok(Inventory::new())
        }
        other => other,
    }
}

/// Write the whole inventory to `path`.
///
/// The file is written next to the target and renamed into place, so an
/// interrupted save leaves the previous inventory intact.
#[instrument(skip_all)]
pub fn save(inventory: &Inventory, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = to_json(inventory)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;

    info!(path = %path.display(), entries = inventory.len(), "Saved inventory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use macdb_types::normalize_ips;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_inventory() -> Inventory {
        let first = Entry::builder("00:1a:2b:3c:4d:5e".parse().unwrap())
            .port("Gi1/0/12")
            .port_description("Printer")
            .company("Hewlett Packard")
            .ip(normalize_ips(["10.0.0.12"]))
            .date("2024-03-01 08:00:00")
            .last_seen("2024-03-04 17:30:00")
            .build_without_lookup();
        let second = Entry::builder("aabb.ccdd.eeff".parse().unwrap())
            .date("2024-03-02 08:00:00")
            .build_without_lookup();
        Inventory::from_entries(vec![first, second])
    }

    #[test]
    fn test_json_round_trip() {
        let inventory = sample_inventory();
        let text = to_json(&inventory).unwrap();
        let restored = from_json(&text).unwrap();
        assert_eq!(restored.entries(), inventory.entries());
    }

    #[test]
    fn test_reads_legacy_file() {
        let text = r#"[
            {
                "mac": "00-1A-2B-3C-4D-5E",
                "port": "Fa0/3",
                "date": "2021-11-02 19:04:11",
                "port_description": "",
                "last_seen": "2021-11-03 07:00:00",
                "company": "",
                "ip": ["192.168.1.20"]
            }
        ]"#;
        let inventory = from_json(text).unwrap();
        assert_eq!(inventory.len(), 1);
        let entry = &inventory.entries()[0];
        assert_eq!(entry.port, "Fa0/3");
        assert_eq!(entry.ip, normalize_ips(["192.168.1.20"]));
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let text = r#"[{"mac": "garbage"}, 42, {"mac": "aa:bb:cc:dd:ee:ff"}]"#;
        let inventory = from_json(text).unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_scalar_ip_keeps_record() {
        let text = r#"[{"mac": "aa:bb:cc:dd:ee:ff", "company": "Acme", "ip": "10.0.0.1"}]"#;
        let inventory = from_json(text).unwrap();
        assert_eq!(inventory.len(), 1);
        let entry = &inventory.entries()[0];
        assert_eq!(entry.company, "Acme");
        assert_eq!(entry.ip, normalize_ips(["10.0.0.1"]));
    }

    #[test]
    fn test_non_array_is_rejected() {
        assert!(matches!(
            from_json(r#"{"mac": "aa:bb:cc:dd:ee:ff"}"#),
            Err(MacdbError::InvalidRecord(_))
        ));
        assert!(matches!(from_json("not json"), Err(MacdbError::Json(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macdb.json");

        let inventory = sample_inventory();
        save(&inventory, &path).unwrap();
        let restored = load(&path).unwrap();

        assert_eq!(restored.entries(), inventory.entries());
        assert!(!dir.path().join("macdb.json.tmp").exists());
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let dir = TempDir::new().unwrap();
        let inventory = load_or_empty(dir.path().join("absent.json")).unwrap();
        assert!(inventory.is_empty());
    }
}
