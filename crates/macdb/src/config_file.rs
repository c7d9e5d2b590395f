//! Configuration file support for macdb
//!
//! Loads and validates the inventory, notification and device list from a
//! TOML file.
//! Default location: /etc/macdb/macdb.toml

use crate::device::{CapturedSession, CommandSession, DeviceSession, Vendor};
use crate::error::{MacdbError, Result};
use crate::notify::{DEFAULT_PRIORITY, GotifyNotifier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/macdb/macdb.toml";

/// Inventory store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// JSON file holding the inventory between runs
    #[serde(default = "default_inventory_path")]
    pub path: PathBuf,
}

/// Gotify endpoint for new-MAC alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Server base URL, e.g. `http://gotify.lan:8090`
    pub url: String,

    /// Application token sent as `X-Gotify-Key`
    pub app_token: String,

    /// Message priority
    #[serde(default = "default_priority")]
    pub priority: u8,
}

/// How commands reach a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportConfig {
    /// Program and arguments; the CLI command is appended as the last argument
    Command(Vec<String>),
    /// Directory of captured command outputs
    Captured(PathBuf),
}

/// One switch to collect from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name used in logs
    pub name: String,

    /// Device family
    pub vendor: Vendor,

    /// Extra VRFs whose ARP tables are read (IOS only)
    #[serde(default)]
    pub vrfs: Vec<String>,

    pub transport: TransportConfig,
}

/// Complete macdb configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdbConfig {
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Alerts are disabled when absent
    #[serde(default)]
    pub notify: Option<NotifyConfig>,

    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_inventory_path() -> PathBuf {
    PathBuf::from("/var/lib/macdb/mac_address_db.json")
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            path: default_inventory_path(),
        }
    }
}

impl NotifyConfig {
    pub fn notifier(&self) -> GotifyNotifier {
        GotifyNotifier::new(&self.url, &self.app_token, self.priority)
    }
}

impl DeviceConfig {
    /// Open the transport described by this device entry.
    pub fn open_session(&self) -> Result<Box<dyn DeviceSession>> {
        match &self.transport {
            TransportConfig::Command(program) => {
                Ok(Box::new(CommandSession::new(program.clone())?))
            }
            TransportConfig::Captured(dir) => Ok(Box::new(CapturedSession::new(dir))),
        }
    }
}

impl MacdbConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                MacdbError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(MacdbError::Io(e)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MacdbError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.inventory.path.as_os_str().is_empty() {
            return Err(MacdbError::Config("inventory path must not be empty".to_string()));
        }

        if let Some(notify) = &self.notify {
            if !(notify.url.starts_with("http://") || notify.url.starts_with("https://")) {
                return Err(MacdbError::Config(format!(
                    "notify url must be http(s): {}",
                    notify.url
                )));
            }
            if notify.app_token.is_empty() {
                return Err(MacdbError::Config("notify app_token must not be empty".to_string()));
            }
        }

        let mut names = std::collections::HashSet::new();
        for device in &self.devices {
            if device.name.is_empty() {
                return Err(MacdbError::Config("device name must not be empty".to_string()));
            }
            if !names.insert(device.name.as_str()) {
                return Err(MacdbError::Config(format!("duplicate device: {}", device.name)));
            }
            if matches!(&device.transport, TransportConfig::Command(program) if program.is_empty()) {
                return Err(MacdbError::Config(format!(
                    "device {}: transport command must not be empty",
                    device.name
                )));
            }
            if device.vendor == Vendor::Sg500 && !device.vrfs.is_empty() {
                return Err(MacdbError::Config(format!(
                    "device {}: vrfs are only supported on ios",
                    device.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[inventory]
path = "/tmp/macdb.json"

[notify]
url = "http://gotify.lan:8090"
app_token = "AbCdEf123"

[[devices]]
name = "core"
vendor = "ios"
vrfs = ["OUTSIDE"]
transport = { command = ["ssh", "-T", "admin@10.0.0.2"] }

[[devices]]
name = "branch"
vendor = "sg500"
transport = { captured = "/var/lib/macdb/captures/branch" }
"#;

    #[test]
    fn test_default_config() {
        let config = MacdbConfig::default();
        assert_eq!(
            config.inventory.path,
            PathBuf::from("/var/lib/macdb/mac_address_db.json")
        );
        assert!(config.notify.is_none());
        assert!(config.devices.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let config = MacdbConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.inventory.path, PathBuf::from("/tmp/macdb.json"));
        let notify = config.notify.as_ref().unwrap();
        assert_eq!(notify.priority, 5);
        assert_eq!(notify.notifier().message_url(), "http://gotify.lan:8090/message");

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].vendor, Vendor::Ios);
        assert_eq!(config.devices[0].vrfs, vec!["OUTSIDE".to_string()]);
        assert_eq!(
            config.devices[0].transport,
            TransportConfig::Command(vec![
                "ssh".to_string(),
                "-T".to_string(),
                "admin@10.0.0.2".to_string()
            ])
        );
        assert_eq!(
            config.devices[1].transport,
            TransportConfig::Captured(PathBuf::from("/var/lib/macdb/captures/branch"))
        );
        assert!(config.devices[1].vrfs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_vendor_is_rejected() {
        let text = r#"
[[devices]]
name = "x"
vendor = "junos"
transport = { captured = "/tmp" }
"#;
        assert!(matches!(MacdbConfig::from_toml(text), Err(MacdbError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = MacdbConfig::from_toml(SAMPLE).unwrap();

        let mut config = base.clone();
        config.devices[1].name = "core".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.devices[0].transport = TransportConfig::Command(Vec::new());
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.devices[1].vrfs = vec!["OUTSIDE".to_string()];
        assert!(config.validate().is_err());

        let mut config = base.clone();
        if let Some(notify) = config.notify.as_mut() {
            notify.url = "gotify.lan".to_string();
        }
        assert!(config.validate().is_err());

        let mut config = base;
        config.inventory.path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macdb.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = MacdbConfig::load_or_default(&path).unwrap();
        assert_eq!(config, MacdbConfig::from_toml(SAMPLE).unwrap());
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macdb.toml");
        fs::write(&path, "[inventory\npath = 1").unwrap();

        assert!(matches!(
            MacdbConfig::load_or_default(&path),
            Err(MacdbError::Config(_))
        ));
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = MacdbConfig::load_or_default("/nonexistent/macdb.toml").unwrap();
        assert_eq!(config, MacdbConfig::default());
    }

    #[test]
    fn test_open_session_captured() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("show_arp.txt"), "arp").unwrap();
        let device = DeviceConfig {
            name: "branch".to_string(),
            vendor: Vendor::Sg500,
            vrfs: Vec::new(),
            transport: TransportConfig::Captured(dir.path().to_path_buf()),
        };

        let mut session = device.open_session().unwrap();
        assert_eq!(session.send_command("show arp").unwrap(), "arp");
    }
}
