//! Manufacturer lookup for MAC addresses.

use crate::error::{MacdbError, Result};
use mac_oui::Oui;
use macdb_types::MacAddress;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Resolves the manufacturer behind a MAC address.
#[cfg_attr(test, mockall::automock)]
pub trait VendorLookup {
    /// Returns the vendor name, or [`MacdbError::LookupFailure`] when the
    /// OUI is unknown or the database is unavailable.
    fn lookup(&self, mac: &MacAddress) -> Result<String>;
}

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Retrieves or initializes the **Organizationally unique identifier** database.
///
/// A database that fails to load is remembered as missing, so every later
/// lookup fails fast instead of retrying the load.
fn get_oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = ?e, "Failed to load OUI database, vendor names disabled");
                None
            }
        })
        .as_ref()
}

/// Vendor lookup backed by the IEEE OUI registry bundled with `mac_oui`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OuiVendorLookup;

impl VendorLookup for OuiVendorLookup {
    fn lookup(&self, mac: &MacAddress) -> Result<String> {
        let failure = |reason: String| MacdbError::LookupFailure {
            mac: mac.to_string(),
            reason,
        };

        let db = get_oui_db().ok_or_else(|| failure("OUI database unavailable".to_string()))?;
        match db.lookup_by_mac(&mac.to_colon_string()) {
            Ok(Some(entry)) => {
                debug!(mac = %mac, vendor = %entry.company_name, "Resolved vendor");
                Ok(entry.company_name.clone())
            }
            Ok(None) => Err(failure("unknown OUI".to_string())),
            Err(e) => Err(failure(format!("{:?}", e))),
        }
    }
}

/// Lookup that never resolves; used when vendor resolution is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVendorLookup;

impl VendorLookup for NoVendorLookup {
    fn lookup(&self, mac: &MacAddress) -> Result<String> {
        Err(MacdbError::LookupFailure {
            mac: mac.to_string(),
            reason: "vendor lookup disabled".to_string(),
        })
    }
}
