//! Error types for macdb
//!
//! Only identity failures (an unparseable MAC on the primary record) and
//! I/O on the store or configuration surface as hard errors. Failures that
//! touch optional enrichment fields go through [`Downgrade`] and become a
//! log line plus a safe default.

use macdb_types::ParseError;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while building the inventory
#[derive(Debug, Error)]
pub enum MacdbError {
    /// Malformed MAC or IP token
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] ParseError),

    /// Vendor database has no manufacturer for this MAC
    #[error("Vendor lookup failed for {mac}: {reason}")]
    LookupFailure { mac: String, reason: String },

    /// MAC table row names a port with no description row
    #[error("Port not found in description table: {0}")]
    PortNotFound(String),

    /// New-MAC alert could not be delivered
    #[error("Notification failed: {0}")]
    NotificationFailure(String),

    /// Device transport error (command could not run or device unreachable)
    #[error("Device session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed persisted record
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for macdb operations
pub type Result<T> = std::result::Result<T, MacdbError>;

/// Downgrade an enrichment error to a default value plus a diagnostic.
///
/// Applied at the vendor lookup, port description join and notification
/// boundaries; identity errors never pass through here.
pub trait Downgrade<T> {
    fn or_logged(self, boundary: &str) -> T
    where
        T: Default;

    /// Same as [`Downgrade::or_logged`] for expected misses, logged at debug.
    fn or_debug(self, boundary: &str) -> T
    where
        T: Default;
}

impl<T> Downgrade<T> for Result<T> {
    fn or_logged(self, boundary: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(e) => {
                warn!(boundary, error = %e, "Falling back to default");
                T::default()
            }
        }
    }

    fn or_debug(self, boundary: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(e) => {
                debug!(boundary, error = %e, "Falling back to default");
                T::default()
            }
        }
    }
}
