//! New-MAC alert delivery
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Alert on previously unseen devices
//! - IR-4: Incident Handling - Unknown hardware on the network is reported

use crate::entry::Entry;
use crate::error::{MacdbError, Result};
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

/// Title of every new-MAC alert.
pub const NEW_MAC_TITLE: &str = "New MAC address detected on the network";

/// Default Gotify message priority
pub const DEFAULT_PRIORITY: u8 = 5;

/// Delivers an alert for a MAC address seen for the first time.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify_new_mac(&self, entry: &Entry) -> Result<()>;
}

/// Markdown table describing a new entry.
pub fn render_message(entry: &Entry) -> String {
    let ips: Vec<String> = entry.ip.iter().map(ToString::to_string).collect();
    format!(
        "| MAC | {} |\n\
         | ----------- | ----------- |\n\
         | Description | {} |\n\
         | Port | {} |\n\
         | Manufacturer | {} |\n\
         | IP | {} |\n\
         | Date | {} |",
        entry.mac,
        entry.port_description,
        entry.port,
        entry.company,
        ips.join(", "),
        entry.date
    )
}

/// Notifier that posts to a Gotify server.
#[derive(Debug, Clone)]
pub struct GotifyNotifier {
    url: String,
    app_token: String,
    priority: u8,
    client: Client,
}

impl GotifyNotifier {
    pub fn new(url: impl Into<String>, app_token: impl Into<String>, priority: u8) -> Self {
        Self {
            url: url.into(),
            app_token: app_token.into(),
            priority,
            client: Client::new(),
        }
    }

    /// Endpoint messages are posted to.
    pub fn message_url(&self) -> String {
        format!("{}/message", self.url.trim_end_matches('/'))
    }

    /// JSON body for an alert about `entry`.
    pub fn payload(&self, entry: &Entry) -> Value {
        json!({
            "title": NEW_MAC_TITLE,
            "priority": self.priority,
            "message": render_message(entry),
            "extras": {
                "client::display": { "contentType": "text/markdown" }
            }
        })
    }
}

impl Notifier for GotifyNotifier {
    #[instrument(skip_all, fields(mac = %entry.mac))]
    fn notify_new_mac(&self, entry: &Entry) -> Result<()> {
        let url = self.message_url();
        debug!(url, "Sending new MAC notification");

        let response = self
            .client
            .post(&url)
            .header("X-Gotify-Key", &self.app_token)
            .json(&self.payload(entry))
            .send()
            .map_err(|e| MacdbError::NotificationFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MacdbError::NotificationFailure(format!(
                "{} answered {}",
                url, status
            )));
        }

        info!("New MAC notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macdb_types::normalize_ips;
    use pretty_assertions::assert_eq;

    fn new_entry() -> Entry {
        Entry::builder("aa:bb:cc:dd:ee:ff".parse().unwrap())
            .port("Gi1/0/1")
            .port_description("Office")
            .company("Acme")
            .ip(normalize_ips(["10.0.0.1", "10.0.0.2"]))
            .date("2024-05-01 12:00:00")
            .build_without_lookup()
    }

    #[test]
    fn test_render_message() {
        let expected = "| MAC | AA-BB-CC-DD-EE-FF |\n\
                        | ----------- | ----------- |\n\
                        | Description | Office |\n\
                        | Port | Gi1/0/1 |\n\
                        | Manufacturer | Acme |\n\
                        | IP | 10.0.0.1, 10.0.0.2 |\n\
                        | Date | 2024-05-01 12:00:00 |";
        assert_eq!(render_message(&new_entry()), expected);
    }

    #[test]
    fn test_message_url_trims_slash() {
        let notifier = GotifyNotifier::new("http://gotify.lan:8090/", "token", DEFAULT_PRIORITY);
        assert_eq!(notifier.message_url(), "http://gotify.lan:8090/message");
    }

    #[test]
    fn test_payload_shape() {
        let notifier = GotifyNotifier::new("http://gotify.lan", "token", 8);
        let payload = notifier.payload(&new_entry());
        assert_eq!(payload["title"], NEW_MAC_TITLE);
        assert_eq!(payload["priority"], 8);
        assert_eq!(
            payload["extras"]["client::display"]["contentType"],
            "text/markdown"
        );
        assert!(payload["message"]
            .as_str()
            .unwrap()
            .contains("AA-BB-CC-DD-EE-FF"));
    }

    #[test]
    fn test_unreachable_server_is_notification_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let notifier = GotifyNotifier::new("http://127.0.0.1:9", "token", DEFAULT_PRIORITY);
        let err = notifier.notify_new_mac(&new_entry()).unwrap_err();
        assert!(matches!(err, MacdbError::NotificationFailure(_)));
    }
}
