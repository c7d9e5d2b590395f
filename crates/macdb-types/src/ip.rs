//! IP address type and the list normalizer used for ARP observations.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::debug;

/// An IPv4 or IPv6 address in normalized form.
///
/// IPv6 addresses print in RFC 5952 compressed form, so two tokens naming
/// the same address always compare equal as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpAddress(IpAddr);

impl IpAddress {
    /// Returns true if this is an IPv4 address.
    pub const fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    /// Returns true if this is an IPv6 address.
    pub const fn is_ipv6(&self) -> bool {
        self.0.is_ipv6()
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for IpAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(IpAddress)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl TryFrom<String> for IpAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpAddress> for String {
    fn from(addr: IpAddress) -> String {
        addr.to_string()
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        IpAddress(addr)
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> Self {
        IpAddress(IpAddr::V4(addr))
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddress(IpAddr::V6(addr))
    }
}

/// Validate a single IP token.
pub fn normalize_ip(raw: &str) -> Result<IpAddress, ParseError> {
    raw.parse()
}

/// Normalize a sequence of IP tokens.
///
/// Tokens that are not valid IPv4/IPv6 addresses are dropped rather than
/// failing the whole list, and repeated addresses are kept once in
/// first-seen order. A caller holding a single token passes a one-element
/// slice.
pub fn normalize_ips<I, S>(raw: I) -> Vec<IpAddress>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<IpAddress> = Vec::new();
    for token in raw {
        match normalize_ip(token.as_ref()) {
            Ok(addr) if !out.contains(&addr) => out.push(addr),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Dropping invalid IP token"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rendered(addrs: &[IpAddress]) -> Vec<String> {
        addrs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_ipv4_and_ipv6_discrimination() {
        let v4: IpAddress = "10.0.0.1".parse().unwrap();
        assert!(v4.is_ipv4());

        let v6: IpAddress = "2001:db8::1".parse().unwrap();
        assert!(v6.is_ipv6());
    }

    #[test]
    fn test_ipv6_is_compressed() {
        let v6: IpAddress = "2001:0DB8:0000:0000:0000:0000:0000:0001".parse().unwrap();
        assert_eq!(v6.to_string(), "2001:db8::1");
    }

    #[test]
    fn test_normalize_ips_drops_invalid_tokens() {
        let addrs = normalize_ips(["10.0.0.1", "Incomplete", "fe80::1", "300.1.1.1"]);
        assert_eq!(rendered(&addrs), vec!["10.0.0.1", "fe80::1"]);
    }

    #[test]
    fn test_normalize_ips_single_invalid_token_is_empty() {
        assert!(normalize_ips(["not-an-ip"]).is_empty());
        assert!(normalize_ips(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_normalize_ips_keeps_order_and_dedups() {
        let addrs = normalize_ips(["10.0.0.2", "10.0.0.1", "10.0.0.2"]);
        assert_eq!(rendered(&addrs), vec!["10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn test_normalize_ip_reports_error() {
        assert_eq!(
            normalize_ip("bogus"),
            Err(ParseError::InvalidIpAddress("bogus".to_string()))
        );
    }
}
