//! Host specification parsing and target expansion.
//!
//! A host specification is either a path to a host-list file or a
//! comma-separated list whose tokens may be:
//! - Single IPv4 addresses ("192.168.1.1")
//! - CIDR blocks ("192.168.1.0/24")
//! - Full ranges ("192.168.1.1-192.168.1.20")
//! - Last-octet ranges ("192.168.1.1-20")
//! - Hostnames ("example.com"), passed through unresolved

use super::port::Port;
use ipnetwork::IpNetwork;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

/// One concrete unit of probe work: a host, optionally paired with a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    /// Hostname or IPv4 literal, exactly as expanded.
    pub host: String,
    /// Port for TCP/UDP probes; absent for ping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
}

impl Target {
    /// A host-only target (ping).
    pub fn host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
        }
    }

    /// A host and port target (TCP/UDP).
    pub fn with_port(host: impl Into<String>, port: Port) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
        }
    }

    /// Key used to index outcomes, since batch order is not meaningful.
    pub fn key(&self) -> (String, Option<u16>) {
        (self.host.clone(), self.port.map(Port::as_u16))
    }

    /// Every host paired with every port, host-major.
    pub fn cross_product(hosts: &[String], ports: &[Port]) -> Vec<Self> {
        hosts
            .iter()
            .flat_map(|host| ports.iter().map(move |&port| Self::with_port(host.clone(), port)))
            .collect()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Error type for host specification parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid IP address format: {0}")]
    InvalidIpFormat(String),
    #[error("invalid IP address or hostname: {0}")]
    InvalidHost(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("only IPv4 is supported: {0}")]
    Ipv6NotSupported(String),
    #[error("invalid IP range: {0}")]
    InvalidRange(String),
    #[error("range end must not be lower than its start: {0}")]
    RangeOrder(String),
    #[error("'{0}' expands to {1} addresses (max: {2})")]
    TooManyAddresses(String, u64, u64),
    #[error("failed to read host file {path}: {reason}")]
    HostFile { path: String, reason: String },
    #[error("file contains invalid host on line {line} ('{host}'): {source}")]
    FileContainsInvalidHost {
        line: usize,
        host: String,
        #[source]
        source: Box<TargetError>,
    },
    #[error("no valid hosts")]
    NoValidHosts,
}

/// Upper bound on the addresses a single CIDR or range token may produce (a /8).
pub const MAX_EXPANDED_ADDRESSES: u64 = 1 << 24;

/// Expand a host specification into a deduplicated, ordered host list.
///
/// No DNS resolution happens here; hostnames are returned as given.
pub fn expand_hosts(spec: &str) -> Result<Vec<String>, TargetError> {
    let path = Path::new(spec.trim());
    let hosts = if !spec.trim().is_empty() && path.is_file() {
        expand_host_file(path)?
    } else {
        let mut hosts = Vec::new();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            hosts.extend(expand_token(token)?);
        }
        hosts
    };

    let mut seen = HashSet::new();
    let hosts: Vec<String> = hosts.into_iter().filter(|h| seen.insert(h.clone())).collect();

    if hosts.is_empty() {
        return Err(TargetError::NoValidHosts);
    }
    Ok(hosts)
}

/// Read a host-list file: one token per line, `#` comments and blank lines skipped.
fn expand_host_file(path: &Path) -> Result<Vec<String>, TargetError> {
    let content = fs::read_to_string(path).map_err(|e| TargetError::HostFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut hosts = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let expanded = expand_token(line).map_err(|e| TargetError::FileContainsInvalidHost {
            line: index + 1,
            host: line.to_string(),
            source: Box::new(e),
        })?;
        hosts.extend(expanded);
    }
    Ok(hosts)
}

/// Expand one token. CIDR takes precedence over ranges, ranges over single hosts.
fn expand_token(token: &str) -> Result<Vec<String>, TargetError> {
    if let Some((left, _)) = token.split_once('/') {
        let left = left.trim();
        if looks_like_ip(left) || left.contains(':') {
            return expand_cidr(token);
        }
        return Err(TargetError::InvalidHost(token.to_string()));
    }
    if token.contains('-') && looks_like_range(token) {
        return expand_range(token);
    }
    validate_single(token).map(|host| vec![host])
}

/// Hostnames may contain hyphens; only treat a token as a range when its
/// left side is dotted-decimal.
fn looks_like_range(token: &str) -> bool {
    token
        .split('-')
        .next()
        .is_some_and(|left| looks_like_ip(left.trim()))
}

fn expand_cidr(token: &str) -> Result<Vec<String>, TargetError> {
    let network: IpNetwork = token
        .parse()
        .map_err(|_| TargetError::InvalidCidr(token.to_string()))?;
    let net = match network {
        IpNetwork::V4(net) => net,
        IpNetwork::V6(_) => return Err(TargetError::Ipv6NotSupported(token.to_string())),
    };

    let size = 1u64 << (32 - u32::from(net.prefix()));
    if size > MAX_EXPANDED_ADDRESSES {
        return Err(TargetError::TooManyAddresses(
            token.to_string(),
            size,
            MAX_EXPANDED_ADDRESSES,
        ));
    }

    let first = u64::from(u32::from(net.network()));
    let (start, end) = if size > 2 {
        (first + 1, first + size - 2)
    } else {
        (first, first + size - 1)
    };
    Ok(enumerate(start, end))
}

fn expand_range(token: &str) -> Result<Vec<String>, TargetError> {
    let parts: Vec<&str> = token.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(TargetError::InvalidRange(token.to_string()));
    }
    let (left, right) = (parts[0], parts[1]);

    let start: Ipv4Addr = left
        .parse()
        .map_err(|_| TargetError::InvalidIpFormat(left.to_string()))?;

    if right.matches('.').count() == 3 {
        let end: Ipv4Addr = right
            .parse()
            .map_err(|_| TargetError::InvalidRange(token.to_string()))?;
        let (start, end) = (u64::from(u32::from(start)), u64::from(u32::from(end)));
        if end < start {
            return Err(TargetError::RangeOrder(token.to_string()));
        }
        let count = end - start + 1;
        if count > MAX_EXPANDED_ADDRESSES {
            return Err(TargetError::TooManyAddresses(
                token.to_string(),
                count,
                MAX_EXPANDED_ADDRESSES,
            ));
        }
        return Ok(enumerate(start, end));
    }

    let last: u8 = right
        .parse()
        .map_err(|_| TargetError::InvalidRange(token.to_string()))?;
    let [a, b, c, d] = start.octets();
    if last < d {
        return Err(TargetError::RangeOrder(token.to_string()));
    }
    Ok((d..=last)
        .map(|octet| Ipv4Addr::new(a, b, c, octet).to_string())
        .collect())
}

fn enumerate(start: u64, end: u64) -> Vec<String> {
    (start..=end)
        .filter_map(|raw| u32::try_from(raw).ok())
        .map(|raw| Ipv4Addr::from(raw).to_string())
        .collect()
}

fn validate_single(token: &str) -> Result<String, TargetError> {
    if token.parse::<Ipv4Addr>().is_ok() {
        return Ok(token.to_string());
    }
    if looks_like_ip(token) {
        return Err(TargetError::InvalidIpFormat(token.to_string()));
    }
    if token.parse::<Ipv6Addr>().is_ok() {
        return Err(TargetError::Ipv6NotSupported(token.to_string()));
    }
    if is_valid_hostname(token) {
        return Ok(token.to_string());
    }
    Err(TargetError::InvalidHost(token.to_string()))
}

/// Dotted-decimal shape: digits and dots only, with at least one dot.
fn looks_like_ip(s: &str) -> bool {
    s.contains('.') && s.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 255 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cidr_drops_network_and_broadcast() {
        assert_eq!(
            expand_hosts("192.168.1.0/30").unwrap(),
            vec!["192.168.1.1", "192.168.1.2"]
        );
    }

    #[test]
    fn test_cidr_24_has_254_hosts() {
        let hosts = expand_hosts("10.1.2.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts.first().unwrap(), "10.1.2.1");
        assert_eq!(hosts.last().unwrap(), "10.1.2.254");
    }

    #[test]
    fn test_small_cidr_blocks_keep_every_address() {
        assert_eq!(
            expand_hosts("10.0.0.0/31").unwrap(),
            vec!["10.0.0.0", "10.0.0.1"]
        );
        assert_eq!(expand_hosts("10.0.0.7/32").unwrap(), vec!["10.0.0.7"]);
    }

    #[test]
    fn test_cidr_with_host_bits_starts_at_network() {
        assert_eq!(
            expand_hosts("192.168.1.5/30").unwrap(),
            vec!["192.168.1.5", "192.168.1.6"]
        );
    }

    #[test]
    fn test_cidr_rejects_ipv6_and_garbage() {
        assert!(matches!(
            expand_hosts("2001:db8::/126"),
            Err(TargetError::Ipv6NotSupported(_))
        ));
        assert!(matches!(
            expand_hosts("10.0.0.0/40"),
            Err(TargetError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_cidr_too_large() {
        assert!(matches!(
            expand_hosts("10.0.0.0/7"),
            Err(TargetError::TooManyAddresses(_, _, _))
        ));
    }

    #[test]
    fn test_full_and_short_ranges_agree() {
        let full = expand_hosts("192.168.1.1-192.168.1.3").unwrap();
        let short = expand_hosts("192.168.1.1-3").unwrap();
        assert_eq!(full, vec!["192.168.1.1", "192.168.1.2", "192.168.1.3"]);
        assert_eq!(full, short);
    }

    #[test]
    fn test_full_range_crosses_octet_boundary() {
        assert_eq!(
            expand_hosts("10.0.0.254-10.0.1.1").unwrap(),
            vec!["10.0.0.254", "10.0.0.255", "10.0.1.0", "10.0.1.1"]
        );
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(expand_hosts("10.0.0.1-10.0.0.1").unwrap(), vec!["10.0.0.1"]);
        assert_eq!(expand_hosts("10.0.0.1-1").unwrap(), vec!["10.0.0.1"]);
    }

    #[test]
    fn test_reversed_ranges_fail() {
        assert!(matches!(
            expand_hosts("10.0.0.5-10.0.0.1"),
            Err(TargetError::RangeOrder(_))
        ));
        assert!(matches!(
            expand_hosts("10.0.0.5-2"),
            Err(TargetError::RangeOrder(_))
        ));
    }

    #[test]
    fn test_malformed_ranges() {
        assert!(matches!(
            expand_hosts("10.0.0.1-300"),
            Err(TargetError::InvalidRange(_))
        ));
        assert!(matches!(
            expand_hosts("10.0.0.1-10.0.0.x"),
            Err(TargetError::InvalidRange(_))
        ));
        assert!(matches!(
            expand_hosts("10.0.0.1-2-3"),
            Err(TargetError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_invalid_ip_format_is_distinguished() {
        assert_eq!(
            expand_hosts("999.1.1.1"),
            Err(TargetError::InvalidIpFormat("999.1.1.1".to_string()))
        );
        assert!(matches!(
            expand_hosts("1.2.3"),
            Err(TargetError::InvalidIpFormat(_))
        ));
    }

    #[test]
    fn test_invalid_host() {
        assert_eq!(
            expand_hosts("not a host!!"),
            Err(TargetError::InvalidHost("not a host!!".to_string()))
        );
        assert!(matches!(
            expand_hosts("-bad.example.com"),
            Err(TargetError::InvalidHost(_))
        ));
        assert!(matches!(
            expand_hosts("example..com"),
            Err(TargetError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_slash_without_address_is_invalid_host() {
        assert_eq!(
            expand_hosts("foo/bar"),
            Err(TargetError::InvalidHost("foo/bar".to_string()))
        );
        assert!(matches!(
            expand_hosts("10.0.0.0/abc"),
            Err(TargetError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_hostnames_pass_through() {
        assert_eq!(
            expand_hosts("example.com, my-server ,localhost").unwrap(),
            vec!["example.com", "my-server", "localhost"]
        );
    }

    #[test]
    fn test_hostname_label_limits() {
        let long_label = "a".repeat(64);
        assert!(!is_valid_hostname(&long_label));
        assert!(is_valid_hostname(&"a".repeat(63)));
        let long_name = vec!["abc"; 70].join(".");
        assert!(long_name.len() > 255);
        assert!(!is_valid_hostname(&long_name));
    }

    #[test]
    fn test_duplicates_removed_in_encounter_order() {
        assert_eq!(
            expand_hosts("10.0.0.2,10.0.0.1-3,10.0.0.2").unwrap(),
            vec!["10.0.0.2", "10.0.0.1", "10.0.0.3"]
        );
    }

    #[test]
    fn test_empty_spec() {
        assert_eq!(expand_hosts(""), Err(TargetError::NoValidHosts));
        assert_eq!(expand_hosts(" , ,"), Err(TargetError::NoValidHosts));
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let spec = "10.0.0.0/29,example.com,10.0.1.1-4";
        assert_eq!(expand_hosts(spec).unwrap(), expand_hosts(spec).unwrap());
    }

    #[test]
    fn test_host_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# lab hosts").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "10.0.0.1").unwrap();
        writeln!(file, "  example.com  ").unwrap();
        writeln!(file, "192.168.0.0/30").unwrap();
        writeln!(file, "172.16.0.1-2").unwrap();

        let hosts = expand_hosts(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            hosts,
            vec![
                "10.0.0.1",
                "example.com",
                "192.168.0.1",
                "192.168.0.2",
                "172.16.0.1",
                "172.16.0.2"
            ]
        );
    }

    #[test]
    fn test_host_file_reports_offending_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "10.0.0.1").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "300.1.1.1").unwrap();

        match expand_hosts(file.path().to_str().unwrap()) {
            Err(TargetError::FileContainsInvalidHost { line, host, source }) => {
                assert_eq!(line, 3);
                assert_eq!(host, "300.1.1.1");
                assert!(matches!(*source, TargetError::InvalidIpFormat(_)));
            }
            other => panic!("expected file error, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_only_file_has_no_hosts() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();
        assert_eq!(
            expand_hosts(file.path().to_str().unwrap()),
            Err(TargetError::NoValidHosts)
        );
    }

    #[test]
    fn test_cross_product() {
        let hosts = vec!["a".to_string(), "b".to_string()];
        let ports = vec![Port::new(22).unwrap(), Port::new(80).unwrap()];
        let targets = Target::cross_product(&hosts, &ports);
        assert_eq!(targets.len(), 4);
        assert_eq!(targets[1].to_string(), "a:80");
        assert_eq!(targets[2].key(), ("b".to_string(), Some(22)));
    }
}
