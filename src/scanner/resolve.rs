//! Lazy hostname resolution for probes.
//!
//! Expansion passes hostnames through untouched; each probe resolves its own
//! target here. IPv4 literals never touch the resolver.

use crate::error::ProbeError;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveError;
use trust_dns_resolver::TokioAsyncResolver;

/// Resolves targets to the first IPv4 address.
#[derive(Clone)]
pub struct HostResolver {
    resolver: TokioAsyncResolver,
}

impl HostResolver {
    /// Use the operating system's resolver configuration (`/etc/resolv.conf`
    /// and the hosts file on Unix).
    pub fn new() -> Self {
        Self::from_system(TokioAsyncResolver::tokio_from_system_conf())
    }

    /// Fall back to the built-in upstream servers when the system
    /// configuration cannot be read.
    fn from_system(system: Result<TokioAsyncResolver, ResolveError>) -> Self {
        let resolver = system.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read system resolver configuration, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }

    /// Resolve `host`, bounded by `limit`.
    pub async fn resolve_v4(&self, host: &str, limit: Duration) -> Result<Ipv4Addr, ProbeError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(ip);
        }

        let response = timeout(limit, self.resolver.lookup_ip(host))
            .await
            .map_err(|_| ProbeError::Timeout(limit.as_millis() as u64))?
            .map_err(|e| ProbeError::Resolve {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        response
            .iter()
            .find_map(|ip| match ip {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| ProbeError::Resolve {
                host: host.to_string(),
                reason: "no IPv4 address found".to_string(),
            })
    }
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Part of a probe's timeout budget still unspent since `started`.
pub(crate) fn remaining(budget: Duration, started: Instant) -> Duration {
    budget.saturating_sub(started.elapsed())
}
