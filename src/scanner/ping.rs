//! ICMP echo probe.
//!
//! Echo requests are delegated to `surge-ping`. Depending on the platform the
//! client needs either an unprivileged ICMP datagram socket (Linux with
//! `net.ipv4.ping_group_range` covering the user) or a raw socket, which
//! requires root. Failing to open the socket is not fatal: every target in
//! the batch then reports a failed outcome carrying the reason.

use crate::error::ProbeError;
use crate::scanner::resolve::{remaining, HostResolver};
use crate::scanner::traits::{PingOutcome, Probe, ProbeKind, ProbeOutcome};
use crate::types::Target;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use surge_ping::{Client, Config, IcmpPacket, PingIdentifier, PingSequence, SurgeError, ICMP};

/// Echo payload size, matching the classic `ping` default.
const PAYLOAD_SIZE: usize = 56;

/// ICMP echo probe sending exactly one request per target.
pub struct PingProbe {
    timeout: Duration,
    client: Result<Client, String>,
    resolver: HostResolver,
}

impl PingProbe {
    /// Create a new ping probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(timeout: Duration) -> Self {
        let config = Config::builder().kind(ICMP::V4).build();
        let client = Client::new(&config).map_err(|e| e.to_string());
        if let Err(reason) = &client {
            tracing::warn!(error = %reason, "failed to open ICMP socket");
        }

        Self {
            timeout,
            client,
            resolver: HostResolver::new(),
        }
    }

    /// Send one echo request and wait for its reply.
    ///
    /// Resolution and the echo share the probe's timeout.
    async fn echo(&self, target: &Target, started: Instant) -> Result<Option<u8>, ProbeError> {
        let ip = self.resolver.resolve_v4(&target.host, self.timeout).await?;
        let client = self
            .client
            .as_ref()
            .map_err(|reason| ProbeError::Echo(reason.clone()))?;

        let mut pinger = client
            .pinger(IpAddr::V4(ip), PingIdentifier(rand::random()))
            .await;
        pinger.timeout(remaining(self.timeout, started));

        let payload = [0u8; PAYLOAD_SIZE];
        classify_reply(pinger.ping(PingSequence(0), &payload).await.map(|(packet, _rtt)| packet))
    }
}

/// Map the echo result onto a TTL or a diagnostic.
///
/// A timeout with no lower-level error means zero replies.
fn classify_reply(reply: Result<IcmpPacket, SurgeError>) -> Result<Option<u8>, ProbeError> {
    match reply {
        Ok(IcmpPacket::V4(packet)) => Ok(packet.get_ttl()),
        Ok(IcmpPacket::V6(_)) => Ok(None),
        Err(SurgeError::Timeout { .. }) => Err(ProbeError::NoReply),
        Err(e) => Err(ProbeError::Echo(e.to_string())),
    }
}

#[async_trait]
impl Probe for PingProbe {
    type Outcome = PingOutcome;

    fn kind(&self) -> ProbeKind {
        ProbeKind::Ping
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self, target: Target) -> PingOutcome {
        let started = Instant::now();
        let result = self.echo(&target, started).await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(ttl) => PingOutcome {
                target,
                success: true,
                ttl,
                elapsed,
                error: None,
            },
            Err(e) => PingOutcome {
                target,
                success: false,
                ttl: None,
                elapsed,
                error: Some(e),
            },
        };

        if outcome.success {
            tracing::info!(
                host = %outcome.target.host,
                status = "success",
                ttl = ?outcome.ttl,
                elapsed_ms = outcome.elapsed_ms(),
                "Ping result"
            );
        } else {
            tracing::debug!(
                host = %outcome.target.host,
                status = "failed",
                error = ?outcome.error.as_ref().map(ToString::to_string),
                "Ping result"
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_creation() {
        let probe = PingProbe::new(Duration::from_millis(300));
        assert_eq!(probe.kind(), ProbeKind::Ping);
        assert_eq!(Probe::timeout(&probe), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_unopenable_socket_yields_failed_outcome() {
        let probe = PingProbe {
            timeout: Duration::from_millis(100),
            client: Err("Operation not permitted (os error 1)".to_string()),
            resolver: HostResolver::new(),
        };

        let outcome = probe.probe(Target::host("127.0.0.1")).await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_label(), "failed");
        assert!(outcome.error.as_ref().unwrap().is_permission_denied());
    }

    #[test]
    fn test_timeout_without_error_is_no_reply() {
        let reply = Err(SurgeError::Timeout { seq: PingSequence(0) });
        assert_eq!(classify_reply(reply), Err(ProbeError::NoReply));
    }

    #[test]
    fn test_socket_error_is_kept_as_diagnostic() {
        let reply = Err(SurgeError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "Operation not permitted",
        )));
        let err = classify_reply(reply).unwrap_err();
        assert!(matches!(err, ProbeError::Echo(_)));
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_failed() {
        let probe = PingProbe {
            timeout: Duration::from_secs(2),
            client: Err("unused".to_string()),
            resolver: HostResolver::new(),
        };

        let outcome = probe.probe(Target::host("no-such-host.invalid")).await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_label(), "failed");
        assert!(matches!(
            outcome.error,
            Some(ProbeError::Resolve { .. }) | Some(ProbeError::Timeout(_))
        ));
    }
}
