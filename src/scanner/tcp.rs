//! TCP connect probe.
//!
//! Performs a full handshake through the operating system's socket API.
//! Open means the connection was established before the timeout; anything
//! else (timeout, refusal, unreachable network) is reported as closed.

use crate::error::ProbeError;
use crate::scanner::resolve::{remaining, HostResolver};
use crate::scanner::traits::{Probe, ProbeKind, ProbeOutcome, TcpOutcome};
use crate::types::Target;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP connect probe. Does not require elevated privileges.
pub struct TcpConnectProbe {
    timeout: Duration,
    resolver: HostResolver,
}

impl TcpConnectProbe {
    /// Create a new TCP probe with the given per-connection timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            resolver: HostResolver::new(),
        }
    }

    async fn attempt_connect(&self, target: &Target, started: Instant) -> Result<TcpStream, ProbeError> {
        let port = target.port.ok_or(ProbeError::MissingPort)?;
        let ip = self.resolver.resolve_v4(&target.host, self.timeout).await?;
        let addr = SocketAddr::new(ip.into(), port.as_u16());

        match timeout(remaining(self.timeout, started), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProbeError::from_io(&e)),
            Err(_) => Err(ProbeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

/// Close an established connection, keeping any failure as a diagnostic.
async fn release(mut stream: TcpStream) -> Option<ProbeError> {
    stream
        .shutdown()
        .await
        .err()
        .map(|e| ProbeError::Release(e.to_string()))
}

#[async_trait]
impl Probe for TcpConnectProbe {
    type Outcome = TcpOutcome;

    fn kind(&self) -> ProbeKind {
        ProbeKind::Tcp
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self, target: Target) -> TcpOutcome {
        let started = Instant::now();
        let connected = self.attempt_connect(&target, started).await;
        let elapsed = started.elapsed();

        let outcome = match connected {
            Ok(stream) => TcpOutcome {
                target,
                open: true,
                elapsed,
                error: release(stream).await,
            },
            Err(e) => TcpOutcome {
                target,
                open: false,
                elapsed,
                error: Some(e),
            },
        };

        if outcome.open {
            tracing::info!(
                host = %outcome.target.host,
                port = ?outcome.target.port.map(|p| p.as_u16()),
                status = "open",
                elapsed_ms = outcome.elapsed_ms(),
                "TCP port scan result"
            );
        } else {
            tracing::debug!(
                host = %outcome.target.host,
                port = ?outcome.target.port.map(|p| p.as_u16()),
                status = "closed",
                elapsed_ms = outcome.elapsed_ms(),
                error = ?outcome.error.as_ref().map(ToString::to_string),
                "TCP port scan result"
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;
    use tokio::net::TcpListener;

    fn loopback(port: u16) -> Target {
        Target::with_port("127.0.0.1", Port::new(port).unwrap())
    }

    #[tokio::test]
    async fn test_probe_creation() {
        let probe = TcpConnectProbe::new(Duration::from_secs(1));
        assert_eq!(probe.kind(), ProbeKind::Tcp);
        assert_eq!(Probe::timeout(&probe), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let probe = TcpConnectProbe::new(Duration::from_secs(2));
        let outcome = probe.probe(loopback(port)).await;

        assert!(outcome.open);
        assert_eq!(outcome.status_label(), "open");
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unbound_port_is_closed() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = TcpConnectProbe::new(Duration::from_millis(500));
        let outcome = probe.probe(loopback(port)).await;

        assert!(!outcome.open);
        assert!(matches!(
            outcome.error,
            Some(ProbeError::ConnectionRefused) | Some(ProbeError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_closed() {
        let probe = TcpConnectProbe::new(Duration::from_secs(2));
        let outcome = probe
            .probe(Target::with_port("no-such-host.invalid", Port::new(80).unwrap()))
            .await;

        assert!(!outcome.open);
        assert_eq!(outcome.status_label(), "closed");
        assert!(matches!(
            outcome.error,
            Some(ProbeError::Resolve { .. }) | Some(ProbeError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_port_is_reported() {
        let probe = TcpConnectProbe::new(Duration::from_millis(100));
        let outcome = probe.probe(Target::host("127.0.0.1")).await;
        assert!(!outcome.open);
        assert_eq!(outcome.error, Some(ProbeError::MissingPort));
    }
}
