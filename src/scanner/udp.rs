//! UDP probe implementation.
//!
//! Sends one DNS-shaped datagram and classifies what comes back:
//!
//! 1. **Association or send fails**: closed
//! 2. **Any datagram received**: open
//! 3. **Receive error** (typically ICMP port unreachable surfacing as
//!    `ECONNREFUSED`): closed
//! 4. **Silence until the timeout**: open|filtered
//!
//! Silence is not closure. Most stacks only answer closed ports with an
//! ICMP unreachable, and that message can itself be dropped or filtered.

use crate::error::ProbeError;
use crate::scanner::resolve::{remaining, HostResolver};
use crate::scanner::traits::{Probe, ProbeKind, ProbeOutcome, UdpOutcome, UdpStatus};
use crate::types::Target;
use async_trait::async_trait;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Standard DNS query for the A record of www.google.com.
///
/// Many stacks only answer a protocol-shaped datagram, and DNS is the most
/// widely understood one.
pub const DNS_QUERY: &[u8] = &[
    0x12, 0x34, // ID
    0x01, 0x00, // standard query, recursion desired
    0x00, 0x01, // one question
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // no answer/authority/additional records
    0x03, b'w', b'w', b'w', //
    0x06, b'g', b'o', b'o', b'g', b'l', b'e', //
    0x03, b'c', b'o', b'm', //
    0x00, // root label
    0x00, 0x01, // type A
    0x00, 0x01, // class IN
];

/// Maximum datagram size read back from the target.
const RECV_BUFFER: usize = 1024;

/// UDP probe for detecting open UDP ports.
pub struct UdpProbe {
    timeout: Duration,
    resolver: HostResolver,
}

impl UdpProbe {
    /// Create a new UDP probe.
    ///
    /// `timeout` bounds the whole attempt: resolution, association and the
    /// wait for a reply share it.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            resolver: HostResolver::new(),
        }
    }

    /// Bind an ephemeral local socket and connect it to the target.
    async fn associate(&self, target: &Target, started: Instant) -> Result<UdpSocket, ProbeError> {
        let port = target.port.ok_or(ProbeError::MissingPort)?;
        let ip = self.resolver.resolve_v4(&target.host, self.timeout).await?;
        let addr = SocketAddr::new(ip.into(), port.as_u16());

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .map_err(|e| ProbeError::from_io(&e))?;

        match timeout(remaining(self.timeout, started), socket.connect(addr)).await {
            Ok(Ok(())) => Ok(socket),
            Ok(Err(e)) => Err(ProbeError::from_io(&e)),
            Err(_) => Err(ProbeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    /// Send the probe and wait for a reply.
    async fn exchange(&self, socket: &UdpSocket, started: Instant) -> (UdpStatus, Option<ProbeError>) {
        if let Err(e) = socket.send(DNS_QUERY).await {
            return (UdpStatus::Closed, Some(ProbeError::Send(e.to_string())));
        }

        let mut buf = [0u8; RECV_BUFFER];
        match timeout(remaining(self.timeout, started), socket.recv(&mut buf)).await {
            Ok(Ok(_)) => (UdpStatus::Open, None),
            Ok(Err(e)) => (UdpStatus::Closed, Some(receive_error(&e))),
            Err(_) => (UdpStatus::OpenFiltered, None),
        }
    }
}

fn receive_error(err: &io::Error) -> ProbeError {
    if err.kind() == io::ErrorKind::ConnectionRefused {
        ProbeError::ConnectionRefused
    } else {
        ProbeError::Receive(err.to_string())
    }
}

#[async_trait]
impl Probe for UdpProbe {
    type Outcome = UdpOutcome;

    fn kind(&self) -> ProbeKind {
        ProbeKind::Udp
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn probe(&self, target: Target) -> UdpOutcome {
        let started = Instant::now();

        let (status, error) = match self.associate(&target, started).await {
            Ok(socket) => self.exchange(&socket, started).await,
            Err(e) => (UdpStatus::Closed, Some(e)),
        };

        let outcome = UdpOutcome {
            target,
            status,
            elapsed: started.elapsed(),
            error,
        };

        match outcome.status {
            UdpStatus::Open => tracing::info!(
                host = %outcome.target.host,
                port = ?outcome.target.port.map(|p| p.as_u16()),
                status = %outcome.status,
                elapsed_ms = outcome.elapsed_ms(),
                "UDP port scan result"
            ),
            UdpStatus::OpenFiltered => tracing::debug!(
                host = %outcome.target.host,
                port = ?outcome.target.port.map(|p| p.as_u16()),
                status = %outcome.status,
                elapsed_ms = outcome.elapsed_ms(),
                "UDP port scan result"
            ),
            UdpStatus::Closed => tracing::debug!(
                host = %outcome.target.host,
                port = ?outcome.target.port.map(|p| p.as_u16()),
                status = %outcome.status,
                elapsed_ms = outcome.elapsed_ms(),
                error = ?outcome.error.as_ref().map(ToString::to_string),
                "UDP port scan result"
            ),
        }

        outcome
    }
}
