//! Probe trait abstraction.
//!
//! Defines the common interface for the ping, TCP and UDP probes and the
//! outcome types they produce, so the batch runner is written once.

use crate::error::ProbeError;
use crate::types::Target;
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Available probe kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// ICMP echo.
    Ping,
    /// TCP connect.
    Tcp,
    /// UDP probe-and-listen.
    Udp,
}

impl ProbeKind {
    /// Word used for positive outcomes in summaries.
    pub const fn positive_label(self) -> &'static str {
        match self {
            Self::Ping => "reachable",
            Self::Tcp | Self::Udp => "open",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "Ping"),
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

/// Three-valued UDP port status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UdpStatus {
    /// An ICMP unreachable or other receive error indicated closure,
    /// or the probe could not be sent at all.
    Closed,
    /// A datagram came back.
    Open,
    /// Silence until the timeout. UDP cannot tell these two apart.
    #[serde(rename = "open|filtered")]
    OpenFiltered,
}

impl fmt::Display for UdpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UdpStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::OpenFiltered => "open|filtered",
        }
    }
}

/// Fields every outcome exposes to logging and output.
pub trait ProbeOutcome: Serialize + fmt::Debug + Send + 'static {
    /// The target this outcome belongs to.
    fn target(&self) -> &Target;

    /// Status string used in reports and the CSV sink.
    fn status_label(&self) -> &'static str;

    /// Success for ping, open for TCP, strictly open for UDP.
    fn is_positive(&self) -> bool;

    /// Wall-clock time spent on the probe.
    fn elapsed(&self) -> Duration;

    /// Diagnostic attached to the outcome, if any.
    fn error(&self) -> Option<&ProbeError>;

    /// Build the failure outcome for a probe that faulted instead of returning.
    fn faulted(target: Target, elapsed: Duration, error: ProbeError) -> Self
    where
        Self: Sized;

    /// Whether the outcome belongs in a non-verbose report.
    fn is_reportable(&self) -> bool {
        self.is_positive()
    }

    /// Elapsed time in fractional milliseconds.
    fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_micros() as f64 / 1000.0
    }
}

/// Trait for single-target probe implementations.
///
/// Each call performs exactly one protocol interaction and never fails:
/// every problem is folded into the returned outcome.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    type Outcome: ProbeOutcome;

    /// The kind of probe this implements.
    fn kind(&self) -> ProbeKind;

    /// Per-probe timeout.
    fn timeout(&self) -> Duration;

    /// Probe a single target.
    async fn probe(&self, target: Target) -> Self::Outcome;
}

pub(crate) fn serialize_ms<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_micros() as f64 / 1000.0)
}

/// Outcome of one echo probe.
#[derive(Debug, Clone, Serialize)]
pub struct PingOutcome {
    #[serde(flatten)]
    pub target: Target,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u8>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_ms")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl ProbeOutcome for PingOutcome {
    fn target(&self) -> &Target {
        &self.target
    }

    fn status_label(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "failed"
        }
    }

    fn is_positive(&self) -> bool {
        self.success
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }

    fn faulted(target: Target, elapsed: Duration, error: ProbeError) -> Self {
        Self {
            target,
            success: false,
            ttl: None,
            elapsed,
            error: Some(error),
        }
    }
}

/// Outcome of one TCP connect probe.
#[derive(Debug, Clone, Serialize)]
pub struct TcpOutcome {
    #[serde(flatten)]
    pub target: Target,
    pub open: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_ms")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl ProbeOutcome for TcpOutcome {
    fn target(&self) -> &Target {
        &self.target
    }

    fn status_label(&self) -> &'static str {
        if self.open {
            "open"
        } else {
            "closed"
        }
    }

    fn is_positive(&self) -> bool {
        self.open
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }

    fn faulted(target: Target, elapsed: Duration, error: ProbeError) -> Self {
        Self {
            target,
            open: false,
            elapsed,
            error: Some(error),
        }
    }
}

/// Outcome of one UDP probe.
#[derive(Debug, Clone, Serialize)]
pub struct UdpOutcome {
    #[serde(flatten)]
    pub target: Target,
    pub status: UdpStatus,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_ms")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProbeError>,
}

impl ProbeOutcome for UdpOutcome {
    fn target(&self) -> &Target {
        &self.target
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    /// Open-or-filtered does not count: silence proves nothing.
    fn is_positive(&self) -> bool {
        self.status == UdpStatus::Open
    }

    fn is_reportable(&self) -> bool {
        self.status != UdpStatus::Closed
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn error(&self) -> Option<&ProbeError> {
        self.error.as_ref()
    }

    fn faulted(target: Target, elapsed: Duration, error: ProbeError) -> Self {
        Self {
            target,
            status: UdpStatus::Closed,
            elapsed,
            error: Some(error),
        }
    }
}
