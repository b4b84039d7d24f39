//! Scanner module - the probing engine.
//!
//! Provides the ping, TCP connect and UDP probes behind one [`Probe`]
//! trait, and the bounded-concurrency batch runner that drives them.

pub mod batch;
pub mod ping;
pub mod resolve;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use batch::{run_batch, run_probe, BatchConfig, BatchResult, DEFAULT_CONCURRENCY};
pub use ping::PingProbe;
pub use resolve::HostResolver;
pub use tcp::TcpConnectProbe;
pub use traits::{PingOutcome, Probe, ProbeKind, ProbeOutcome, TcpOutcome, UdpOutcome, UdpStatus};
pub use udp::UdpProbe;
