//! # netsniff - Bounded-Concurrency Reachability Probe
//!
//! netsniff checks whether hosts answer and which ports they expose, with
//! at most a fixed number of probes in flight at any moment.
//!
//! ## Features
//!
//! - **Three Probe Kinds**: ICMP echo, TCP connect, and UDP probe-and-listen
//! - **Honest UDP Results**: open, closed, and open|filtered stay distinct
//! - **Flexible Targeting**: IPs, hostnames, CIDR blocks, ranges, and host files
//! - **Fault Containment**: a failing or panicking probe only affects its own target
//! - **Multiple Output Formats**: Plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netsniff::scanner::{run_probe, BatchConfig, TcpConnectProbe};
//! use netsniff::types::{expand_hosts, expand_ports, Target};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hosts = expand_hosts("192.168.1.0/30").unwrap();
//!     let ports = expand_ports("22,80,443").unwrap();
//!     let targets = Target::cross_product(&hosts, &ports);
//!
//!     let probe = Arc::new(TcpConnectProbe::new(Duration::from_secs(1)));
//!     let result = run_probe(probe, targets, &BatchConfig::default()).await;
//!
//!     println!("{} of {} ports open", result.positives(), result.total());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, ports, and specification expansion
//! - [`scanner`] - Probe implementations and the batch runner
//! - [`config`] - Optional settings file
//! - [`cli`] - Subcommands wiring expansion, probing, and output
//! - [`output`] - Plain, JSON, and CSV reports
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ConfigError, ProbeError};
pub use scanner::{BatchConfig, BatchResult, Probe, ProbeKind, ProbeOutcome, UdpStatus};
pub use types::{expand_hosts, expand_ports, Port, PortError, Target, TargetError};
