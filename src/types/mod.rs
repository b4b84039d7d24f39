//! Core type definitions and target expansion.
//!
//! Turns compact host and port specifications into concrete [`Target`]s.
//! Invalid input is rejected here, before any network activity.

mod port;
mod target;

pub use port::{expand_ports, Port, PortError, PortRange, PortSpec};
pub use target::{expand_hosts, Target, TargetError, MAX_EXPANDED_ADDRESSES};
