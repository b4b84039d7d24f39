//! TCP and UDP scan subcommands.
//!
//! Both share the same arguments and differ only in the probe they run.

use crate::cli::{execute_batch, RunContext};
use crate::error::CliResult;
use crate::scanner::{Probe, TcpConnectProbe, UdpProbe};
use crate::types::{expand_hosts, expand_ports, Target};
use clap::Parser;

/// Probe every host on every port.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Hosts to scan (IP, hostname, CIDR, range, comma list, or a file)
    ///
    /// Examples:
    ///   192.168.1.1             Single IP address
    ///   example.com             Hostname
    ///   192.168.1.0/24          CIDR block
    ///   10.0.0.1-10.0.0.9       Full range
    #[arg(short = 'H', long, value_name = "HOSTS")]
    pub hosts: String,

    /// Ports to scan (e.g., "80", "80,443", "1-1000", "22,80,443,8000-9000")
    #[arg(short, long, value_name = "PORTS")]
    pub ports: String,
}

impl ScanCommand {
    /// Execute a TCP connect scan.
    pub async fn execute_tcp(&self, ctx: &RunContext) -> CliResult<()> {
        self.execute(TcpConnectProbe::new(ctx.timeout), ctx).await
    }

    /// Execute a UDP scan.
    pub async fn execute_udp(&self, ctx: &RunContext) -> CliResult<()> {
        self.execute(UdpProbe::new(ctx.timeout), ctx).await
    }

    /// Expand both specifications before any probe is built into work.
    fn targets(&self) -> CliResult<(Vec<Target>, usize, usize)> {
        let hosts = expand_hosts(&self.hosts)?;
        let ports = expand_ports(&self.ports)?;
        Ok((Target::cross_product(&hosts, &ports), hosts.len(), ports.len()))
    }

    async fn execute<P: Probe>(&self, probe: P, ctx: &RunContext) -> CliResult<()> {
        let (targets, hosts, ports) = self.targets()?;
        execute_batch(probe, targets, hosts, Some(ports), ctx).await?;
        Ok(())
    }
}
