//! Ping subcommand implementation.

use crate::cli::{execute_batch, is_root, permission_failures, RunContext};
use crate::error::CliResult;
use crate::output;
use crate::scanner::PingProbe;
use crate::types::{expand_hosts, Target};
use clap::Parser;

/// Send one ICMP echo request to every host.
#[derive(Parser, Debug)]
pub struct PingCommand {
    /// Hosts to ping (IP, hostname, CIDR, range, comma list, or a file)
    ///
    /// Examples:
    ///   192.168.1.1             Single IP address
    ///   192.168.1.0/24          CIDR block
    ///   10.0.0.1-20             Last-octet range
    ///   hosts.txt               One entry per line, # comments
    #[arg(short = 'H', long, value_name = "HOSTS")]
    pub hosts: String,
}

impl PingCommand {
    /// Execute the ping command.
    pub async fn execute(&self, ctx: &RunContext) -> CliResult<()> {
        let hosts = expand_hosts(&self.hosts)?;
        let host_count = hosts.len();
        let targets: Vec<Target> = hosts.into_iter().map(Target::host).collect();

        let probe = PingProbe::new(ctx.timeout);
        let result = execute_batch(probe, targets, host_count, None, ctx).await?;

        let denied = permission_failures(&result);
        if denied > 0 && !is_root() {
            tracing::warn!(failures = denied, "echo requests were refused by the operating system");
            output::print_warning(
                "ICMP echo may require elevated privileges on this system (run as root, \
                 or allow unprivileged ping via net.ipv4.ping_group_range).",
            );
        }

        Ok(())
    }
}
