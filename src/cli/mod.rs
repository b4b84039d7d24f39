//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `netsniff ping -H <hosts>` - ICMP echo sweep
//! - `netsniff tcp -H <hosts> -p <ports>` - TCP connect scan
//! - `netsniff udp -H <hosts> -p <ports>` - UDP probe-and-listen scan

mod ping;
mod scan;

pub use ping::PingCommand;
pub use scan::ScanCommand;

use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output::{self, CsvSink, OutputFormat};
use crate::scanner::{run_probe, BatchConfig, BatchResult, Probe, ProbeOutcome};
use crate::types::Target;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// netsniff - bounded-concurrency network reachability probe.
///
/// Checks hosts with ICMP echo, TCP connect, or UDP probe-and-listen.
/// Hosts may be IPv4 addresses, hostnames, CIDR blocks, IP ranges, or a
/// file with one entry per line.
#[derive(Parser, Debug)]
#[command(name = "netsniff")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ping sweeps and TCP/UDP port probes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (overridden by RUST_LOG)
    #[arg(
        short = 'l',
        long,
        global = true,
        value_parser = ["debug", "info", "warn", "error"]
    )]
    pub log_level: Option<String>,

    /// Per-probe timeout in milliseconds
    #[arg(short = 't', long, global = true, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(short = 'c', long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Also write one CSV line per outcome to this file
    #[arg(short = 'o', long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format on stdout
    #[arg(short = 'f', long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Show a progress bar and list negative outcomes too
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one ICMP echo request to every host
    Ping(PingCommand),

    /// TCP connect scan
    Tcp(ScanCommand),

    /// UDP scan: send one datagram and classify the reply
    Udp(ScanCommand),
}

impl Cli {
    /// Run the selected subcommand.
    pub async fn run(&self, settings: &AppSettings) -> CliResult<()> {
        let ctx = RunContext::resolve(self, settings)?;
        match &self.command {
            Commands::Ping(cmd) => cmd.execute(&ctx).await,
            Commands::Tcp(cmd) => cmd.execute_tcp(&ctx).await,
            Commands::Udp(cmd) => cmd.execute_udp(&ctx).await,
        }
    }

    /// Effective log level: the flag, else the settings file.
    pub fn effective_log_level<'a>(&'a self, settings: &'a AppSettings) -> &'a str {
        self.log_level.as_deref().unwrap_or(&settings.log_level)
    }
}

/// Explicit run parameters, after flags have been merged over settings.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub timeout: Duration,
    pub concurrency: NonZeroUsize,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub quiet: bool,
}

impl RunContext {
    /// Merge command-line flags over settings. Flags win.
    pub fn resolve(cli: &Cli, settings: &AppSettings) -> CliResult<Self> {
        let concurrency = cli.concurrency.unwrap_or(settings.default_concurrency);
        let concurrency = NonZeroUsize::new(concurrency).ok_or(CliError::ZeroConcurrency)?;

        Ok(Self {
            timeout: Duration::from_millis(cli.timeout.unwrap_or(settings.default_timeout_ms)),
            concurrency,
            format: cli.format.unwrap_or(settings.default_output_format),
            output: cli.output.clone(),
            verbose: cli.verbose,
            quiet: cli.quiet,
        })
    }

    /// Open the CSV file sink, if one was requested.
    fn open_sink(&self) -> CliResult<Option<CsvSink<BufWriter<File>>>> {
        self.output
            .as_ref()
            .map(|path| {
                File::create(path)
                    .map(|file| CsvSink::new(BufWriter::new(file)))
                    .map_err(|source| CliError::OutputFile {
                        path: path.clone(),
                        source,
                    })
            })
            .transpose()
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose || self.quiet {
            return None;
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    }
}

/// Shared driver for all three subcommands: announce, run, report.
pub(crate) async fn execute_batch<P: Probe>(
    probe: P,
    targets: Vec<Target>,
    hosts: usize,
    ports: Option<usize>,
    ctx: &RunContext,
) -> CliResult<BatchResult<P::Outcome>> {
    let kind = probe.kind();
    let timeout_ms = probe.timeout().as_millis() as u64;
    let mut sink = ctx.open_sink()?;

    tracing::info!(
        kind = %kind,
        hosts,
        ports = ?ports,
        concurrency = ctx.concurrency.get(),
        timeout_ms,
        "Starting {} probe",
        kind
    );
    if !ctx.quiet && ctx.format == OutputFormat::Plain {
        output::print_start(kind, hosts, ports, ctx.concurrency.get(), timeout_ms);
    }

    let mut config = BatchConfig::new(ctx.concurrency);
    if let Some(pb) = ctx.progress_bar(targets.len()) {
        config = config.with_progress(pb);
    }

    let result = run_probe(Arc::new(probe), targets, &config).await;

    if let Some(pb) = &config.progress {
        pb.finish_and_clear();
    }

    tracing::info!(
        kind = %kind,
        positive = result.positives(),
        total = result.total(),
        duration_ms = result.duration.as_millis() as u64,
        "{} probe complete",
        kind
    );

    output::print_report(ctx.format, kind, &result, ctx.verbose)?;

    if let Some(sink) = sink.as_mut() {
        for outcome in &result.outcomes {
            sink.record(outcome)?;
        }
        sink.flush()?;
        if !ctx.quiet {
            if let Some(path) = &ctx.output {
                output::print_info(&format!("Results written to {}", path.display()));
            }
        }
    }

    Ok(result)
}

/// Count how many outcomes look like they failed for lack of privilege.
pub(crate) fn permission_failures<O: ProbeOutcome>(result: &BatchResult<O>) -> usize {
    result
        .outcomes
        .iter()
        .filter(|o| o.error().is_some_and(|e| e.is_permission_denied()))
        .count()
}

/// Check if running with root/admin privileges.
pub(crate) fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
