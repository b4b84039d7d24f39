//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV reports of a batch,
//! plus the CSV file sink.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::CsvSink;
pub use json_format::JsonReport;
pub use plain::{print_error, print_info, print_start, print_warning, write_plain};

use crate::error::CliResult;
use crate::scanner::{BatchResult, ProbeKind, ProbeOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

/// Output format for the stdout report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// Header-less CSV lines: host,port,status,elapsed_ms
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Write the report for `result` to `out` in the requested format.
///
/// `show_all` lists negative outcomes too in the plain report; JSON and CSV
/// always carry every outcome.
pub fn write_report<W: Write, O: ProbeOutcome>(
    out: W,
    format: OutputFormat,
    kind: ProbeKind,
    result: &BatchResult<O>,
    show_all: bool,
) -> CliResult<()> {
    match format {
        OutputFormat::Plain => write_plain(out, kind, result, show_all)?,
        OutputFormat::Json => JsonReport::new(kind, result).write(out)?,
        OutputFormat::Csv => {
            let mut sink = CsvSink::new(out);
            for outcome in result.sorted() {
                sink.record(outcome)?;
            }
            sink.flush()?;
        }
    }
    Ok(())
}

/// Print the report to stdout.
pub fn print_report<O: ProbeOutcome>(
    format: OutputFormat,
    kind: ProbeKind,
    result: &BatchResult<O>,
    show_all: bool,
) -> CliResult<()> {
    let stdout = io::stdout();
    write_report(stdout.lock(), format, kind, result, show_all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{TcpOutcome, UdpOutcome, UdpStatus};
    use crate::types::{Port, Target};
    use std::time::Duration;

    fn udp(port: u16, status: UdpStatus) -> UdpOutcome {
        UdpOutcome {
            target: Target::with_port("10.0.0.1", Port::new(port).unwrap()),
            status,
            elapsed: Duration::from_micros(12_250),
            error: None,
        }
    }

    #[test]
    fn test_format_display() {
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_csv_report_lists_every_outcome_sorted() {
        let result = BatchResult {
            outcomes: vec![
                udp(161, UdpStatus::OpenFiltered),
                udp(53, UdpStatus::Open),
                udp(9, UdpStatus::Closed),
            ],
            duration: Duration::from_millis(30),
        };

        let mut buf = Vec::new();
        write_report(&mut buf, OutputFormat::Csv, ProbeKind::Udp, &result, false).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "10.0.0.1,9,closed,12.25\n10.0.0.1,53,open,12.25\n10.0.0.1,161,open|filtered,12.25\n"
        );
    }

    #[test]
    fn test_json_report_counts() {
        let result = BatchResult {
            outcomes: vec![TcpOutcome {
                target: Target::with_port("10.0.0.1", Port::new(22).unwrap()),
                open: true,
                elapsed: Duration::from_millis(1),
                error: None,
            }],
            duration: Duration::from_millis(5),
        };

        let mut buf = Vec::new();
        write_report(&mut buf, OutputFormat::Json, ProbeKind::Tcp, &result, false).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["kind"], "tcp");
        assert_eq!(json["total"], 1);
        assert_eq!(json["positive"], 1);
    }
}
