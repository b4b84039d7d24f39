//! CSV output: one header-less line per outcome.

use crate::scanner::ProbeOutcome;
use std::io::Write;

/// Writes `host,port,status,elapsed_ms` lines.
///
/// The port column is empty for ping outcomes. Elapsed time keeps two
/// decimals.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        Self { writer }
    }

    /// Append one outcome.
    pub fn record<O: ProbeOutcome>(&mut self, outcome: &O) -> csv::Result<()> {
        let target = outcome.target();
        let port = target.port.map(|p| p.to_string()).unwrap_or_default();
        self.writer.write_record([
            target.host.as_str(),
            port.as_str(),
            outcome.status_label(),
            format!("{:.2}", outcome.elapsed_ms()).as_str(),
        ])
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::scanner::{PingOutcome, TcpOutcome};
    use crate::types::{Port, Target};
    use std::time::Duration;

    fn written<F: FnOnce(&mut CsvSink<&mut Vec<u8>>)>(f: F) -> String {
        let mut buf = Vec::new();
        {
            let mut sink = CsvSink::new(&mut buf);
            f(&mut sink);
            sink.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_ping_line_has_empty_port() {
        let outcome = PingOutcome {
            target: Target::host("192.0.2.1"),
            success: false,
            ttl: None,
            elapsed: Duration::from_millis(1000),
            error: Some(ProbeError::NoReply),
        };
        let text = written(|sink| sink.record(&outcome).unwrap());
        assert_eq!(text, "192.0.2.1,,failed,1000.00\n");
    }

    #[test]
    fn test_tcp_lines() {
        let open = TcpOutcome {
            target: Target::with_port("example.com", Port::new(443).unwrap()),
            open: true,
            elapsed: Duration::from_micros(3_456),
            error: None,
        };
        let closed = TcpOutcome {
            target: Target::with_port("example.com", Port::new(444).unwrap()),
            open: false,
            elapsed: Duration::from_micros(10),
            error: Some(ProbeError::ConnectionRefused),
        };
        let text = written(|sink| {
            sink.record(&open).unwrap();
            sink.record(&closed).unwrap();
        });
        assert_eq!(text, "example.com,443,open,3.46\nexample.com,444,closed,0.01\n");
    }
}
