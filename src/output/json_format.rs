//! JSON output formatting.

use crate::scanner::{BatchResult, ProbeKind, ProbeOutcome};
use serde::Serialize;
use std::io::{self, Write};

/// Batch report as serialized to JSON.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a, O: ProbeOutcome> {
    pub kind: ProbeKind,
    pub total: usize,
    pub positive: usize,
    pub duration_ms: u64,
    pub results: Vec<&'a O>,
}

impl<'a, O: ProbeOutcome> JsonReport<'a, O> {
    pub fn new(kind: ProbeKind, result: &'a BatchResult<O>) -> Self {
        Self {
            kind,
            total: result.total(),
            positive: result.positives(),
            duration_ms: result.duration.as_millis() as u64,
            results: result.sorted(),
        }
    }

    /// Write the pretty-printed report followed by a newline.
    pub fn write<W: Write>(&self, mut out: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::scanner::PingOutcome;
    use crate::types::Target;
    use std::time::Duration;

    #[test]
    fn test_ping_report_shape() {
        let result = BatchResult {
            outcomes: vec![
                PingOutcome {
                    target: Target::host("10.0.0.2"),
                    success: false,
                    ttl: None,
                    elapsed: Duration::from_millis(100),
                    error: Some(ProbeError::NoReply),
                },
                PingOutcome {
                    target: Target::host("10.0.0.1"),
                    success: true,
                    ttl: Some(64),
                    elapsed: Duration::from_millis(2),
                    error: None,
                },
            ],
            duration: Duration::from_millis(120),
        };

        let report = JsonReport::new(ProbeKind::Ping, &result);
        let mut buf = Vec::new();
        report.write(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["kind"], "ping");
        assert_eq!(json["total"], 2);
        assert_eq!(json["positive"], 1);
        assert_eq!(json["duration_ms"], 120);
        assert_eq!(json["results"][0]["host"], "10.0.0.1");
        assert_eq!(json["results"][0]["ttl"], 64);
        assert!(json["results"][0].get("port").is_none());
        assert_eq!(json["results"][1]["error"], "no echo reply received");
    }
}
