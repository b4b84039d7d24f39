//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{BatchResult, ProbeKind, ProbeOutcome};
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Write a batch report as styled plain text.
///
/// Outcomes are sorted by host and port for display. Unless `show_all` is
/// set, only reportable outcomes are listed.
pub fn write_plain<W: Write, O: ProbeOutcome>(
    mut out: W,
    kind: ProbeKind,
    result: &BatchResult<O>,
    show_all: bool,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {} {} Results", style("netsniff").cyan().bold(), kind)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} targets probed in {:.2}s",
        style("Statistics:").bold(),
        result.total(),
        result.duration.as_secs_f64()
    )?;
    writeln!(
        out,
        "               {} {}, {} other",
        style(result.positives()).green().bold(),
        kind.positive_label(),
        style(result.total() - result.positives()).red()
    )?;
    writeln!(out)?;

    let rows: Vec<&O> = result
        .sorted()
        .into_iter()
        .filter(|o| show_all || o.is_reportable())
        .collect();

    if rows.is_empty() {
        writeln!(out, "  {}", style("No results to display.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:<22}  {:>6}  {:<14}  {:>10}  {}",
            style("HOST").bold(),
            style("PORT").bold(),
            style("STATUS").bold(),
            style("TIME (ms)").bold(),
            style("DETAIL").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for outcome in rows {
            let status_style = if outcome.is_positive() {
                Style::new().green().bold()
            } else if outcome.is_reportable() {
                Style::new().yellow()
            } else {
                Style::new().red()
            };
            let port = outcome
                .target()
                .port
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            let detail = outcome.error().map(ToString::to_string).unwrap_or_default();

            writeln!(
                out,
                "  {:<22}  {:>6}  {:<14}  {:>10.2}  {}",
                outcome.target().host,
                port,
                status_style.apply_to(outcome.status_label()),
                outcome.elapsed_ms(),
                style(truncate_string(&detail, 40)).dim()
            )?;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a header before probing begins.
pub fn print_start(kind: ProbeKind, hosts: usize, ports: Option<usize>, concurrency: usize, timeout_ms: u64) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("netsniff").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Probe: {}", style("•").dim(), style(kind).yellow());
    match ports {
        Some(ports) => println!(
            "{} Probing {} hosts x {} ports...",
            style("•").dim(),
            style(hosts).white().bold(),
            style(ports).white().bold()
        ),
        None => println!("{} Probing {} hosts...", style("•").dim(), style(hosts).white().bold()),
    }
    println!(
        "{} Concurrency {}, timeout {} ms",
        style("•").dim(),
        concurrency,
        timeout_ms
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::scanner::TcpOutcome;
    use crate::types::{Port, Target};
    use std::time::Duration;

    fn tcp(port: u16, open: bool) -> TcpOutcome {
        TcpOutcome {
            target: Target::with_port("10.0.0.1", Port::new(port).unwrap()),
            open,
            elapsed: Duration::from_millis(3),
            error: (!open).then_some(ProbeError::ConnectionRefused),
        }
    }

    fn render(show_all: bool) -> String {
        console::set_colors_enabled(false);
        let result = BatchResult {
            outcomes: vec![tcp(443, true), tcp(81, false), tcp(22, true)],
            duration: Duration::from_millis(40),
        };
        let mut buf = Vec::new();
        write_plain(&mut buf, ProbeKind::Tcp, &result, show_all).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_positives_only_by_default() {
        let text = render(false);
        assert!(text.contains("3 targets probed"));
        assert!(text.contains("2 open"));
        assert!(!text.contains("connection refused"));

        let first = text.find("    22").unwrap();
        let second = text.find("   443").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_show_all_lists_negatives() {
        let text = render(true);
        assert!(text.contains("closed"));
        assert!(text.contains("connection refused"));
    }
}
