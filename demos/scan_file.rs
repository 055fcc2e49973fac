//! Scans one file through a running scan daemon.
//!
//! This example shows how to:
//! - Configure a DaemonScanner
//! - Scan file contents and inspect the session report
//! - Deliver the verdict to a VerdictSink
//!
//! Run with: cargo run --example scan_file -- <file> [socket]

use scanwire::prelude::*;

/// Prints each verdict event, as a filtering policy would receive them.
struct PrintSink;

impl VerdictSink for PrintSink {
    fn clean(&mut self) {
        println!("verdict: clean");
    }

    fn infected(&mut self, threat: &ThreatInfo) {
        println!("verdict: infected with {} ({})", threat.name, threat.engine);
    }

    fn failed(&mut self, message: &str, confidence: f32) {
        println!("verdict: unable to verify ({}, confidence {})", message, confidence);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: scan_file <file> [socket]")?;

    let mut config = DaemonConfig::new().with_log_clean(true);
    if let Some(socket) = args.next() {
        config = config.with_socket(socket);
    }
    let scanner = DaemonScanner::new(config)?;

    let data = std::fs::read(&path)?;
    let content = ScanContent::from_bytes(data).with_filename(path.clone());

    println!("Scanning {} ({} bytes)", path, content.size());
    println!("Digest (BLAKE3): {}", content.digest());

    let report = scanner.scan_report(&content).await;
    println!("Session {} took {:?}", report.id, report.duration);
    for item in &report.item_errors {
        println!("  item not scanned: {} {:?}", item.path, item.detail);
    }

    report.verdict().report_to(&mut PrintSink);
    Ok(())
}
