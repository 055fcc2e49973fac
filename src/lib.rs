//! # Scanwire
//!
//! A client for line-oriented virus-scanning daemons reached over a local
//! Unix socket.
//!
//! ## Overview
//!
//! For each scan request Scanwire:
//!
//! - writes the content to a transient file named by its digest
//! - asks the daemon to scan that path (`SCAN <path>`)
//! - reads the multi-line reply, separating progress, per-item results and
//!   the terminal status
//! - reduces the results to one verdict: clean, infected with named
//!   threats, or failed
//!
//! Failures are never reported as clean. A timeout, a broken connection or
//! a reply the protocol does not allow all yield [`Verdict::Failed`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scanwire::prelude::*;
//!
//! # async fn run() -> Result<(), ScanError> {
//! let scanner = DaemonScanner::new(
//!     DaemonConfig::new().with_socket("/var/run/scand/scand.sock"),
//! )?;
//!
//! let content = ScanContent::from_bytes(b"message body".to_vec());
//! match scanner.scan(&content).await {
//!     Verdict::Clean => println!("clean"),
//!     Verdict::Infected { threats } => {
//!         for threat in threats {
//!             println!("found {}", threat.name);
//!         }
//!     }
//!     Verdict::Failed { message, .. } => println!("unable to verify: {}", message),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Wire protocol
//!
//! ```text
//! daemon: 220 <banner>
//! client: SCAN /spool/<digest>.tmp
//! daemon: 210 <progress>                         (any number, ignored)
//! daemon: SCAN <path>\t<status>[\t<detail>]      (one per contained item)
//! daemon: 200 <summary>
//! ```
//!
//! The second character of `<status>` is `E` (item error, logged), `L`
//! (finding; `<detail>` is the threat name, optionally prefixed `0 `) or
//! `+` (nothing found). All lines are CR LF terminated.
//!
//! ## Architecture
//!
//! - **Core**: shared types, traits, and error handling
//! - **Protocol**: line transport, classifier, result parser, session state machine
//! - **Backends**: the daemon scanner that orchestrates one session per request
//! - **Audit**: structured logging for compliance

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod core;
pub mod protocol;

// Re-export commonly used types at the crate root
pub use crate::core::{
    ContentDigest, ContentHasher, FindingSet, ItemError, ProtocolViolation, ScanContent,
    ScanError, Scanner, SessionOutcome, SessionReport, ThreatInfo, Verdict, VerdictSink,
};

pub use crate::backends::{DaemonConfig, DaemonScanner};
pub use crate::protocol::{LineTransport, ScanSession, SessionTimeouts, UnixLineTransport};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backends::{DaemonConfig, DaemonScanner};
    pub use crate::core::{
        ContentDigest, FindingSet, ScanContent, ScanError, Scanner, SessionOutcome,
        SessionReport, ThreatInfo, Verdict, VerdictSink,
    };
}
