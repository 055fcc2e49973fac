//! Core types and traits for the scanwire library.
//!
//! - [`types`] - Findings, session outcomes and verdicts
//! - [`traits`] - The `Scanner` and `VerdictSink` seams
//! - [`error`] - Structured error types
//! - [`input`] - Content handed in for scanning
//! - [`hasher`] - BLAKE3 content digests
//! - [`result`] - Session reports

pub mod error;
pub mod hasher;
pub mod input;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ProtocolViolation, ScanError};
pub use hasher::ContentHasher;
pub use input::ScanContent;
pub use result::{ItemError, SessionReport};
pub use traits::{Scanner, VerdictSink};
pub use types::{ContentDigest, FindingSet, SessionOutcome, ThreatInfo, Verdict};
