//! Core traits for the scanwire library.
//!
//! `Scanner` is the seam the surrounding filtering framework calls into;
//! `VerdictSink` is where it receives the result.

use crate::core::error::ScanError;
use crate::core::input::ScanContent;
use crate::core::types::{ThreatInfo, Verdict};

use async_trait::async_trait;
use std::fmt::Debug;

/// A virus-scanning engine.
///
/// # Implementation Notes
///
/// - `scan` always produces exactly one verdict. Failures become
///   [`Verdict::Failed`], never a clean verdict.
/// - Health checks should be lightweight and not require content.
#[async_trait]
pub trait Scanner: Send + Sync + Debug {
    /// Returns the name of this scanner engine.
    fn name(&self) -> &str;

    /// Scans the given content.
    async fn scan(&self, content: &ScanContent) -> Verdict;

    /// Checks that the engine is reachable and ready to accept a scan.
    ///
    /// # Errors
    ///
    /// Returns the `ScanError` that a scan would have failed with.
    async fn health_check(&self) -> Result<(), ScanError>;
}

/// Receives the verdict for one scan request and applies policy to it.
pub trait VerdictSink {
    /// The content is clean.
    fn clean(&mut self);

    /// Called once per distinct threat found in the content.
    fn infected(&mut self, threat: &ThreatInfo);

    /// The content could not be verified.
    fn failed(&mut self, message: &str, confidence: f32);
}
