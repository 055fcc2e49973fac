//! Scan session reports.
//!
//! A `SessionReport` records one complete exchange with the daemon: the
//! terminal outcome, any per-item errors the daemon reported along the way,
//! and timing.

use crate::core::types::{ContentDigest, SessionOutcome, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A contained item the daemon could not scan.
///
/// Item errors are logged and recorded but never end the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Path of the item as reported by the daemon.
    pub path: String,
    /// Daemon-supplied detail, if any.
    pub detail: Option<String>,
}

/// The complete record of one scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique identifier for this session.
    pub id: String,

    /// Digest of the scanned content.
    pub digest: ContentDigest,

    /// Name of the engine that performed the scan.
    pub engine: String,

    /// The terminal outcome.
    pub outcome: SessionOutcome,

    /// Per-item errors reported by the daemon, in arrival order.
    #[serde(default)]
    pub item_errors: Vec<ItemError>,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session completed.
    pub completed_at: DateTime<Utc>,

    /// How long the session took.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl SessionReport {
    /// Creates a report for a session that ended now after `duration`.
    pub fn new(
        id: impl Into<String>,
        digest: ContentDigest,
        engine: impl Into<String>,
        outcome: SessionOutcome,
        duration: Duration,
    ) -> Self {
        let now = Utc::now();
        let elapsed = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            id: id.into(),
            digest,
            engine: engine.into(),
            outcome,
            item_errors: Vec::new(),
            started_at: now - elapsed,
            completed_at: now,
            duration,
        }
    }

    /// Attaches the per-item errors seen during the session.
    pub fn with_item_errors(mut self, item_errors: Vec<ItemError>) -> Self {
        self.item_errors = item_errors;
        self
    }

    /// Returns the caller-facing verdict.
    pub fn verdict(&self) -> Verdict {
        self.outcome.to_verdict(&self.engine)
    }

    /// Returns `true` if the content is clean.
    pub fn is_clean(&self) -> bool {
        self.outcome.is_clean()
    }

    /// Returns `true` if the content is infected.
    pub fn is_infected(&self) -> bool {
        self.outcome.is_infected()
    }
}

/// Serde helper for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FindingSet;

    fn digest() -> ContentDigest {
        ContentDigest::parse("abc123").unwrap()
    }

    #[test]
    fn test_report_verdict() {
        let findings: FindingSet = ["EICAR-Test-Signature"].into_iter().collect();
        let report = SessionReport::new(
            "s-1",
            digest(),
            "scand",
            SessionOutcome::Infected { findings },
            Duration::from_millis(40),
        );

        assert!(report.is_infected());
        let verdict = report.verdict();
        let threats = verdict.threats().unwrap();
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].name, "EICAR-Test-Signature");
        assert_eq!(threats[0].engine, "scand");
        assert!(report.started_at <= report.completed_at);
    }

    #[test]
    fn test_report_serializes_duration_as_millis() {
        let report = SessionReport::new(
            "s-2",
            digest(),
            "scand",
            SessionOutcome::Clean,
            Duration::from_millis(1500),
        )
        .with_item_errors(vec![ItemError {
            path: "/spool/abc123.tmp/inner.zip".into(),
            detail: Some("corrupt archive".into()),
        }]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["digest"], "abc123");
        assert_eq!(json["outcome"]["type"], "clean");
        assert_eq!(json["item_errors"][0]["detail"], "corrupt archive");

        let back: SessionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(1500));
        assert_eq!(back.item_errors.len(), 1);
    }

    #[test]
    fn test_report_rejects_bad_digest_on_deserialize() {
        let report = SessionReport::new(
            "s-3",
            digest(),
            "scand",
            SessionOutcome::Clean,
            Duration::from_millis(1),
        );
        let mut json = serde_json::to_value(&report).unwrap();
        json["digest"] = serde_json::Value::from("../escape");
        assert!(serde_json::from_value::<SessionReport>(json).is_err());
    }
}
