//! Audit event types and emission functions.

use crate::core::{ContentDigest, ItemError, SessionOutcome, SessionReport};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record of a finished scan session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAuditEvent {
    /// Event type.
    pub event_type: String,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Session ID.
    pub session_id: String,

    /// Content digest.
    pub digest: String,

    /// Engine that performed the scan.
    pub engine: String,

    /// `clean`, `infected` or `error`.
    pub outcome: String,

    /// Threat names, if infected.
    pub threats: Vec<String>,

    /// Failure message, if the session failed.
    pub error: Option<String>,

    /// Number of items the daemon could not scan.
    pub item_error_count: usize,

    /// Session duration in milliseconds.
    pub duration_ms: u64,
}

impl From<&SessionReport> for SessionAuditEvent {
    fn from(report: &SessionReport) -> Self {
        let (threats, error) = match &report.outcome {
            SessionOutcome::Clean => (Vec::new(), None),
            SessionOutcome::Infected { findings } => {
                (findings.iter().map(str::to_string).collect(), None)
            }
            SessionOutcome::Error { message } => (Vec::new(), Some(message.clone())),
        };

        Self {
            event_type: "session_completed".to_string(),
            timestamp: report.completed_at,
            session_id: report.id.clone(),
            digest: report.digest.to_string(),
            engine: report.engine.clone(),
            outcome: outcome_str(&report.outcome).to_string(),
            threats,
            error,
            item_error_count: report.item_errors.len(),
            duration_ms: report.duration.as_millis() as u64,
        }
    }
}

fn outcome_str(outcome: &SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Clean => "clean",
        SessionOutcome::Infected { .. } => "infected",
        SessionOutcome::Error { .. } => "error",
    }
}

/// Emits an audit event for a session starting.
pub fn emit_session_started(session_id: &str, digest: &ContentDigest, engine: &str, target: &str) {
    tracing::info!(
        target: "scanwire::audit",
        event_type = "session_started",
        session_id = %session_id,
        digest = %digest,
        engine = %engine,
        scan_target = %target,
        "Scan session started"
    );
}

/// Emits an audit event for an item the daemon could not scan.
pub fn emit_item_error(session_id: &str, item: &ItemError) {
    tracing::warn!(
        target: "scanwire::audit",
        event_type = "item_error",
        session_id = %session_id,
        path = %item.path,
        detail = ?item.detail,
        "Scan failed for contained item"
    );
}

/// Emits an audit event for a completed session.
pub fn emit_session_completed(report: &SessionReport) {
    let event = SessionAuditEvent::from(report);

    tracing::info!(
        target: "scanwire::audit",
        event_type = %event.event_type,
        session_id = %event.session_id,
        digest = %event.digest,
        engine = %event.engine,
        outcome = %event.outcome,
        threats = ?event.threats,
        error = ?event.error,
        item_error_count = event.item_error_count,
        duration_ms = event.duration_ms,
        "Scan session completed"
    );
}
