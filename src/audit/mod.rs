//! Structured audit logging.
//!
//! Audit events go through `tracing` under the `scanwire::audit` target so
//! any subscriber (JSON file, journald, OpenTelemetry) can capture them
//! separately from diagnostic logs.

mod events;

pub use events::{
    emit_item_error, emit_session_completed, emit_session_started, SessionAuditEvent,
};
