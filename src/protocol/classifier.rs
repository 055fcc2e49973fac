//! Response classification.
//!
//! Each received line falls into exactly one [`LineKind`]. The session
//! matches on the kind, so the set of branches it handles is closed.

/// Greeting sent once when the daemon accepts a connection.
pub const GREETING_PREFIX: &str = "220 ";
/// Heartbeat while a scan is running.
pub const PROGRESS_PREFIX: &str = "210 ";
/// End of the result stream for the requested target.
pub const TERMINAL_SUCCESS_PREFIX: &str = "200 ";
/// Prefix of a per-item result line, and of the scan command.
pub const RESULT_PREFIX: &str = "SCAN ";

/// What a single protocol line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `220 <banner>`
    Greeting,
    /// `210 <progress>`
    Progress,
    /// `SCAN <payload>`; carries the payload after the prefix.
    Result(&'a str),
    /// `200 <summary>`
    TerminalSuccess,
    /// Anything else.
    Unrecognized,
}

/// Classifies a terminator-stripped line.
pub fn classify(line: &str) -> LineKind<'_> {
    if is_terminal_success(line) {
        LineKind::TerminalSuccess
    } else if is_progress(line) {
        LineKind::Progress
    } else if is_greeting(line) {
        LineKind::Greeting
    } else if let Some(payload) = extract_result_payload(line) {
        LineKind::Result(payload)
    } else {
        LineKind::Unrecognized
    }
}

/// `true` iff the line starts with `220 `.
pub fn is_greeting(line: &str) -> bool {
    line.starts_with(GREETING_PREFIX)
}

/// `true` iff the line starts with `210 `.
pub fn is_progress(line: &str) -> bool {
    line.starts_with(PROGRESS_PREFIX)
}

/// `true` iff the line starts with `200 `.
pub fn is_terminal_success(line: &str) -> bool {
    line.starts_with(TERMINAL_SUCCESS_PREFIX)
}

/// Returns everything after the `SCAN ` prefix, or `None` for other lines.
pub fn extract_result_payload(line: &str) -> Option<&str> {
    line.strip_prefix(RESULT_PREFIX)
}
