//! The scan session state machine.
//!
//! One session drives one connection through a single request:
//!
//! ```text
//! AwaitGreeting --220--> Requesting --SCAN sent--> AwaitResult --200--> Done
//!                                                  (loops on 210 and SCAN lines)
//! any other line, timeout or socket failure ------------------------> Error
//! ```
//!
//! The session neither opens nor closes the transport and never touches the
//! scan target on disk; both belong to the caller.

use crate::audit;
use crate::core::error::{ProtocolViolation, ScanError};
use crate::core::result::ItemError;
use crate::core::types::FindingSet;
use crate::protocol::classifier::{self, LineKind, RESULT_PREFIX};
use crate::protocol::parser::{self, ItemStatus};
use crate::protocol::transport::{LineTransport, TransportError};

use std::time::Duration;
use tracing::{debug, trace, warn};

/// Receive bounds for the two protocol stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Bound on the greeting line.
    pub greeting: Duration,
    /// Bound on each line after the scan command.
    pub result: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            greeting: Duration::from_secs(5),
            result: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitGreeting,
    Requesting,
    AwaitResult,
    Done,
}

/// Scans a single target over an already connected transport.
#[derive(Debug)]
pub struct ScanSession<'t, T: LineTransport + ?Sized> {
    transport: &'t mut T,
    timeouts: SessionTimeouts,
    session_id: String,
    findings: FindingSet,
    item_errors: Vec<ItemError>,
}

impl<'t, T: LineTransport + ?Sized> ScanSession<'t, T> {
    /// Creates a session over `transport`.
    pub fn new(transport: &'t mut T, timeouts: SessionTimeouts) -> Self {
        Self {
            transport,
            timeouts,
            session_id: String::new(),
            findings: FindingSet::new(),
            item_errors: Vec::new(),
        }
    }

    /// Tags log and audit events with a session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Per-item errors the daemon reported so far.
    pub fn item_errors(&self) -> &[ItemError] {
        &self.item_errors
    }

    /// Consumes the session, returning the recorded per-item errors.
    pub fn into_item_errors(self) -> Vec<ItemError> {
        self.item_errors
    }

    /// Runs the exchange for `target` to a terminal state.
    ///
    /// On success returns the distinct findings (empty means clean). On any
    /// error the findings gathered so far are dropped.
    ///
    /// # Errors
    ///
    /// - `ScanError::Timeout` if a line does not arrive in time.
    /// - `ScanError::Transport` if the connection fails or closes.
    /// - `ScanError::Protocol` for any reply the protocol does not allow.
    pub async fn run(&mut self, target: &str) -> Result<FindingSet, ScanError> {
        let mut state = State::AwaitGreeting;

        while state != State::Done {
            state = match state {
                State::AwaitGreeting => self.await_greeting().await?,
                State::Requesting => self.request(target).await?,
                State::AwaitResult => self.await_result().await?,
                State::Done => State::Done,
            };
        }

        debug!(
            session_id = %self.session_id,
            findings = self.findings.len(),
            item_errors = self.item_errors.len(),
            "Scan session done"
        );
        Ok(std::mem::take(&mut self.findings))
    }

    async fn await_greeting(&mut self) -> Result<State, ScanError> {
        let line = self.receive(self.timeouts.greeting, "greeting").await?;
        if !classifier::is_greeting(&line) {
            return Err(ProtocolViolation::GreetingExpected { line }.into());
        }
        trace!(session_id = %self.session_id, banner = %line, "Daemon greeting");
        Ok(State::Requesting)
    }

    async fn request(&mut self, target: &str) -> Result<State, ScanError> {
        let command = format!("{}{}", RESULT_PREFIX, target);
        self.transport
            .send_line(&command)
            .await
            .map_err(|e| ScanError::transport(format!("sending scan command: {}", e)))?;
        debug!(session_id = %self.session_id, target = %target, "Scan requested");
        Ok(State::AwaitResult)
    }

    async fn await_result(&mut self) -> Result<State, ScanError> {
        let line = self.receive(self.timeouts.result, "result").await?;

        let payload = match classifier::classify(&line) {
            LineKind::TerminalSuccess => return Ok(State::Done),
            LineKind::Progress => return Ok(State::AwaitResult),
            LineKind::Result(payload) => payload,
            LineKind::Greeting | LineKind::Unrecognized => {
                return Err(ProtocolViolation::UnexpectedResponse { line }.into());
            }
        };

        let entry = parser::parse_result_line(payload)?;
        match entry.item_status()? {
            ItemStatus::Error => {
                warn!(
                    session_id = %self.session_id,
                    path = %entry.path,
                    detail = ?entry.detail,
                    "Daemon could not scan item"
                );
                let item = ItemError {
                    path: entry.path.to_string(),
                    detail: entry.detail.map(str::to_string),
                };
                audit::emit_item_error(&self.session_id, &item);
                self.item_errors.push(item);
            }
            ItemStatus::Finding => {
                let name = entry.finding_name();
                debug!(session_id = %self.session_id, path = %entry.path, threat = %name, "Finding");
                self.findings.insert(name);
            }
            ItemStatus::Clean => {}
        }
        Ok(State::AwaitResult)
    }

    async fn receive(&mut self, bound: Duration, stage: &'static str) -> Result<String, ScanError> {
        self.transport
            .receive_line(bound)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(elapsed) => ScanError::timeout(stage, elapsed),
                other => ScanError::transport(format!("receiving {} line: {}", stage, other)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::testing::{Reply, ScriptedTransport};

    async fn run(transport: &mut ScriptedTransport) -> (Result<FindingSet, ScanError>, Vec<ItemError>) {
        let mut session = ScanSession::new(transport, SessionTimeouts::default());
        let result = session.run("/tmp/x.tmp").await;
        (result, session.into_item_errors())
    }

    #[tokio::test]
    async fn test_single_finding() {
        let mut transport = ScriptedTransport::with_lines(&[
            "220 ready",
            "SCAN /tmp/x.tmp\t2L\t0 EICAR-Test-Signature",
            "200 done",
        ]);
        let (result, _) = run(&mut transport).await;

        let findings = result.unwrap();
        assert_eq!(findings.iter().collect::<Vec<_>>(), vec!["EICAR-Test-Signature"]);
        assert_eq!(transport.sent, vec!["SCAN /tmp/x.tmp"]);
    }

    #[tokio::test]
    async fn test_no_items_is_clean() {
        let mut transport = ScriptedTransport::with_lines(&["220 ready", "200 done"]);
        let (result, item_errors) = run(&mut transport).await;
        assert!(result.unwrap().is_empty());
        assert!(item_errors.is_empty());
    }

    #[tokio::test]
    async fn test_item_error_does_not_abort() {
        let mut transport = ScriptedTransport::with_lines(&[
            "220 ready",
            "SCAN /tmp/x.tmp\t2E\tcorrupt archive",
            "200 done",
        ]);
        let (result, item_errors) = run(&mut transport).await;

        assert!(result.unwrap().is_empty());
        assert_eq!(
            item_errors,
            vec![ItemError {
                path: "/tmp/x.tmp".into(),
                detail: Some("corrupt archive".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_bad_greeting_sends_nothing() {
        let mut transport = ScriptedTransport::with_lines(&["421 busy"]);
        let (result, _) = run(&mut transport).await;

        match result.unwrap_err() {
            ScanError::Protocol(ProtocolViolation::GreetingExpected { line }) => {
                assert_eq!(line, "421 busy")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(transport.sent.is_empty());
    }

    #[tokio::test]
    async fn test_progress_and_duplicates() {
        let mut transport = ScriptedTransport::with_lines(&[
            "220 ready",
            "210 working",
            "SCAN /tmp/x.tmp/a.doc\t2L\t0 Macro.Bad",
            "210 working",
            "SCAN /tmp/x.tmp/b.doc\t2L\tMacro.Bad",
            "SCAN /tmp/x.tmp/c.txt\t2+",
            "SCAN /tmp/x.tmp/d.exe\t2L\tTrojan.Z",
            "200 done",
        ]);
        let (result, _) = run(&mut transport).await;

        let findings = result.unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings.contains("Macro.Bad"));
        assert!(findings.contains("Trojan.Z"));
    }

    #[tokio::test]
    async fn test_timeouts_per_stage() {
        let mut transport = ScriptedTransport::with_lines(&["220 ready", "210 working", "200 done"]);
        let (result, _) = run(&mut transport).await;
        assert!(result.is_ok());
        assert_eq!(
            transport.receive_timeouts,
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(10)
            ]
        );
    }

    #[tokio::test]
    async fn test_greeting_timeout() {
        let mut transport = ScriptedTransport::default().then(Reply::Timeout);
        let (result, _) = run(&mut transport).await;
        assert!(matches!(
            result.unwrap_err(),
            ScanError::Timeout { stage: "greeting", .. }
        ));
        assert!(transport.sent.is_empty());
    }

    #[tokio::test]
    async fn test_result_timeout_discards_findings() {
        let mut transport = ScriptedTransport::with_lines(&[
            "220 ready",
            "SCAN /tmp/x.tmp\t2L\tWorm.A",
        ])
        .then(Reply::Timeout);
        let (result, _) = run(&mut transport).await;
        assert!(matches!(
            result.unwrap_err(),
            ScanError::Timeout { stage: "result", .. }
        ));
    }

    #[tokio::test]
    async fn test_peer_hangup_is_transport_failure() {
        let mut transport = ScriptedTransport::with_lines(&["220 ready"]).then(Reply::Closed);
        let (result, _) = run(&mut transport).await;
        let err = result.unwrap_err();
        assert!(matches!(err, ScanError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_protocol_violations() {
        let cases: [(&str, fn(&ProtocolViolation) -> bool); 4] = [
            ("421 busy", |v: &ProtocolViolation| {
                matches!(v, ProtocolViolation::UnexpectedResponse { line } if line == "421 busy")
            }),
            ("220 again", |v: &ProtocolViolation| {
                matches!(v, ProtocolViolation::UnexpectedResponse { .. })
            }),
            ("SCAN /tmp/x.tmp 2L", |v: &ProtocolViolation| {
                matches!(v, ProtocolViolation::NoSeparator { .. })
            }),
            ("SCAN /tmp/x.tmp\t2Q\tweird", |v: &ProtocolViolation| {
                matches!(v, ProtocolViolation::UnexpectedStatus { status } if status == "2Q")
            }),
        ];

        for (line, check) in cases {
            let mut transport = ScriptedTransport::with_lines(&["220 ready", line, "200 done"]);
            let (result, _) = run(&mut transport).await;
            match result {
                Err(ScanError::Protocol(v)) => assert!(check(&v), "{} gave {:?}", line, v),
                other => panic!("{} gave {:?}", line, other),
            }
        }
    }
}
