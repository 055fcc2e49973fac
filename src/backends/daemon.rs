//! Scan daemon backend.
//!
//! This module provides a scanner that talks to a local virus-scanning
//! daemon over its line protocol. One scan request is one connection:
//!
//! 1. connect to the daemon socket (single attempt),
//! 2. write the content to `<spool_dir>/<digest>.tmp`,
//! 3. run the scan session for that path,
//! 4. remove the file,
//! 5. close the connection,
//! 6. reduce the session outcome to a verdict.
//!
//! # Requirements
//!
//! - the daemon must be running and listening on `socket_path`
//! - the daemon process must be able to read files in `spool_dir`

use crate::audit;
use crate::backends::spool::SpoolDir;
use crate::core::{
    FindingSet, ItemError, ProtocolViolation, ScanContent, ScanError, Scanner, SessionOutcome,
    SessionReport, Verdict,
};
use crate::protocol::classifier;
use crate::protocol::session::{ScanSession, SessionTimeouts};
use crate::protocol::transport::{LineTransport, TransportError, UnixLineTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Scan daemon configuration.
///
/// All fields have defaults, so a partial config file is enough.
/// Durations are given in milliseconds when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Path to the daemon's Unix socket.
    pub socket_path: PathBuf,

    /// Directory for transient scan targets. Must be absolute and readable
    /// by the daemon.
    pub spool_dir: PathBuf,

    /// Bound on establishing the connection.
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,

    /// Bound on receiving the greeting.
    #[serde(with = "duration_millis")]
    pub greeting_timeout: Duration,

    /// Bound on receiving each line after the scan command.
    #[serde(with = "duration_millis")]
    pub result_timeout: Duration,

    /// Maximum content size to scan.
    pub max_file_size: u64,

    /// Engine name attached to reported threats.
    pub engine_name: String,

    /// Log clean verdicts at info level instead of debug.
    pub log_clean: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let timeouts = SessionTimeouts::default();
        Self {
            socket_path: PathBuf::from("/var/run/scand/scand.sock"),
            spool_dir: PathBuf::from("/tmp"),
            connect_timeout: Duration::from_secs(5),
            greeting_timeout: timeouts.greeting,
            result_timeout: timeouts.result,
            max_file_size: 100 * 1024 * 1024, // 100 MB
            engine_name: "scand".to_string(),
            log_clean: false,
        }
    }
}

impl DaemonConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the daemon socket path.
    pub fn with_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Sets the spool directory.
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = dir.into();
        self
    }

    /// Sets the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the greeting timeout.
    pub fn with_greeting_timeout(mut self, timeout: Duration) -> Self {
        self.greeting_timeout = timeout;
        self
    }

    /// Sets the per-line result timeout.
    pub fn with_result_timeout(mut self, timeout: Duration) -> Self {
        self.result_timeout = timeout;
        self
    }

    /// Sets the maximum content size.
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Sets the engine name.
    pub fn with_engine_name(mut self, name: impl Into<String>) -> Self {
        self.engine_name = name.into();
        self
    }

    /// Enables or disables info-level logging of clean verdicts.
    pub fn with_log_clean(mut self, enabled: bool) -> Self {
        self.log_clean = enabled;
        self
    }

    /// Returns the session receive bounds.
    pub fn timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            greeting: self.greeting_timeout,
            result: self.result_timeout,
        }
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Configuration` naming the first bad field.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ScanError::configuration("socket_path must not be empty"));
        }
        if !self.spool_dir.is_absolute() {
            return Err(ScanError::configuration(format!(
                "spool_dir must be absolute, got {}",
                self.spool_dir.display()
            )));
        }
        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("greeting_timeout", self.greeting_timeout),
            ("result_timeout", self.result_timeout),
        ] {
            if value.is_zero() {
                return Err(ScanError::configuration(format!("{} must be non-zero", name)));
            }
        }
        if self.engine_name.trim().is_empty() {
            return Err(ScanError::configuration("engine_name must not be empty"));
        }
        Ok(())
    }
}

/// Scanner backed by a local scan daemon.
///
/// # Example
///
/// ```rust,no_run
/// use scanwire::backends::{DaemonConfig, DaemonScanner};
/// use scanwire::core::{ScanContent, Scanner};
///
/// # async fn run() -> Result<(), scanwire::core::ScanError> {
/// let config = DaemonConfig::new()
///     .with_socket("/var/run/scand/scand.sock")
///     .with_spool_dir("/var/spool/scanwire");
/// let scanner = DaemonScanner::new(config)?;
///
/// let verdict = scanner.scan(&ScanContent::from_bytes(b"body".to_vec())).await;
/// println!("{:?}", verdict);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DaemonScanner {
    config: DaemonConfig,
    spool: SpoolDir,
}

impl DaemonScanner {
    /// Creates a scanner, validating the configuration once.
    pub fn new(config: DaemonConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let spool = SpoolDir::new(config.spool_dir.clone());
        Ok(Self { config, spool })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Scans content and returns the full session report.
    ///
    /// Always produces a report; failures are recorded in its outcome.
    pub async fn scan_report(&self, content: &ScanContent) -> SessionReport {
        let session_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        let target = self.spool.target_path(content.digest());
        audit::emit_session_started(
            &session_id,
            content.digest(),
            &self.config.engine_name,
            &target.to_string_lossy(),
        );

        let (result, item_errors) = match self.check_size(content) {
            Err(e) => (Err(e), Vec::new()),
            Ok(()) => {
                match UnixLineTransport::connect(&self.config.socket_path, self.config.connect_timeout)
                    .await
                {
                    Err(e) => (Err(e), Vec::new()),
                    Ok(mut transport) => {
                        self.run_with_transport(&mut transport, content, &session_id)
                            .await
                    }
                }
            }
        };

        self.finish(session_id, content, result, item_errors, start.elapsed())
    }

    /// Runs steps 2 to 5 over an already connected transport, which is
    /// closed exactly once before returning.
    pub(crate) async fn run_with_transport<T: LineTransport + ?Sized>(
        &self,
        transport: &mut T,
        content: &ScanContent,
        session_id: &str,
    ) -> (Result<FindingSet, ScanError>, Vec<ItemError>) {
        let result = self.scan_target(transport, content, session_id).await;
        transport.close().await;
        result
    }

    async fn scan_target<T: LineTransport + ?Sized>(
        &self,
        transport: &mut T,
        content: &ScanContent,
        session_id: &str,
    ) -> (Result<FindingSet, ScanError>, Vec<ItemError>) {
        let target = match self.spool.materialize(content).await {
            Ok(path) => path,
            Err(e) => return (Err(e), Vec::new()),
        };

        let mut session =
            ScanSession::new(transport, self.config.timeouts()).with_session_id(session_id);
        let result = session.run(&target.to_string_lossy()).await;
        let item_errors = session.into_item_errors();

        self.spool.remove(&target).await;
        (result, item_errors)
    }

    fn check_size(&self, content: &ScanContent) -> Result<(), ScanError> {
        if content.size() > self.config.max_file_size {
            return Err(ScanError::FileTooLarge {
                size: content.size(),
                max: self.config.max_file_size,
            });
        }
        Ok(())
    }

    fn finish(
        &self,
        session_id: String,
        content: &ScanContent,
        result: Result<FindingSet, ScanError>,
        item_errors: Vec<ItemError>,
        duration: Duration,
    ) -> SessionReport {
        if let Err(e) = &result {
            error!(
                session_id = %session_id,
                digest = %content.digest(),
                error = %e,
                "Scan failed"
            );
        }

        let outcome = SessionOutcome::from_result(result);
        let report = SessionReport::new(
            session_id,
            content.digest().clone(),
            self.config.engine_name.clone(),
            outcome,
            duration,
        )
        .with_item_errors(item_errors);

        match &report.outcome {
            SessionOutcome::Clean if self.config.log_clean => info!(
                session_id = %report.id,
                digest = %report.digest,
                filename = ?content.filename(),
                "Content is clean"
            ),
            SessionOutcome::Clean => debug!(
                session_id = %report.id,
                digest = %report.digest,
                "Content is clean"
            ),
            SessionOutcome::Infected { findings } => warn!(
                session_id = %report.id,
                digest = %report.digest,
                filename = ?content.filename(),
                threats = ?findings.iter().collect::<Vec<_>>(),
                "Content is infected"
            ),
            SessionOutcome::Error { .. } => {}
        }

        audit::emit_session_completed(&report);
        report
    }
}

#[async_trait]
impl Scanner for DaemonScanner {
    fn name(&self) -> &str {
        &self.config.engine_name
    }

    async fn scan(&self, content: &ScanContent) -> Verdict {
        self.scan_report(content).await.verdict()
    }

    async fn health_check(&self) -> Result<(), ScanError> {
        let mut transport =
            UnixLineTransport::connect(&self.config.socket_path, self.config.connect_timeout)
                .await?;

        let received = transport.receive_line(self.config.greeting_timeout).await;
        transport.close().await;

        match received {
            Ok(line) if classifier::is_greeting(&line) => Ok(()),
            Ok(line) => Err(ProtocolViolation::GreetingExpected { line }.into()),
            Err(TransportError::Timeout(elapsed)) => Err(ScanError::timeout("greeting", elapsed)),
            Err(e) => Err(ScanError::transport(format!("receiving greeting line: {}", e))),
        }
    }
}

/// Serde helper for millisecond durations.
mod duration_millis {
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
