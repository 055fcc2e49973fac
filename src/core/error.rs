//! Error types for the scanwire library.
//!
//! Every terminal condition of a scan session is a `ScanError`. Per-item
//! errors reported by the daemon are not errors at this level; they are
//! recorded on the session report and scanning continues.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The daemon socket could not be reached (absent, refused, permission).
    #[error("connection to scan daemon at '{address}' failed: {message}")]
    ConnectionFailed {
        /// Socket address that was dialed.
        address: String,
        /// Error message describing the failure.
        message: String,
    },

    /// No line arrived within the receive bound.
    #[error("timed out after {elapsed:?} waiting for {stage} line")]
    Timeout {
        /// Protocol stage that was waiting (`greeting` or `result`).
        stage: &'static str,
        /// The bound that was exceeded.
        elapsed: Duration,
    },

    /// Sending or receiving a line failed, or the daemon hung up.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The daemon said something the protocol does not allow.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// The transient scan target could not be written.
    #[error("cannot write scan target {}: {source}", path.display())]
    Artifact {
        /// Path of the scan target.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The content digest cannot be used as a file name.
    #[error("invalid content digest '{digest}'")]
    InvalidDigest {
        /// The rejected digest.
        digest: String,
    },

    /// The content exceeds the maximum allowed size.
    #[error("content size {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual content size in bytes.
        size: u64,
        /// Maximum allowed size in bytes.
        max: u64,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

/// A reply the scan protocol does not permit at the point it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The first line was not a `220` greeting.
    #[error("greeting expected, got: {line}")]
    GreetingExpected {
        /// The line received instead.
        line: String,
    },

    /// A line that is neither progress, result, nor terminal success.
    #[error("unexpected response: {line}")]
    UnexpectedResponse {
        /// The offending line.
        line: String,
    },

    /// A result payload without a TAB field separator.
    #[error("no separator in result: {payload}")]
    NoSeparator {
        /// The offending payload.
        payload: String,
    },

    /// A status code whose discriminant is not `E`, `L` or `+`.
    #[error("unexpected status: {status}")]
    UnexpectedStatus {
        /// The raw status code.
        status: String,
    },
}

impl ScanError {
    /// Returns `true` if the error came from the socket rather than the
    /// daemon's replies.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Transport { .. }
        )
    }

    /// Returns `true` if the daemon violated the protocol.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(stage: &'static str, elapsed: Duration) -> Self {
        Self::Timeout { stage, elapsed }
    }

    /// Creates a `Transport` error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_classification() {
        let timeout = ScanError::timeout("greeting", Duration::from_secs(5));
        assert!(timeout.is_transport_failure());
        assert!(!timeout.is_protocol_violation());

        let violation: ScanError = ProtocolViolation::UnexpectedStatus {
            status: "2X".into(),
        }
        .into();
        assert!(violation.is_protocol_violation());
        assert!(!violation.is_transport_failure());
    }

    #[test]
    fn test_scan_error_display_includes_offending_text() {
        let err: ScanError = ProtocolViolation::UnexpectedResponse {
            line: "421 busy".into(),
        }
        .into();
        assert!(err.to_string().contains("421 busy"));

        let err: ScanError = ProtocolViolation::UnexpectedStatus {
            status: "2Q".into(),
        }
        .into();
        assert!(err.to_string().contains("unexpected status: 2Q"));
    }

    #[test]
    fn test_artifact_error_display() {
        let err = ScanError::Artifact {
            path: PathBuf::from("/spool/abc.tmp"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let text = err.to_string();
        assert!(text.contains("/spool/abc.tmp"));
        assert!(text.contains("denied"));
    }
}
