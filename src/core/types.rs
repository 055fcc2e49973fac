//! Core types used throughout the scanwire library.
//!
//! This module defines the finding set accumulated during a session, the
//! terminal session outcome, and the caller-facing verdict derived from it.

use crate::core::error::ScanError;
use crate::core::traits::VerdictSink;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Content-addressed name of a scan target.
///
/// The digest becomes a file name inside the spool directory, so only
/// ASCII alphanumerics, `-` and `_` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest(pub(crate) String);

impl ContentDigest {
    /// Validates and wraps a digest string.
    pub fn parse(digest: impl Into<String>) -> Result<Self, ScanError> {
        let digest = digest.into();
        let valid = !digest.is_empty()
            && digest
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Self(digest))
        } else {
            Err(ScanError::InvalidDigest { digest })
        }
    }

    /// Returns the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = ScanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.0
    }
}

/// Distinct threat names reported during one session.
///
/// Names are kept sorted so verdicts are reported in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingSet(BTreeSet<String>);

impl FindingSet {
    /// Creates an empty finding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a threat name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Returns `true` if the name has been reported.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FindingSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The terminal result of one scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The daemon reported no findings.
    Clean,

    /// The daemon reported one or more findings.
    Infected {
        /// Distinct threat names.
        findings: FindingSet,
    },

    /// The session ended in an error; any findings gathered so far are discarded.
    Error {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl SessionOutcome {
    /// Reduces a session result into an outcome.
    pub fn from_result(result: Result<FindingSet, ScanError>) -> Self {
        match result {
            Ok(findings) if findings.is_empty() => Self::Clean,
            Ok(findings) => Self::Infected { findings },
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }

    /// Returns `true` if the outcome indicates clean content.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns `true` if the outcome indicates infected content.
    pub fn is_infected(&self) -> bool {
        matches!(self, Self::Infected { .. })
    }

    /// Returns `true` if the session failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Translates the outcome into the caller-facing verdict.
    pub fn to_verdict(&self, engine: &str) -> Verdict {
        match self {
            Self::Clean => Verdict::Clean,
            Self::Infected { findings } => Verdict::Infected {
                threats: findings
                    .iter()
                    .map(|name| ThreatInfo::new(name, engine))
                    .collect(),
            },
            Self::Error { message } => Verdict::Failed {
                message: message.clone(),
                confidence: 0.0,
            },
        }
    }
}

/// Information about a detected threat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatInfo {
    /// Name of the threat as reported by the daemon.
    pub name: String,

    /// Name of the engine that detected this threat.
    pub engine: String,
}

impl ThreatInfo {
    /// Creates a new `ThreatInfo`.
    pub fn new(name: impl Into<String>, engine: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: engine.into(),
        }
    }
}

/// The verdict handed to the filtering policy for one scan request.
///
/// Errors are never reported as clean: a failed scan means the content
/// could not be verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    /// No threats detected.
    Clean,

    /// One or more distinct threats found.
    Infected {
        /// One entry per distinct threat name.
        threats: Vec<ThreatInfo>,
    },

    /// The scan could not be completed.
    Failed {
        /// Reason for the failure.
        message: String,
        /// Confidence in the verdict; always `0.0` for failures.
        confidence: f32,
    },
}

impl Verdict {
    /// Returns `true` if the content is clean.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Returns `true` if the content is infected.
    pub fn is_infected(&self) -> bool {
        matches!(self, Self::Infected { .. })
    }

    /// Returns `true` if the scan failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns the threats if infected.
    pub fn threats(&self) -> Option<&[ThreatInfo]> {
        match self {
            Self::Infected { threats } => Some(threats),
            _ => None,
        }
    }

    /// Delivers the verdict: one `infected` call per threat, or a single
    /// `clean` or `failed` call.
    pub fn report_to<S: VerdictSink + ?Sized>(&self, sink: &mut S) {
        match self {
            Self::Clean => sink.clean(),
            Self::Infected { threats } => {
                for threat in threats {
                    sink.infected(threat);
                }
            }
            Self::Failed {
                message,
                confidence,
            } => sink.failed(message, *confidence),
        }
    }
}
