//! Result-line parsing.
//!
//! A result payload is `<path>\t<status>[\t<detail>]`. Only the first two
//! TABs separate fields; the detail keeps any TABs it contains.

use crate::core::error::ProtocolViolation;

/// Field separator inside a result payload.
pub const FIELD_SEPARATOR: char = '\t';

/// Prefix some daemons put before a threat name in the detail field.
pub const FINDING_NAME_PREFIX: &str = "0 ";

/// One parsed result line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEntry<'a> {
    /// Path of the scanned item. May name a member inside an archive.
    pub path: &'a str,
    /// Two-character status code.
    pub status: &'a str,
    /// Everything after the second TAB, if there was one.
    pub detail: Option<&'a str>,
}

/// What the daemon concluded about one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// `E`: the item could not be scanned.
    Error,
    /// `L`: the item contains a finding.
    Finding,
    /// `+`: nothing found.
    Clean,
}

impl<'a> ResultEntry<'a> {
    /// Decodes the status discriminant (second character of the status code).
    pub fn item_status(&self) -> Result<ItemStatus, ProtocolViolation> {
        match self.status.chars().nth(1) {
            Some('E') => Ok(ItemStatus::Error),
            Some('L') => Ok(ItemStatus::Finding),
            Some('+') => Ok(ItemStatus::Clean),
            _ => Err(ProtocolViolation::UnexpectedStatus {
                status: self.status.to_string(),
            }),
        }
    }

    /// The threat name carried by a finding, without the `0 ` prefix.
    pub fn finding_name(&self) -> &'a str {
        finding_name(self.detail.unwrap_or(""))
    }
}

/// Splits a result payload into its fields.
///
/// # Errors
///
/// Returns `ProtocolViolation::NoSeparator` when the payload has no TAB.
pub fn parse_result_line(payload: &str) -> Result<ResultEntry<'_>, ProtocolViolation> {
    let (path, rest) =
        payload
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| ProtocolViolation::NoSeparator {
                payload: payload.to_string(),
            })?;

    let (status, detail) = match rest.split_once(FIELD_SEPARATOR) {
        Some((status, detail)) => (status, Some(detail)),
        None => (rest, None),
    };

    Ok(ResultEntry {
        path,
        status,
        detail,
    })
}

/// Strips exactly one leading `0 ` from a detail string.
pub fn finding_name(detail: &str) -> &str {
    detail.strip_prefix(FINDING_NAME_PREFIX).unwrap_or(detail)
}
