//! Content handed in for scanning.
//!
//! The daemon scans files, not streams, so content is always materialized
//! to the spool directory under its digest before a session starts.

use crate::core::error::ScanError;
use crate::core::hasher::ContentHasher;
use crate::core::types::ContentDigest;

/// A content blob plus the digest that names its scan target.
///
/// # Examples
///
/// ```rust
/// use scanwire::core::ScanContent;
///
/// let content = ScanContent::from_bytes(b"message body".to_vec()).with_filename("mail.eml");
/// assert_eq!(content.size(), 12);
/// assert_eq!(content.filename(), Some("mail.eml"));
/// ```
#[derive(Clone)]
pub struct ScanContent {
    data: Vec<u8>,
    digest: ContentDigest,
    filename: Option<String>,
}

impl std::fmt::Debug for ScanContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContent")
            .field("data_len", &self.data.len())
            .field("digest", &self.digest)
            .field("filename", &self.filename)
            .finish()
    }
}

impl ScanContent {
    /// Wraps content with a digest supplied by the caller.
    pub fn new(data: impl Into<Vec<u8>>, digest: ContentDigest) -> Self {
        Self {
            data: data.into(),
            digest,
            filename: None,
        }
    }

    /// Wraps content with a caller-supplied digest string, validating it.
    pub fn with_digest_str(data: impl Into<Vec<u8>>, digest: &str) -> Result<Self, ScanError> {
        Ok(Self::new(data, ContentDigest::parse(digest)?))
    }

    /// Wraps content, computing its BLAKE3 digest.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let digest = ContentHasher::new().hash_bytes(&data);
        Self::new(data, digest)
    }

    /// Sets the original filename, used only for logging.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns the content bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the content digest.
    pub fn digest(&self) -> &ContentDigest {
        &self.digest
    }

    /// Returns the original filename, if known.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Returns the size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl From<Vec<u8>> for ScanContent {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl From<&[u8]> for ScanContent {
    fn from(data: &[u8]) -> Self {
        Self::from_bytes(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_digest() {
        let a = ScanContent::from_bytes(b"payload".to_vec());
        let b: ScanContent = b"payload".as_slice().into();
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_caller_supplied_digest() {
        let content = ScanContent::with_digest_str(vec![1, 2, 3], "msg-0001").unwrap();
        assert_eq!(content.digest().as_str(), "msg-0001");
        assert_eq!(content.size(), 3);

        assert!(ScanContent::with_digest_str(vec![1], "a/b").is_err());
    }

    #[test]
    fn test_debug_hides_data() {
        let content = ScanContent::from_bytes(vec![0u8; 4096]);
        let text = format!("{:?}", content);
        assert!(text.contains("data_len: 4096"));
    }
}
