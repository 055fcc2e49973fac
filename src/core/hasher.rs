//! Content digests with BLAKE3.
//!
//! The digest names the transient scan target, so identical content always
//! maps to the same spool path. Callers that already carry a digest can
//! skip this and build a [`ContentDigest`] directly.

use crate::core::error::ScanError;
use crate::core::types::ContentDigest;

use std::io::Read;
use std::path::Path;

/// Computes BLAKE3 content digests.
///
/// # Examples
///
/// ```rust
/// use scanwire::core::ContentHasher;
///
/// let digest = ContentHasher::new().hash_bytes(b"hello world");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentHasher {
    _private: (),
}

impl ContentHasher {
    /// Creates a new `ContentHasher`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the digest of in-memory bytes.
    pub fn hash_bytes(&self, data: &[u8]) -> ContentDigest {
        hex_digest(blake3::hash(data))
    }

    /// Computes the digest of a file on disk, streaming its contents.
    pub fn hash_file(&self, path: &Path) -> Result<ContentDigest, ScanError> {
        let file = std::fs::File::open(path).map_err(|source| ScanError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = std::io::BufReader::new(file);
        self.hash_reader(&mut reader)
            .map_err(|source| ScanError::Artifact {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Computes the digest of everything a reader yields.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<ContentDigest> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(hex_digest(hasher.finalize()))
    }
}

fn hex_digest(hash: blake3::Hash) -> ContentDigest {
    // Lowercase hex needs no validation.
    ContentDigest(hash.to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_deterministic() {
        let hasher = ContentHasher::new();
        let data = b"test data for hashing";
        assert_eq!(hasher.hash_bytes(data), hasher.hash_bytes(data));
    }

    #[test]
    fn test_hash_different_data() {
        let hasher = ContentHasher::new();
        assert_ne!(hasher.hash_bytes(b"data1"), hasher.hash_bytes(b"data2"));
    }

    #[test]
    fn test_hash_file_matches_bytes() {
        let hasher = ContentHasher::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file contents").unwrap();

        let from_file = hasher.hash_file(file.path()).unwrap();
        assert_eq!(from_file, hasher.hash_bytes(b"file contents"));
    }

    #[test]
    fn test_hash_missing_file() {
        let hasher = ContentHasher::new();
        let err = hasher
            .hash_file(Path::new("/nonexistent/scanwire/file"))
            .unwrap_err();
        assert!(matches!(err, ScanError::Artifact { .. }));
    }
}
