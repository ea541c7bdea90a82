//! File content digests for out-of-band integrity comparison.
//!
//! The protocol itself carries no checksum; both peers hash what they have
//! on disk after the transfer and compare the digests through the batch
//! reports.

use std::fmt;
use std::io;
use std::path::Path;

use sha2::{Digest as _, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 digest of a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest([u8; 32]);

impl FileDigest {
    /// Digest of an in-memory byte string.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Hash a file's contents in streaming chunks.
pub async fn file_digest(path: impl AsRef<Path>) -> io::Result<FileDigest> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(FileDigest(hasher.finalize().into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            FileDigest::of_bytes(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            FileDigest::of_bytes(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_file_digest_matches_in_memory() {
        let path = std::env::temp_dir().join(format!("drift-digest-{}", std::process::id()));
        let contents: Vec<u8> = (0..200_000u32).map(|i| i as u8).collect();
        tokio::fs::write(&path, &contents).await.unwrap();

        let from_file = file_digest(&path).await.unwrap();
        assert_eq!(from_file, FileDigest::of_bytes(&contents));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[test]
    fn test_differing_contents_differ() {
        assert_ne!(FileDigest::of_bytes(b"a"), FileDigest::of_bytes(b"b"));
    }
}
