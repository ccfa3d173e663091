//! On-disk storage for uploaded club images.
//!
//! Files are written to `<root>/clubs/images-<millis>.<ext>` and served by the
//! router under `/uploads`, so the public url of a file is
//! `/uploads/clubs/<filename>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const CLUB_IMAGE_DIR: &str = "clubs";
const PUBLIC_PREFIX: &str = "/uploads";

/// A file written by [`ImageStore::save`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served as `/uploads`
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn club_dir(&self) -> PathBuf {
        self.root.join(CLUB_IMAGE_DIR)
    }

    /// Write a club image with the given lowercase extension
    pub async fn save(&self, extension: &str, bytes: &[u8]) -> Result<StoredImage> {
        let dir = self.club_dir();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

        // Names are millisecond stamps; step forward until one is free.
        let mut stamp = Utc::now().timestamp_millis();
        loop {
            let filename = format!("images-{}.{}", stamp, extension);
            let path = dir.join(&filename);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    file.flush().await?;
                    debug!("Stored image {} ({} bytes)", path.display(), bytes.len());
                    return Ok(StoredImage {
                        url: format!("{}/{}/{}", PUBLIC_PREFIX, CLUB_IMAGE_DIR, filename),
                        filename,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create {}", path.display()));
                }
            }
        }
    }

    /// Best-effort removal; a missing file is not an error
    pub async fn remove(&self, filename: &str) {
        // Stored names never contain separators; refuse anything that does.
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            warn!("Refusing to remove suspicious image name {:?}", filename);
            return;
        }

        let path = self.club_dir().join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Removed image {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Image {} already gone", path.display())
            }
            Err(e) => warn!("Failed to remove image {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_writes_file_with_public_url() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let stored = store.save("png", b"fake png").await.expect("Failed to save image");

        assert!(stored.filename.starts_with("images-"));
        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/clubs/{}", stored.filename));
        let on_disk = std::fs::read(dir.path().join("clubs").join(&stored.filename)).unwrap();
        assert_eq!(on_disk, b"fake png");
    }

    #[tokio::test]
    async fn test_consecutive_saves_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());

        let first = store.save("jpg", b"1").await.unwrap();
        let second = store.save("jpg", b"2").await.unwrap();

        assert_ne!(first.filename, second.filename);
    }

    #[tokio::test]
    async fn test_remove_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path());
        let stored = store.save("jpeg", b"data").await.unwrap();

        store.remove(&stored.filename).await;
        store.remove(&stored.filename).await;
        store.remove("../../etc/passwd").await;

        assert!(!dir.path().join("clubs").join(&stored.filename).exists());
    }
}
