//! Temporary storage for uploaded image frames.
//!
//! A frame lives on disk only while the classifier reads it. The returned
//! [`StoredFrame`] removes its file when dropped, so cleanup happens on every
//! exit path of a request.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FrameStoreError {
    #[error("Failed to create frame directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write frame: {0}")]
    Write(std::io::Error),
}

/// Map an upload content type to the file extension used for the frame
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    match mime.as_deref() {
        Some("image/png") => "png",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some("image/bmp") => "bmp",
        _ => "jpg",
    }
}

/// Writes frames into a single directory under unique names
#[derive(Debug, Clone)]
pub struct FrameStore {
    dir: PathBuf,
}

impl FrameStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist `bytes` as `temp_<uuid>.<ext>` and return a guard owning the file
    pub async fn store(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<StoredFrame, FrameStoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(FrameStoreError::CreateDir)?;

        let filename = format!("temp_{}.{}", Uuid::new_v4(), extension_for(content_type));
        let path = self.dir.join(filename);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(FrameStoreError::Write)?;

        // From here on the guard owns the file, so a failed write still cleans up.
        let frame = StoredFrame {
            path,
            released: false,
        };

        file.write_all(bytes).await.map_err(FrameStoreError::Write)?;
        file.flush().await.map_err(FrameStoreError::Write)?;

        debug!(path = %frame.path.display(), bytes = bytes.len(), "Stored frame");
        Ok(frame)
    }
}

/// A frame file on disk, removed on [`StoredFrame::delete`] or drop
#[derive(Debug)]
pub struct StoredFrame {
    path: PathBuf,
    released: bool,
}

impl StoredFrame {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now. Failure is logged, never returned.
    pub async fn delete(mut self) {
        self.released = true;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "Failed to delete frame");
        }
    }
}

impl Drop for StoredFrame {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed frame on drop"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to delete frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("IMAGE/WEBP")), "webp");
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/png; charset=binary")), "png");
        assert_eq!(extension_for(Some("application/octet-stream")), "jpg");
        assert_eq!(extension_for(None), "jpg");
    }

    #[tokio::test]
    async fn test_store_writes_bytes() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        let frame = store.store(b"jpeg-bytes", Some("image/jpeg")).await.unwrap();
        let name = frame.path().file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with("temp_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(std::fs::read(frame.path()).unwrap(), b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_store_names_are_unique() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        let a = store.store(b"a", None).await.unwrap();
        let b = store.store(b"a", None).await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_store_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path().join("frames"));

        let frame = store.store(b"x", Some("image/png")).await.unwrap();
        assert!(frame.path().exists());
        assert!(frame.path().to_string_lossy().ends_with(".png"));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        let frame = store.store(b"x", None).await.unwrap();
        let path = frame.path().to_path_buf();
        frame.delete().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        let path = {
            let frame = store.store(b"x", None).await.unwrap();
            frame.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let store = FrameStore::new(dir.path());

        let frame = store.store(b"x", None).await.unwrap();
        std::fs::remove_file(frame.path()).unwrap();
        frame.delete().await;
    }
}
