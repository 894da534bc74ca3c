//! Time-based cleanup of synthesized clips.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AudioRetention {
    dir: PathBuf,
    max_age: Duration,
}

impl AudioRetention {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    /// Delete `.mp3` clips whose age is at least `max_age`
    ///
    /// Returns the number of deleted clips. Files that cannot be inspected or
    /// removed are logged and skipped.
    pub async fn sweep(&self) -> std::io::Result<usize> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let now = SystemTime::now();
        let mut deleted = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e != "mp3").unwrap_or(true) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read clip metadata");
                    continue;
                }
            };

            // Clock skew can put mtime in the future; treat that as brand new.
            let age = now.duration_since(modified).unwrap_or_default();
            if age < self.max_age {
                continue;
            }

            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete expired clip");
            } else {
                deleted += 1;
                debug!(path = %path.display(), "Deleted expired clip");
            }
        }

        if deleted > 0 {
            info!(deleted = deleted, "Cleaned up expired audio clips");
        }

        Ok(deleted)
    }

    /// Run [`AudioRetention::sweep`] every `interval` until the runtime stops
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        info!(
            "Audio retention enabled: max age {:?}, sweep every {:?}",
            self.max_age, interval
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    warn!(dir = %self.dir.display(), error = %e, "Audio retention sweep failed");
                }
            }
        })
    }
}
