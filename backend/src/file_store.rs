//! Temporary storage for uploaded files.
//!
//! Uploaded bytes are written under the data directory and indexed in memory
//! by a generated id. Files are short-lived: a background sweep removes
//! entries older than [`TEMP_FILE_TTL`]. The index is not durable; losing it
//! on restart is fine because the files themselves expire within minutes.
//!
//! The sweep and a caller-initiated delete may race. Whoever removes the
//! index entry first owns the on-disk file; the loser observes "not found"
//! and a missing file on disk is never an error.

use crate::error::AppError;
use log::{error, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// How long an uploaded file stays available.
pub const TEMP_FILE_TTL: Duration = Duration::from_secs(10 * 60);

/// Pause between two runs of the background sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub const MAX_UPLOAD_MB: usize = 50;
pub const MAX_UPLOAD_BYTES: usize = MAX_UPLOAD_MB * 1024 * 1024;

/// File types accepted at the upload boundary.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// Boundary validation for an upload: extension must be one of
/// [`ALLOWED_EXTENSIONS`] and the size within the cap.
pub fn validate_upload(original_name: &str, size: usize) -> Result<(), AppError> {
    let ext = TempFileStore::extension_of(original_name);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::UnsupportedExtension(ext));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(AppError::FileTooLarge(MAX_UPLOAD_MB));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TempFileMeta {
    pub path: PathBuf,
    pub original_name: String,
    /// Lowercased extension including the dot, e.g. `".csv"`.
    pub extension: String,
    pub created_at: SystemTime,
}

impl TempFileMeta {
    pub fn is_excel(&self) -> bool {
        matches!(self.extension.as_str(), ".xlsx" | ".xls")
    }
}

pub struct TempFileStore {
    dir: PathBuf,
    ttl: Duration,
    index: RwLock<HashMap<String, TempFileMeta>>,
}

impl TempFileStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Extension of a filename, lowercased, including the dot.
    pub fn extension_of(name: &str) -> String {
        match name.rfind('.') {
            Some(i) => name[i..].to_lowercase(),
            None => String::new(),
        }
    }

    /// Writes the bytes under a fresh random id and records the metadata.
    /// The storage directory is created lazily; write errors propagate.
    pub async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, AppError> {
        std::fs::create_dir_all(&self.dir)?;

        let file_id = uuid::Uuid::new_v4().simple().to_string();
        let extension = Self::extension_of(original_name);
        let path = self.dir.join(format!("{file_id}{extension}"));
        std::fs::write(&path, bytes)?;

        let meta = TempFileMeta {
            path,
            original_name: original_name.to_string(),
            extension,
            created_at: SystemTime::now(),
        };
        self.index.write().await.insert(file_id.clone(), meta);
        info!("Temp file saved: {file_id} ({original_name})");

        Ok(file_id)
    }

    pub async fn metadata(&self, file_id: &str) -> Option<TempFileMeta> {
        self.index.read().await.get(file_id).cloned()
    }

    /// Removes the index entry and the on-disk file. Returns whether an
    /// entry existed; deleting twice is safe and returns `false` the second
    /// time.
    pub async fn delete(&self, file_id: &str) -> bool {
        let meta = self.index.write().await.remove(file_id);
        match meta {
            Some(meta) => {
                remove_file_if_present(&meta.path);
                true
            }
            None => false,
        }
    }

    /// One sweep pass with an explicit clock, so tests control time instead
    /// of waiting on real timers. Returns the number of removed entries; a
    /// failure to unlink one file never stops the pass.
    pub async fn sweep_expired_at(&self, now: SystemTime) -> usize {
        let expired: Vec<(String, TempFileMeta)> = {
            let mut index = self.index.write().await;
            let ids: Vec<String> = index
                .iter()
                .filter(|(_, meta)| {
                    now.duration_since(meta.created_at)
                        .is_ok_and(|age| age > self.ttl)
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| index.remove(&id).map(|meta| (id, meta)))
                .collect()
        };

        for (file_id, meta) in &expired {
            remove_file_if_present(&meta.path);
            info!("Temp file expired: {file_id} ({})", meta.original_name);
        }
        expired.len()
    }

    /// Spawns the periodic sweep. Abort the returned handle on shutdown.
    pub fn start_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            // the first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep_expired_at(SystemTime::now()).await;
                if removed > 0 {
                    info!("Sweep removed {removed} expired temp file(s)");
                }
            }
        })
    }
}

fn remove_file_if_present(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            error!("Failed to delete temp file {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> TempFileStore {
        TempFileStore::new(dir.path().join("temp"), TEMP_FILE_TTL)
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(TempFileStore::extension_of("Report.CSV"), ".csv");
        assert_eq!(TempFileStore::extension_of("archive.tar.xlsx"), ".xlsx");
        assert_eq!(TempFileStore::extension_of("noext"), "");
    }

    #[test]
    fn upload_validation() {
        assert!(validate_upload("report.csv", 10).is_ok());
        assert!(validate_upload("report.xlsx", 10).is_ok());
        assert!(matches!(
            validate_upload("report.pdf", 10),
            Err(AppError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            validate_upload("report.csv", MAX_UPLOAD_BYTES + 1),
            Err(AppError::FileTooLarge(_))
        ));
    }

    #[actix_web::test]
    async fn save_then_metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store.save(b"id;name\n1;Foo", "report.csv").await.unwrap();
        let meta = store.metadata(&id).await.unwrap();

        assert_eq!(meta.original_name, "report.csv");
        assert_eq!(meta.extension, ".csv");
        assert!(meta.path.exists());
        assert!(meta.created_at <= SystemTime::now());
        assert_eq!(std::fs::read(&meta.path).unwrap(), b"id;name\n1;Foo");
    }

    #[actix_web::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store.save(b"x", "a.csv").await.unwrap();
        let path = store.metadata(&id).await.unwrap().path;

        assert!(store.delete(&id).await);
        assert!(!path.exists());
        assert!(!store.delete(&id).await);
    }

    #[actix_web::test]
    async fn delete_of_unknown_id_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.delete("does-not-exist").await);
    }

    #[actix_web::test]
    async fn delete_survives_missing_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store.save(b"x", "a.csv").await.unwrap();
        let path = store.metadata(&id).await.unwrap().path;
        std::fs::remove_file(&path).unwrap();

        assert!(store.delete(&id).await);
    }

    #[actix_web::test]
    async fn sweep_removes_expired_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let id = store.save(b"x", "a.csv").await.unwrap();
        let created = store.metadata(&id).await.unwrap().created_at;
        let path = store.metadata(&id).await.unwrap().path;

        // Younger than the TTL: retained.
        let removed = store
            .sweep_expired_at(created + Duration::from_secs(5 * 60))
            .await;
        assert_eq!(removed, 0);
        assert!(store.metadata(&id).await.is_some());

        // Older than the TTL: removed, index and disk both.
        let removed = store
            .sweep_expired_at(created + TEMP_FILE_TTL + Duration::from_secs(1))
            .await;
        assert_eq!(removed, 1);
        assert!(store.metadata(&id).await.is_none());
        assert!(!path.exists());
    }
}
