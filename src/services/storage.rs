use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::AppError;

/// Where an uploaded payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub stored_name: String,
    pub url: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, AppError>;

    /// Removes a previously stored payload. Returns false when `url` is not
    /// one of ours or the file is already gone.
    async fn remove(&self, url: &str) -> Result<bool, AppError>;
}

pub struct DiskStorage {
    root: PathBuf,
    url_prefix: String,
    last_stamp: AtomicI64,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Millisecond stamp, strictly increasing across calls.
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_stamp.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    fn stored_name_for(&self, original_name: &str) -> String {
        let (base, ext) = split_file_name(original_name);
        format!("{}-{}{}", self.next_stamp(), base, ext)
    }
}

/// Splits the last path component of `name` into a base and an extension
/// (with its dot). Separators of either platform are stripped.
fn split_file_name(name: &str) -> (String, String) {
    let file = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let file = if file.is_empty() || file == "." || file == ".." {
        "file"
    } else {
        file
    };

    match file.rfind('.') {
        Some(idx) if idx > 0 => (file[..idx].to_string(), file[idx..].to_string()),
        _ => (file.to_string(), String::new()),
    }
}

#[async_trait]
impl FileStorage for DiskStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let stored_name = self.stored_name_for(original_name);
        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, bytes).await?;
        debug!("stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile {
            url: format!("{}/{}", self.url_prefix, stored_name),
            stored_name,
        })
    }

    async fn remove(&self, url: &str) -> Result<bool, AppError> {
        let Some(name) = url
            .strip_prefix(&self.url_prefix)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(false);
        };
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            warn!("refusing to remove suspicious upload path {url}");
            return Ok(false);
        }

        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_base_and_extension() {
        assert_eq!(split_file_name("notes.pdf"), ("notes".into(), ".pdf".into()));
        assert_eq!(split_file_name("archive.tar.gz"), ("archive.tar".into(), ".gz".into()));
        assert_eq!(split_file_name("README"), ("README".into(), "".into()));
        assert_eq!(split_file_name(".env"), (".env".into(), "".into()));
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(split_file_name("../../etc/passwd"), ("passwd".into(), "".into()));
        assert_eq!(split_file_name("C:\\Users\\me\\hw.docx"), ("hw".into(), ".docx".into()));
        assert_eq!(split_file_name("dir/"), ("file".into(), "".into()));
    }

    #[test]
    fn stamps_strictly_increase() {
        let storage = DiskStorage::new("unused", "/uploads");
        let a = storage.next_stamp();
        let b = storage.next_stamp();
        let c = storage.next_stamp();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn same_name_twice_yields_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path(), "/uploads");

        let first = storage.store("notes.pdf", b"one").await.unwrap();
        let second = storage.store("notes.pdf", b"two").await.unwrap();

        assert_ne!(first.stored_name, second.stored_name);
        assert!(first.stored_name.ends_with("-notes.pdf"));
        assert_eq!(first.url, format!("/uploads/{}", first.stored_name));
        assert_eq!(std::fs::read(dir.path().join(&first.stored_name)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second.stored_name)).unwrap(), b"two");
    }

    #[tokio::test]
    async fn remove_only_touches_own_urls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path(), "/uploads");
        let stored = storage.store("a.txt", b"x").await.unwrap();

        assert!(!storage.remove("/elsewhere/a.txt").await.unwrap());
        assert!(!storage.remove("/uploads/../secret").await.unwrap());
        assert!(storage.remove(&stored.url).await.unwrap());
        assert!(!storage.remove(&stored.url).await.unwrap());
    }
}
