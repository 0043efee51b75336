/// Blob storage for feed pictures
///
/// Paths handed to the storage are relative to its root (`feed/{feed_id}/{name}`).
use crate::models::PictureUpload;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Create a folder and any missing parents
    async fn make_folder(&self, path: &str) -> io::Result<()>;

    /// Collision-resistant name for an upload, keeping its extension
    fn random_filename(&self, upload: &PictureUpload) -> String;

    async fn write(&self, upload: &PictureUpload, path: &str) -> io::Result<()>;

    /// Remove a folder; a missing folder is not an error
    async fn delete_folder(&self, path: &str, recursive: bool) -> io::Result<()>;
}

/// Folder holding every picture of a feed
pub fn feed_folder(feed_id: i64) -> String {
    format!("feed/{}", feed_id)
}

/// Longest extension kept on a stored name; `feed_pic.pic` holds 50 characters
pub const MAX_EXTENSION_LEN: usize = 8;

/// Random file name: UUID v4 plus the original extension, if any.
///
/// Extensions longer than `MAX_EXTENSION_LEN` or containing anything but ASCII
/// alphanumerics are dropped.
pub fn random_filename_for(upload: &PictureUpload) -> String {
    let ext = upload
        .original_filename
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match ext {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
        None => Uuid::new_v4().to_string(),
    }
}

/// Local filesystem storage rooted at the configured upload path
#[derive(Debug, Clone)]
pub struct LocalBlobStorage {
    root: PathBuf,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn make_folder(&self, path: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(self.resolve(path)).await
    }

    fn random_filename(&self, upload: &PictureUpload) -> String {
        random_filename_for(upload)
    }

    async fn write(&self, upload: &PictureUpload, path: &str) -> io::Result<()> {
        let target = self.resolve(path);
        tokio::fs::write(&target, &upload.data).await?;
        tracing::debug!(path = %target.display(), bytes = upload.data.len(), "picture stored");
        Ok(())
    }

    async fn delete_folder(&self, path: &str, recursive: bool) -> io::Result<()> {
        let target = self.resolve(path);
        let result = if recursive {
            tokio::fs::remove_dir_all(&target).await
        } else {
            tokio::fs::remove_dir(&target).await
        };

        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
