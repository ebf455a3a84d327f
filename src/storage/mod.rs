//! Document storage collaborator.
//!
//! Uploaded receipts, challans, and item photos are persisted through
//! this abstraction and referenced everywhere else by *relative* path;
//! responses rewrite those to absolute URLs with [`absolutize`].

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Persist `data` under `category`, returning the stored relative path.
    async fn store(
        &self,
        category: &str,
        file_name: &str,
        data: Bytes,
    ) -> Result<String, ServiceError>;

    async fn delete(&self, relative_path: &str) -> Result<(), ServiceError>;
}

/// Local-filesystem implementation of the storage collaborator.
pub struct LocalBlobStorage {
    root: PathBuf,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, ServiceError> {
        // Stored paths are generated by `store`; reject anything that
        // escapes the root.
        if relative_path.split('/').any(|seg| seg == "..") {
            return Err(ServiceError::StorageError(format!(
                "invalid storage path: {}",
                relative_path
            )));
        }
        Ok(self.root.join(relative_path))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn store(
        &self,
        category: &str,
        file_name: &str,
        data: Bytes,
    ) -> Result<String, ServiceError> {
        let category = sanitize_segment(category);
        let file_name = sanitize_segment(file_name);
        let relative = format!("{}/{}_{}", category, Uuid::new_v4(), file_name);

        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::StorageError(e.to_string()))?;
        }

        fs::write(&target, &data)
            .await
            .map_err(|e| ServiceError::StorageError(e.to_string()))?;

        info!(path = %relative, bytes = data.len(), "stored document");
        Ok(relative)
    }

    async fn delete(&self, relative_path: &str) -> Result<(), ServiceError> {
        let target = self.resolve(relative_path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::StorageError(e.to_string())),
        }
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` so client-supplied names
/// cannot traverse directories.
fn sanitize_segment(raw: &str) -> String {
    let name = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Rewrite a stored relative path to the public URL returned to clients.
pub fn absolutize(public_base_url: &str, relative_path: &str) -> String {
    format!(
        "{}/{}",
        public_base_url.trim_end_matches('/'),
        relative_path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_traversal_attempts() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_segment("receipt 2026.pdf"), "receipt_2026.pdf");
        assert_eq!(sanitize_segment("...."), "file");
    }

    #[test]
    fn absolutize_joins_cleanly() {
        assert_eq!(
            absolutize("http://localhost:8080/files/", "/receipts/a.pdf"),
            "http://localhost:8080/files/receipts/a.pdf"
        );
    }

    #[tokio::test]
    async fn store_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path());

        let relative = storage
            .store("receipts", "challan.pdf", Bytes::from_static(b"%PDF-"))
            .await
            .unwrap();
        assert!(relative.starts_with("receipts/"));
        assert!(dir.path().join(&relative).exists());

        storage.delete(&relative).await.unwrap();
        assert!(!dir.path().join(&relative).exists());
        // Deleting again is a no-op
        storage.delete(&relative).await.unwrap();
    }

    #[tokio::test]
    async fn resolve_rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBlobStorage::new(dir.path());
        assert!(storage.delete("../outside").await.is_err());
    }
}
