//! Object storage for user photos and avatars.
//!
//! Handlers only see `ObjectStorage`; the local filesystem backend is the one
//! shipped, and tests swap in their own.

use crate::config::storage::StorageConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5 MB
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Internal(anyhow::Error::new(e))
    }
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Removing a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn public_url(&self, key: &str) -> String;
}

pub type SharedStorage = Arc<dyn ObjectStorage>;

pub struct LocalStorage {
    root: PathBuf,
    public_path: String,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_dir),
            public_path: config.public_path.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(key);
        let clean = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_path, key)
    }
}

/// Validate file magic bytes match the declared content type.
fn validate_magic_bytes(data: &[u8], content_type: &str) -> bool {
    match content_type {
        "image/jpeg" => data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF],
        "image/png" => data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47],
        "image/webp" => {
            data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50]
        }
        _ => false,
    }
}

/// Check an uploaded image and return a fresh storage key under `prefix`.
pub fn image_key(prefix: &str, data: &[u8], content_type: &str) -> AppResult<String> {
    if data.len() > MAX_IMAGE_SIZE {
        return Err(AppError::PayloadTooLarge);
    }

    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type: {}. Allowed: jpeg, png, webp",
            content_type
        )));
    }

    if !validate_magic_bytes(data, content_type) {
        return Err(AppError::Validation(
            "File content does not match declared content type".to_string(),
        ));
    }

    let ext = match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "webp",
    };

    Ok(format!("{}/{}.{}", prefix, Uuid::new_v4(), ext))
}

/// Delete an object, logging instead of failing. Used after the owning row
/// is already gone.
pub async fn delete_best_effort(storage: &dyn ObjectStorage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn temp_storage() -> LocalStorage {
        let dir = std::env::temp_dir().join(format!("courtside-storage-{}", Uuid::new_v4()));
        LocalStorage::new(&StorageConfig {
            root_dir: dir.to_string_lossy().into_owned(),
            public_path: "/media".to_string(),
        })
    }

    #[test]
    fn image_key_uses_prefix_and_extension() {
        let key = image_key("photos/3", &JPEG, "image/jpeg").unwrap();
        assert!(key.starts_with("photos/3/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn mismatched_magic_bytes_rejected() {
        let png = [0x89, 0x50, 0x4E, 0x47];
        assert!(matches!(
            image_key("photos", &png, "image/jpeg"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unsupported_type_rejected() {
        assert!(image_key("photos", &JPEG, "application/pdf").is_err());
    }

    #[test]
    fn oversized_upload_rejected() {
        let mut data = vec![0u8; MAX_IMAGE_SIZE + 1];
        data[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        assert!(matches!(
            image_key("photos", &data, "image/jpeg"),
            Err(AppError::PayloadTooLarge)
        ));
    }

    #[test]
    fn keys_cannot_escape_root() {
        let storage = temp_storage();
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("/abs").is_err());
        assert!(storage.path_for("").is_err());
        assert!(storage.path_for("photos/a.jpg").is_ok());
    }

    #[test]
    fn public_url_joins_prefix() {
        let storage = temp_storage();
        assert_eq!(storage.public_url("photos/a.jpg"), "/media/photos/a.jpg");
    }

    #[tokio::test]
    async fn put_then_delete_round_trip() {
        let storage = temp_storage();
        storage.put("photos/x.jpg", &JPEG, "image/jpeg").await.unwrap();
        assert!(storage.root().join("photos/x.jpg").exists());

        storage.delete("photos/x.jpg").await.unwrap();
        assert!(!storage.root().join("photos/x.jpg").exists());

        // second delete is a no-op
        storage.delete("photos/x.jpg").await.unwrap();
        let _ = std::fs::remove_dir_all(storage.root());
    }
}
