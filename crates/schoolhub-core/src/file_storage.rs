//! Storage backends for uploaded images.
//!
//! Services only see the [`FileStorage`] trait, so the local filesystem
//! backend can be swapped for an object store without touching business
//! logic. Keys are relative paths such as `schools/<id>-<millis>.png`.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::fs;
use tracing::debug;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Deletes the file stored under `key`. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL under which the file is served.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;
}

#[derive(Debug)]
pub enum StorageError {
    InvalidFileSize { max_bytes: usize },
    IoError(std::io::Error),
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Stores files under a directory that is served at `base_url`.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\')
        {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or be absolute".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            debug!(storage.key = %key, storage.bytes = content.len(), "File stored");
            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage(max: usize) -> LocalFileStorage {
        let dir = std::env::temp_dir().join(format!("schoolhub-storage-{}", uuid::Uuid::new_v4()));
        LocalFileStorage::new(dir, "http://localhost:3000/files/".to_string(), max)
    }

    #[test]
    fn test_validate_key() {
        assert!(LocalFileStorage::validate_key("schools/abc-123.png").is_ok());
        assert!(LocalFileStorage::validate_key("classes/x_y.webp").is_ok());
        assert!(LocalFileStorage::validate_key("../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("\\windows").is_err());
        assert!(LocalFileStorage::validate_key("schools/logo?.png").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[test]
    fn test_get_url_trims_trailing_slash() {
        let storage = temp_storage(10);
        assert_eq!(
            storage.get_url("schools/logo.png").unwrap(),
            "http://localhost:3000/files/schools/logo.png"
        );
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let storage = temp_storage(1024);
        let key = storage.save("classes/a.png", b"png-bytes").await.unwrap();
        assert_eq!(key, "classes/a.png");

        let on_disk = storage.base_dir().join("classes/a.png");
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        storage.delete("classes/a.png").await.unwrap();
        assert!(!on_disk.exists());

        // Deleting twice is fine.
        storage.delete("classes/a.png").await.unwrap();
        let _ = tokio::fs::remove_dir_all(storage.base_dir()).await;
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_content() {
        let storage = temp_storage(4);
        let err = storage.save("schools/big.png", b"12345").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidFileSize { max_bytes: 4 }));
    }
}
