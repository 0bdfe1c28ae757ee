//! Upload storage configuration.
//!
//! - `UPLOAD_DIR`: directory files are written to (default: `storage/uploads`)
//! - `UPLOAD_BASE_URL`: public URL prefix (default: `http://localhost:3000/files`)
//! - `UPLOAD_MAX_BYTES`: hard size cap enforced by the storage backend (default: 5 MiB)

use std::env;
use std::path::PathBuf;

use crate::env_or;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub base_url: String,
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "storage/uploads".to_string()),
            ),
            base_url: env::var("UPLOAD_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".to_string()),
            max_upload_bytes: env_or("UPLOAD_MAX_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("storage/uploads"),
            base_url: "http://localhost:3000/files".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}
