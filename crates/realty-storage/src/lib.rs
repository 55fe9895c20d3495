//! # realty-storage
//!
//! Object storage backends implementing [`realty_core::StorageBackend`]:
//! Supabase Storage for deployments and the local filesystem for development.

pub mod filesystem;
pub mod paths;
pub mod supabase;

use std::sync::Arc;

use realty_core::defaults::{
    ENV_STORAGE_BACKEND, ENV_STORAGE_IMAGE_BUCKET, ENV_STORAGE_PHOTO_BUCKET, PHOTO_PREFIX,
    STORAGE_IMAGE_BUCKET, STORAGE_PHOTO_BUCKET,
};
use realty_core::{Error, Result, StorageBackend};

pub use filesystem::FilesystemStorage;
pub use paths::{
    detect_content_type, extract_storage_path, image_object_path, photo_object_path,
    sanitize_file_name,
};
pub use supabase::{SupabaseConfig, SupabaseStorage};

/// Bucket names used by the property service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBuckets {
    /// Receives photos uploaded with create/update requests.
    pub photos: String,
    /// Receives images managed through the image endpoints.
    pub images: String,
    /// Key prefix inside the photo bucket.
    pub photo_prefix: String,
}

impl Default for StorageBuckets {
    fn default() -> Self {
        Self {
            photos: STORAGE_PHOTO_BUCKET.to_string(),
            images: STORAGE_IMAGE_BUCKET.to_string(),
            photo_prefix: PHOTO_PREFIX.to_string(),
        }
    }
}

impl StorageBuckets {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            photos: std::env::var(ENV_STORAGE_PHOTO_BUCKET).unwrap_or(defaults.photos),
            images: std::env::var(ENV_STORAGE_IMAGE_BUCKET).unwrap_or(defaults.images),
            photo_prefix: defaults.photo_prefix,
        }
    }
}

/// Build the backend selected by `STORAGE_BACKEND` (`supabase` or
/// `filesystem`). Defaults to Supabase when `SUPABASE_URL` is set and to the
/// filesystem otherwise.
pub fn storage_from_env() -> Result<Arc<dyn StorageBackend>> {
    let selected = std::env::var(ENV_STORAGE_BACKEND).ok();
    let kind = match selected.as_deref() {
        Some(kind) => kind.trim().to_lowercase(),
        None if SupabaseConfig::from_env().is_ok() => "supabase".to_string(),
        None => "filesystem".to_string(),
    };
    match kind.as_str() {
        "supabase" => Ok(Arc::new(SupabaseStorage::new(SupabaseConfig::from_env()?)?)),
        "filesystem" => Ok(Arc::new(FilesystemStorage::from_env())),
        other => Err(Error::Config(format!(
            "Unknown {} '{}', expected 'supabase' or 'filesystem'",
            ENV_STORAGE_BACKEND, other
        ))),
    }
}
