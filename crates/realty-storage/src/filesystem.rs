//! Local filesystem storage backend for development.
//!
//! Objects live at `{base_path}/{bucket}/{path}` and are served (by whatever
//! static file server fronts the directory) at `{public_url}/{bucket}/{path}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use realty_core::defaults::{
    ENV_FILE_STORAGE_PATH, ENV_FILE_STORAGE_PUBLIC_URL, FILE_STORAGE_PATH,
    FILE_STORAGE_PUBLIC_URL,
};
use realty_core::{Error, Result, StorageBackend};

/// Filesystem storage backend.
pub struct FilesystemStorage {
    base_path: PathBuf,
    public_url: String,
}

impl FilesystemStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Read `FILE_STORAGE_PATH` and `FILE_STORAGE_PUBLIC_URL`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(ENV_FILE_STORAGE_PATH).unwrap_or_else(|_| FILE_STORAGE_PATH.to_string()),
            std::env::var(ENV_FILE_STORAGE_PUBLIC_URL)
                .unwrap_or_else(|_| FILE_STORAGE_PUBLIC_URL.to_string()),
        )
    }

    /// Resolve an object path, refusing anything that escapes the bucket.
    fn full_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::InvalidInput(format!(
                "Invalid storage path: {}/{}",
                bucket, path
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String> {
        let full_path = self.full_path(bucket, path)?;
        debug!(storage_path = %path, full_path = %full_path.display(), size = data.len(), "file_storage: write");

        if fs::try_exists(&full_path).await? {
            return Err(Error::Storage(format!(
                "Object already exists: {}/{}",
                bucket, path
            )));
        }
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "file_storage: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "file_storage: File::create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "file_storage: rename failed");
            e
        })?;

        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        for path in paths {
            let full_path = self.full_path(bucket, path)?;
            if fs::try_exists(&full_path).await? {
                fs::remove_file(&full_path).await?;
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!(
            "{}/{}/{}",
            self.public_url,
            urlencoding::encode(bucket),
            encoded.join("/")
        )
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}
