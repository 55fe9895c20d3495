//! Supabase Storage backend over its REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use realty_core::defaults::{
    ENV_STORAGE_TIMEOUT_SECS, ENV_SUPABASE_SERVICE_KEY, ENV_SUPABASE_URL, STORAGE_TIMEOUT_SECS,
};
use realty_core::{Error, Result, StorageBackend};

/// Configuration for the Supabase backend.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Service role key; sent as both bearer token and `apikey`.
    pub service_key: String,
    pub timeout_secs: u64,
}

impl SupabaseConfig {
    /// Read `SUPABASE_URL` and `SUPABASE_SERVICE_KEY` (both required) and
    /// `STORAGE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_SUPABASE_URL)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_SUPABASE_URL)))?;
        let service_key = std::env::var(ENV_SUPABASE_SERVICE_KEY)
            .map_err(|_| Error::Config(format!("{} is not set", ENV_SUPABASE_SERVICE_KEY)))?;
        let timeout_secs = std::env::var(ENV_STORAGE_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(STORAGE_TIMEOUT_SECS);
        Ok(Self {
            url,
            service_key,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

/// Supabase Storage client.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create storage client: {}", e)))?;

        info!(
            subsystem = "storage",
            component = "supabase",
            base_url = %config.url,
            "Initializing Supabase storage"
        );

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            encode_segment(bucket),
            encode_path(path)
        )
    }
}

fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StorageBackend for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let start = Instant::now();
        let response = self
            .client
            .post(self.object_url(bucket, path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "Upload of {}/{} returned {}: {}",
                bucket, path, status, body
            )));
        }

        debug!(
            subsystem = "storage",
            component = "supabase",
            op = "upload",
            bucket,
            path,
            size = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Object uploaded"
        );
        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .delete(format!(
                "{}/storage/v1/object/{}",
                self.base_url,
                encode_segment(bucket)
            ))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&RemoveRequest { prefixes: paths })
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Remove request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(format!(
                "Remove from {} returned {}: {}",
                bucket, status, body
            )));
        }

        debug!(
            subsystem = "storage",
            component = "supabase",
            op = "remove",
            bucket,
            count = paths.len(),
            "Objects removed"
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            encode_segment(bucket),
            encode_path(path)
        )
    }

    fn name(&self) -> &str {
        "supabase"
    }
}
