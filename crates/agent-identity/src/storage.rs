//! Object Storage Client
//!
//! Uploads policy PDFs into a storage bucket and returns the public URL
//! the rest of the system (and the specific-document tool) works with.

use std::time::Duration;

use crate::error::{IdentityError, Result};

/// Storage configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Project base URL
    pub base_url: String,

    /// Service-role key (uploads are a backend-only operation)
    pub service_key: String,

    /// Target bucket
    pub bucket: String,
}

impl StorageConfig {
    /// Read from `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY` and the
    /// optional `SUPABASE_STORAGE_BUCKET` (default `documents`)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SUPABASE_URL")
            .map_err(|_| IdentityError::Config("SUPABASE_URL not set".into()))?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| IdentityError::Config("SUPABASE_SERVICE_ROLE_KEY not set".into()))?;
        let bucket =
            std::env::var("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|_| "documents".into());

        Ok(Self {
            base_url,
            service_key,
            bucket,
        })
    }
}

/// Client for the storage API
pub struct StorageClient {
    http: reqwest::Client,
    config: StorageConfig,
}

impl StorageClient {
    pub fn from_config(config: StorageConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(StorageConfig::from_env()?))
    }

    fn object_path(&self, subpath: &str, filename: &str) -> String {
        let subpath = subpath.trim_matches('/');
        if subpath.is_empty() {
            filename.to_owned()
        } else {
            format!("{subpath}/{filename}")
        }
    }

    /// Public URL of an object in the configured bucket
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            object_path
        )
    }

    /// Upload a PDF and return its public URL
    pub async fn upload_pdf(&self, bytes: Vec<u8>, filename: &str, subpath: &str) -> Result<String> {
        let object_path = self.object_path(subpath, filename);
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            object_path
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %object_path, "PDF upload failed");
            return Err(IdentityError::Storage(format!("HTTP {status}: {body}")));
        }

        tracing::info!(%object_path, "uploaded PDF");
        Ok(self.public_url(&object_path))
    }
}
