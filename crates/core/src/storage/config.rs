//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory; contents vanish with the process.
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Base URL stored objects are served from, e.g. a CDN in front of the bucket.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create a new storage config.
    #[must_use]
    pub fn new(provider: StorageProvider, public_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            public_base_url: public_base_url.into(),
        }
    }

    /// In-memory storage, used by tests and local demos.
    #[must_use]
    pub fn memory(public_base_url: impl Into<String>) -> Self {
        Self::new(StorageProvider::Memory, public_base_url)
    }

    /// URL an object stored under `key` is served from.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_provider_names() {
        let provider = StorageProvider::s3(
            "https://account.r2.cloudflarestorage.com",
            "media",
            "access_key",
            "secret_key",
            "auto",
        );
        assert_eq!(provider.name(), "s3");
        assert_eq!(StorageProvider::local_fs("./storage").name(), "local");
        assert_eq!(StorageProvider::Memory.name(), "memory");
    }

    #[test]
    fn test_public_url_joins_cleanly() {
        let config = StorageConfig::memory("https://cdn.example.com/media/");
        assert_eq!(
            config.public_url("uploads/abc"),
            "https://cdn.example.com/media/uploads/abc"
        );
        assert_eq!(
            config.public_url("/uploads/abc"),
            "https://cdn.example.com/media/uploads/abc"
        );
    }

    #[test]
    fn test_provider_deserializes_from_tagged_config() {
        let config: StorageConfig = serde_json::from_str(
            r#"{"provider":{"type":"local_fs","root":"./media"},"public_base_url":"http://localhost:8080/media"}"#,
        )
        .unwrap();
        assert_eq!(config.provider.name(), "local");

        let config: StorageConfig = serde_json::from_str(
            r#"{"provider":{"type":"memory"},"public_base_url":"http://localhost"}"#,
        )
        .unwrap();
        assert_eq!(config.provider.name(), "memory");
    }
}
