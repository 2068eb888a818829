//! Storage service implementation using Apache OpenDAL.

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::media::{
    DestroyOutcome, IngestOptions, MediaProvider, ProviderAsset, ResourceType, decode_data_uri,
};

/// User metadata key holding the submitted filename.
const ORIGINAL_FILENAME_KEY: &str = "original-filename";

/// Storage service that acts as the media provider.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }
}

#[async_trait]
impl MediaProvider for StorageService {
    async fn ingest(
        &self,
        data_uri: &str,
        options: &IngestOptions,
    ) -> Result<ProviderAsset, StorageError> {
        let (content_type, bytes) = decode_data_uri(data_uri)?;
        let key = storage_key(&options.folder, &options.public_id)?;
        let size = bytes.len() as u64;

        let (format, width, height) = match options.resource_type {
            ResourceType::Image => inspect_image(&bytes),
            ResourceType::Video | ResourceType::Raw => {
                (extension_of(&options.original_filename), None, None)
            }
        };

        let capability = self.operator.info().full_capability();
        let mut write = self.operator.write_with(&key, bytes);
        if capability.write_with_content_type {
            write = write.content_type(&content_type);
        }
        if capability.write_with_user_metadata {
            write = write.user_metadata([(
                ORIGINAL_FILENAME_KEY.to_string(),
                options.original_filename.clone(),
            )]);
        }
        write.await.map_err(StorageError::from)?;

        debug!(
            provider = self.provider_name(),
            key = %key,
            size,
            "Object stored"
        );

        Ok(ProviderAsset {
            url: self.config.public_url(&key),
            public_id: key,
            bytes: size,
            format,
            width,
            height,
            resource_type: options.resource_type,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<DestroyOutcome, StorageError> {
        validate_key(public_id)?;

        match self.operator.stat(public_id).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DestroyOutcome::NotFound),
            Err(e) => return Err(StorageError::from(e)),
        }

        self.operator
            .delete(public_id)
            .await
            .map_err(StorageError::from)?;

        debug!(provider = self.provider_name(), key = %public_id, "Object deleted");
        Ok(DestroyOutcome::Ok)
    }
}

/// Key format: `{folder}/{public_id}`.
fn storage_key(folder: &str, public_id: &str) -> Result<String, StorageError> {
    let key = format!("{}/{}", folder.trim_matches('/'), public_id);
    validate_key(&key)?;
    Ok(key)
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.ends_with('/')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Format name and pixel dimensions of an image payload.
fn inspect_image(bytes: &[u8]) -> (Option<String>, Option<u32>, Option<u32>) {
    let Ok(format) = image::guess_format(bytes) else {
        return (None, None, None);
    };
    let name = format
        .extensions_str()
        .first()
        .map(|ext| (*ext).to_string());

    match image::ImageReader::with_format(Cursor::new(bytes), format).into_dimensions() {
        Ok((width, height)) => (name, Some(width), Some(height)),
        Err(_) => (name, None, None),
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
