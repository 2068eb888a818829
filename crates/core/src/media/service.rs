//! Media service implementation.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use kindred_shared::UploadSettings;
use tracing::{info, warn};

use super::error::MediaError;
use super::naming::{build_public_id, encode_data_uri, sanitize_folder, unique_suffix};
use super::provider::{DestroyOutcome, IngestOptions, MediaProvider, ProviderAsset};
use super::types::{IncomingFile, MediaFile, ResourceType};
use crate::storage::StorageError;

/// Media service backing the ingest and removal endpoints.
pub struct MediaService {
    provider: Arc<dyn MediaProvider>,
    settings: UploadSettings,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(provider: Arc<dyn MediaProvider>, settings: UploadSettings) -> Self {
        Self { provider, settings }
    }

    /// Get the upload settings.
    #[must_use]
    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    /// Ingest a batch of files.
    ///
    /// Every file gets its own provider call; all calls run concurrently and
    /// are awaited together, so the result keeps submission order whatever
    /// order the provider finishes in. The batch is all-or-nothing: one
    /// failure fails the whole call and no partial list is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `files` is empty
    /// - Any provider call fails
    pub async fn ingest_batch(
        &self,
        folder: Option<&str>,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<MediaFile>, MediaError> {
        if files.is_empty() {
            return Err(MediaError::NoFiles);
        }

        let default_folder = self.settings.default_folder.as_str();
        let folder = sanitize_folder(folder.unwrap_or(default_folder), default_folder);
        let total = files.len();

        let results = join_all(files.iter().map(|file| self.ingest_one(&folder, file))).await;

        let mut accepted = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(asset) => accepted.push((file, asset)),
                Err(e) => {
                    warn!(file_name = %file.file_name, error = %e, "Provider rejected file");
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            let failed = failures.len();
            let compensated = if self.settings.compensate_on_failure {
                self.compensate(&accepted).await
            } else {
                if !accepted.is_empty() {
                    warn!(
                        orphaned = accepted.len(),
                        "Batch failed; ingested files remain stored but unreported"
                    );
                }
                0
            };

            return Err(MediaError::BatchFailed {
                failed,
                total,
                compensated,
                source: failures.swap_remove(0),
            });
        }

        info!(folder = %folder, count = total, "Batch ingested");

        Ok(accepted
            .into_iter()
            .map(|(file, asset)| MediaFile {
                public_id: asset.public_id,
                url: asset.url,
                original_name: file.file_name.clone(),
                size: asset.bytes,
                format: asset.format,
                width: asset.width,
                height: asset.height,
                resource_type: asset.resource_type,
            })
            .collect())
    }

    /// Destroy one persisted file.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or reports anything but "ok".
    pub async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        match self.provider.destroy(public_id).await? {
            DestroyOutcome::Ok => {
                info!(public_id = %public_id, "Media destroyed");
                Ok(())
            }
            outcome => Err(MediaError::destroy_rejected(public_id, outcome.as_str())),
        }
    }

    async fn ingest_one(
        &self,
        folder: &str,
        file: &IncomingFile,
    ) -> Result<ProviderAsset, StorageError> {
        let options = IngestOptions {
            folder: folder.to_string(),
            public_id: build_public_id(
                &file.file_name,
                Utc::now().timestamp_millis(),
                &unique_suffix(),
            ),
            resource_type: ResourceType::detect(&file.content_type),
            original_filename: file.file_name.clone(),
        };
        let data_uri = encode_data_uri(&file.content_type, &file.bytes);

        self.provider.ingest(&data_uri, &options).await
    }

    /// Destroys the accepted part of a failed batch. Returns how many were removed.
    async fn compensate(&self, accepted: &[(&IncomingFile, ProviderAsset)]) -> usize {
        let results = join_all(
            accepted
                .iter()
                .map(|(_, asset)| self.provider.destroy(&asset.public_id)),
        )
        .await;

        results
            .into_iter()
            .zip(accepted)
            .filter(|(result, (_, asset))| match result {
                Ok(DestroyOutcome::Ok) => true,
                Ok(outcome) => {
                    warn!(
                        public_id = %asset.public_id,
                        result = outcome.as_str(),
                        "Compensation left file behind"
                    );
                    false
                }
                Err(e) => {
                    warn!(public_id = %asset.public_id, error = %e, "Compensation failed");
                    false
                }
            })
            .count()
    }
}
