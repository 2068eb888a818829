//! HTTP transport for the upload pipeline.
//!
//! [`HttpUploadClient`] talks to the ingest and removal endpoints and maps
//! their statuses onto [`TransportError`].

use std::time::Duration;

use async_trait::async_trait;
use kindred_core::media::{
    DESTROY_PATH, DestroyRequest, ErrorEnvelope, FILE_FIELD, FOLDER_FIELD, INGEST_PATH,
    IngestResponse,
};
use kindred_core::upload::{CommittedFile, DeleteAction, LocalFile, TransportError, UploadTransport};
use reqwest::{Client, RequestBuilder, Response, StatusCode, multipart};
use tracing::debug;

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, such as `http://localhost:3000`.
    pub base_url: String,
    /// Session token sent as a bearer header.
    pub token: Option<String>,
    /// Request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Config for `base_url` without a session.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: None,
        }
    }

    /// Sets the session token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// reqwest-backed upload transport and delete action.
#[derive(Debug, Clone)]
pub struct HttpUploadClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpUploadClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Network` if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    /// Server origin.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(failure(response).await)
        }
    }
}

/// Maps a non-success response onto the error taxonomy.
async fn failure(response: Response) -> TransportError {
    let status = response.status();
    let message = response
        .json::<ErrorEnvelope>()
        .await
        .ok()
        .map(|envelope| envelope.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    debug!(status = status.as_u16(), message = %message, "Request rejected");
    match status {
        StatusCode::UNAUTHORIZED => TransportError::Unauthorized(message),
        s if s.is_server_error() => TransportError::Provider(message),
        s => TransportError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

/// Rejects a 2xx ingest body that reports failure or miscounts its files.
fn check_ingest(body: IngestResponse) -> Result<Vec<CommittedFile>, TransportError> {
    if !body.success {
        return Err(TransportError::InvalidResponse("ingest reported failure".to_string()));
    }
    if body.count != body.files.len() {
        return Err(TransportError::InvalidResponse(format!(
            "count {} does not match {} files",
            body.count,
            body.files.len()
        )));
    }
    Ok(body.files)
}

fn file_part(file: &LocalFile) -> multipart::Part {
    let part = || {
        multipart::Part::stream_with_length(file.bytes.clone(), file.size())
            .file_name(file.name.clone())
    };
    part()
        .mime_str(&file.content_type)
        .unwrap_or_else(|_| part())
}

#[async_trait]
impl UploadTransport for HttpUploadClient {
    async fn ingest(
        &self,
        folder: &str,
        files: Vec<LocalFile>,
    ) -> Result<Vec<CommittedFile>, TransportError> {
        let mut form = multipart::Form::new().text(FOLDER_FIELD, folder.to_string());
        for file in &files {
            form = form.part(FILE_FIELD, file_part(file));
        }

        let response = self
            .send(self.client.post(self.build_url(INGEST_PATH)).multipart(form))
            .await?;
        let body: IngestResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        check_ingest(body)
    }
}

#[async_trait]
impl DeleteAction for HttpUploadClient {
    async fn delete(&self, public_id: &str) -> Result<(), TransportError> {
        let body = DestroyRequest {
            public_id: Some(public_id.to_string()),
        };
        self.send(self.client.delete(self.build_url(DESTROY_PATH)).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = HttpUploadClient::new(ClientConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.build_url(INGEST_PATH),
            "http://localhost:3000/api/upload"
        );
    }

    #[test]
    fn test_ingest_body_checks_have_distinct_messages() {
        let failed = IngestResponse {
            success: false,
            files: Vec::new(),
            count: 0,
        };
        assert_eq!(
            check_ingest(failed).unwrap_err(),
            TransportError::InvalidResponse("ingest reported failure".to_string())
        );

        let miscounted = IngestResponse {
            success: true,
            files: Vec::new(),
            count: 2,
        };
        assert_eq!(
            check_ingest(miscounted).unwrap_err(),
            TransportError::InvalidResponse("count 2 does not match 0 files".to_string())
        );

        assert!(check_ingest(IngestResponse::new(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("http://x")
            .with_token("t")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("t"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
