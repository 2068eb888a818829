//! Ingest endpoint: `POST /api/upload`.

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    routing::post,
};
use tracing::{error, info, warn};

use crate::{AppState, error::ApiError, middleware::AuthUser};
use kindred_core::media::{FILE_FIELD, FOLDER_FIELD, IncomingFile, IngestResponse, MediaError};
use kindred_shared::AppError;

const NO_FILES: &str = "No files provided";
const UPLOAD_FAILED: &str = "Failed to upload files";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the ingest route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_files))
}

/// Files and folder read from the multipart body.
#[derive(Debug, Default)]
struct UploadForm {
    folder: Option<String>,
    files: Vec<IncomingFile>,
}

fn multipart_error(e: &MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError(AppError::PayloadTooLarge(
            "Request body exceeds the maximum allowed limit".to_string(),
        ));
    }
    warn!(error = %e, "Unreadable multipart body");
    ApiError::provider(UPLOAD_FAILED)
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        match field.name() {
            Some(FILE_FIELD) => {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    warn!("File field without a filename");
                    return Err(ApiError::provider(UPLOAD_FAILED));
                };
                let content_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
                form.files
                    .push(IncomingFile::new(file_name, content_type, bytes));
            }
            Some(FOLDER_FIELD) => {
                form.folder = Some(field.text().await.map_err(|e| multipart_error(&e))?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST `/upload`
/// Persists every `file` part and returns their metadata in submission order.
async fn upload_files(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::malformed(e.body_text()))?;
    let form = read_form(multipart).await?;
    if form.files.is_empty() {
        return Err(ApiError::malformed(NO_FILES));
    }

    let count = form.files.len();
    match state
        .media
        .ingest_batch(form.folder.as_deref(), form.files)
        .await
    {
        Ok(files) => {
            info!(user_id = %user.user_id(), count, "Files uploaded");
            Ok(Json(IngestResponse::new(files)))
        }
        Err(MediaError::NoFiles) => Err(ApiError::malformed(NO_FILES)),
        Err(e) => {
            error!(user_id = %user.user_id(), error = %e, "Upload batch failed");
            Err(ApiError::provider(UPLOAD_FAILED))
        }
    }
}
