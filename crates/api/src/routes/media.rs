//! Removal endpoint: `DELETE /api/cloudinary/delete`.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::delete,
};
use tracing::{error, info};

use crate::{AppState, error::ApiError, middleware::AuthUser};
use kindred_core::media::{DestroyRequest, DestroyResponse};

/// Creates the removal route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/cloudinary/delete", delete(delete_file))
}

/// DELETE `/cloudinary/delete`
async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<DestroyRequest>, JsonRejection>,
) -> Result<Json<DestroyResponse>, ApiError> {
    let public_id = payload
        .ok()
        .and_then(|Json(request)| request.public_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::malformed("publicId is required"))?;

    if let Err(e) = state.media.destroy(&public_id).await {
        error!(user_id = %user.user_id(), public_id = %public_id, error = %e, "Delete failed");
        return Err(ApiError::provider("Failed to delete file"));
    }

    info!(user_id = %user.user_id(), public_id = %public_id, "File deleted");
    Ok(Json(DestroyResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}
